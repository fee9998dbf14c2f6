use crate::circuit::{Admission, Circuit, CircuitState, Ticket, Transition};
use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
use outbound_core::OutboundMetrics;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use metrics::counter;

/// A consecutive-failure circuit breaker guarding one target.
///
/// Closed until `failure_threshold` failures are recorded in a row, then open
/// for `open_duration`. Once the open period ends a single caller is admitted
/// as a probe while everyone else keeps being rejected; the probe's outcome
/// either closes the circuit or opens it for another period.
pub struct CircuitBreaker {
    name: String,
    config: Arc<CircuitBreakerConfig>,
    circuit: Mutex<Circuit>,
    state_atomic: AtomicU8,
    metrics: Arc<OutboundMetrics>,
}

impl CircuitBreaker {
    /// Creates a breaker with its own metrics.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let name = config.name.clone();
        Self::with_shared(name, Arc::new(config), Arc::new(OutboundMetrics::new()))
    }

    /// Creates a breaker that shares configuration and metrics with others,
    /// reporting under `name`.
    pub fn with_shared(
        name: impl Into<String>,
        config: Arc<CircuitBreakerConfig>,
        metrics: Arc<OutboundMetrics>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            circuit: Mutex::new(Circuit::default()),
            state_atomic: AtomicU8::new(CircuitState::Closed as u8),
            metrics,
        }
    }

    /// Asks whether a call may go ahead.
    ///
    /// When the open period has just ended this claims the probe slot; the
    /// caller must then report the outcome through
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure). Prefer
    /// [`try_acquire`](Self::try_acquire), which gives the slot back if the
    /// call is abandoned.
    pub fn allow(&self) -> bool {
        !matches!(self.admit().0, Admission::Rejected { .. })
    }

    /// Asks for admission and returns a guard used to report the outcome.
    ///
    /// Returns `None` if the circuit is open, or half-open with a probe
    /// already outstanding.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        let (admission, ticket) = self.admit();
        match admission {
            Admission::Permitted | Admission::Probe => Some(CallPermit::new(self, admission, ticket)),
            Admission::Rejected { .. } => None,
        }
    }

    /// Records a successful call. Resets the failure streak and closes a
    /// half-open circuit.
    ///
    /// The outcome is attributed to whoever holds the current admission. Use
    /// [`CallPermit`] when calls can overlap, so late outcomes from earlier
    /// admissions are told apart.
    pub fn record_success(&self) {
        self.update(|circuit, _| {
            let ticket = circuit.ticket(true);
            ((), circuit.record_success(ticket))
        });
    }

    /// Records a failed call. Opens the circuit when the streak reaches the
    /// threshold, or re-opens it when the probe failed.
    pub fn record_failure(&self) {
        self.update(|circuit, config| {
            let ticket = circuit.ticket(true);
            ((), circuit.record_failure(Instant::now(), config, ticket))
        });
    }

    /// Current state. An open circuit whose period has ended reports
    /// [`CircuitState::HalfOpen`] even before anyone has probed it.
    pub fn state(&self) -> CircuitState {
        match CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire)) {
            CircuitState::Open => self.lock().observed_state(Instant::now()),
            state => state,
        }
    }

    /// Length of the current failure streak.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures()
    }

    /// Time left before an open circuit admits a probe. `None` unless open.
    pub fn remaining_open(&self) -> Option<Duration> {
        self.lock()
            .open_until()
            .map(|until| until.saturating_duration_since(Instant::now()))
    }

    /// Closes the circuit and clears the failure streak.
    pub fn reset(&self) {
        self.update(|circuit, _| ((), circuit.reset()));
    }

    /// Opens the circuit for a full period regardless of the failure streak.
    pub fn force_open(&self) {
        self.update(|circuit, config| ((), circuit.force_open(Instant::now(), config)));
    }

    /// Name this breaker reports under.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn admit(&self) -> (Admission, Ticket) {
        let (admission, ticket) = self.update(|circuit, config| {
            let (admission, transition) = circuit.try_acquire(Instant::now(), config);
            let ticket = circuit.ticket(admission == Admission::Probe);
            ((admission, ticket), transition)
        });

        match admission {
            Admission::Permitted => {}
            Admission::Probe => {
                self.config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::ProbePermitted {
                        pattern_name: self.name.clone(),
                        timestamp: Instant::now(),
                    });

                #[cfg(feature = "tracing")]
                tracing::debug!(circuitbreaker = %self.name, "Probe call permitted");
            }
            Admission::Rejected { retry_after } => {
                self.config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallRejected {
                        pattern_name: self.name.clone(),
                        timestamp: Instant::now(),
                        retry_after,
                    });

                #[cfg(feature = "tracing")]
                tracing::warn!(circuitbreaker = %self.name, ?retry_after, "Call rejected by open circuit");

                #[cfg(feature = "metrics")]
                counter!("outbound_circuit_rejections_total", "circuitbreaker" => self.name.clone())
                    .increment(1);
            }
        }
        (admission, ticket)
    }

    fn release_probe(&self, ticket: Ticket) {
        self.lock().release_probe(ticket);
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` under the lock, then publishes any resulting transition once
    /// the lock is released.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Circuit, &CircuitBreakerConfig) -> (T, Option<Transition>),
    ) -> T {
        let (value, transition) = {
            let mut circuit = self.lock();
            let (value, transition) = f(&mut circuit, &self.config);
            if let Some(t) = transition {
                self.state_atomic.store(t.to as u8, Ordering::Release);
            }
            (value, transition)
        };
        if let Some(transition) = transition {
            self.publish(transition);
        }
        value
    }

    fn publish(&self, transition: Transition) {
        let Transition { from, to } = transition;

        if transition.is_trip() {
            self.metrics.record_circuit_trip();
        }

        self.config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                from_state: from,
                to_state: to,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(circuitbreaker = %self.name, from = ?from, to = ?to, "Circuit state transition");

        #[cfg(feature = "metrics")]
        counter!(
            "outbound_circuit_transitions_total",
            "circuitbreaker" => self.name.clone(),
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}

/// Admission granted by [`CircuitBreaker::try_acquire`].
///
/// Report the outcome with [`record_success`](Self::record_success) or
/// [`record_failure`](Self::record_failure). Dropping a probe permit without
/// reporting hands the probe slot to the next caller.
///
/// Once the circuit has opened, outcomes reported through permits issued
/// before that point no longer move it; only the permit holding the current
/// half-open slot closes or re-opens the circuit.
#[must_use = "the call outcome should be recorded"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    ticket: Ticket,
    recorded: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, admission: Admission, ticket: Ticket) -> Self {
        Self {
            breaker,
            probe: admission == Admission::Probe,
            ticket,
            recorded: false,
        }
    }

    /// Whether this call is the single half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn record_success(mut self) {
        self.recorded = true;
        let ticket = self.ticket;
        self.breaker.update(|circuit, _| ((), circuit.record_success(ticket)));
    }

    pub fn record_failure(mut self) {
        self.recorded = true;
        let ticket = self.ticket;
        self.breaker.update(|circuit, config| {
            ((), circuit.record_failure(Instant::now(), config, ticket))
        });
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.recorded {
            self.breaker.release_probe(self.ticket);
        }
    }
}

impl std::fmt::Debug for CallPermit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPermit")
            .field("breaker", &self.breaker.name)
            .field("probe", &self.probe)
            .finish()
    }
}
