use crate::config::CircuitBreakerConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed = 0,
    /// Calls are rejected until the open period ends.
    Open = 1,
    /// The open period has ended; exactly one probe call is let through and
    /// everyone else is still rejected until it reports back.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of asking the circuit for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Circuit closed; normal call.
    Permitted,
    /// Caller holds the single half-open probe slot.
    Probe,
    /// Rejected; `retry_after` is the time left in the open period, if known.
    Rejected { retry_after: Option<Duration> },
}

/// Stamp handed out with an admission so a late outcome can be matched
/// against the admission it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket {
    generation: u64,
    half_open: bool,
}

/// A state change the caller should publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub(crate) from: CircuitState,
    pub(crate) to: CircuitState,
}

impl Transition {
    pub(crate) fn is_trip(&self) -> bool {
        self.to == CircuitState::Open
    }
}

/// Mutable breaker state. Always accessed under the breaker's lock.
#[derive(Debug)]
pub(crate) struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    open_until: Option<Instant>,
    probe_started: Option<Instant>,
    // Bumped every time the circuit opens or hands out its half-open slot.
    generation: u64,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            open_until: None,
            probe_started: None,
            generation: 0,
        }
    }
}

impl Circuit {
    #[cfg(test)]
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    /// State as callers would observe it at `now`, without claiming anything.
    pub(crate) fn observed_state(&self, now: Instant) -> CircuitState {
        match (self.state, self.open_until) {
            (CircuitState::Open, Some(until)) if now >= until => CircuitState::HalfOpen,
            (state, _) => state,
        }
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub(crate) fn open_until(&self) -> Option<Instant> {
        match self.state {
            CircuitState::Open => self.open_until,
            _ => None,
        }
    }

    /// Ticket for an admission granted at the current generation.
    /// `half_open` marks the holder of the half-open slot.
    pub(crate) fn ticket(&self, half_open: bool) -> Ticket {
        Ticket {
            generation: self.generation,
            half_open,
        }
    }

    /// Whether `ticket` belongs to the caller currently holding the
    /// half-open slot.
    fn holds_half_open_slot(&self, ticket: Ticket) -> bool {
        self.state == CircuitState::HalfOpen
            && ticket.half_open
            && ticket.generation == self.generation
    }

    pub(crate) fn try_acquire(
        &mut self,
        now: Instant,
        config: &CircuitBreakerConfig,
    ) -> (Admission, Option<Transition>) {
        match self.state {
            CircuitState::Closed => (Admission::Permitted, None),
            CircuitState::Open => match self.open_until {
                Some(until) if now < until => (
                    Admission::Rejected {
                        retry_after: Some(until - now),
                    },
                    None,
                ),
                _ => {
                    let transition = self.transition_to(CircuitState::HalfOpen);
                    self.probe_started = Some(now);
                    self.generation = self.generation.wrapping_add(1);
                    (Admission::Probe, transition)
                }
            },
            CircuitState::HalfOpen => {
                let probe_free = match self.probe_started {
                    None => true,
                    Some(started) => now.saturating_duration_since(started) >= config.probe_timeout(),
                };
                if probe_free {
                    self.probe_started = Some(now);
                    self.generation = self.generation.wrapping_add(1);
                    (Admission::Probe, None)
                } else {
                    (Admission::Rejected { retry_after: None }, None)
                }
            }
        }
    }

    /// Only the current half-open holder can close the circuit. Any other
    /// success just clears the failure streak.
    pub(crate) fn record_success(&mut self, ticket: Ticket) -> Option<Transition> {
        self.consecutive_failures = 0;
        if self.holds_half_open_slot(ticket) {
            self.transition_to(CircuitState::Closed)
        } else {
            None
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        now: Instant,
        config: &CircuitBreakerConfig,
        ticket: Ticket,
    ) -> Option<Transition> {
        match self.state {
            CircuitState::HalfOpen if self.holds_half_open_slot(ticket) => self.open(now, config),
            // Late results from earlier admissions neither re-open nor extend the open period.
            CircuitState::HalfOpen | CircuitState::Open => None,
            CircuitState::Closed => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= config.failure_threshold {
                    self.open(now, config)
                } else {
                    None
                }
            }
        }
    }

    /// Gives the probe slot back without an outcome (the probe was abandoned).
    /// A holder whose slot was already reissued releases nothing.
    pub(crate) fn release_probe(&mut self, ticket: Ticket) {
        if self.holds_half_open_slot(ticket) {
            self.probe_started = None;
        }
    }

    pub(crate) fn force_open(
        &mut self,
        now: Instant,
        config: &CircuitBreakerConfig,
    ) -> Option<Transition> {
        self.open(now, config)
    }

    pub(crate) fn reset(&mut self) -> Option<Transition> {
        self.consecutive_failures = 0;
        self.transition_to(CircuitState::Closed)
    }

    fn open(&mut self, now: Instant, config: &CircuitBreakerConfig) -> Option<Transition> {
        self.open_until = Some(now + config.open_duration);
        self.consecutive_failures = 0;
        let from = self.state;
        self.state = CircuitState::Open;
        self.probe_started = None;
        self.generation = self.generation.wrapping_add(1);
        // Forcing an already open circuit only extends the period.
        (from != CircuitState::Open).then_some(Transition {
            from,
            to: CircuitState::Open,
        })
    }

    fn transition_to(&mut self, state: CircuitState) -> Option<Transition> {
        if self.state == state {
            return None;
        }
        let from = self.state;
        self.state = state;
        if state == CircuitState::Closed {
            self.open_until = None;
            self.probe_started = None;
        }
        Some(Transition { from, to: state })
    }
}
