use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use outbound_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a consecutive-failure circuit breaker.
pub struct CircuitBreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) open_duration: Duration,
    pub(crate) probe_timeout: Option<Duration>,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Consecutive failures that open the circuit.
    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// How long the circuit stays open before admitting a probe.
    pub fn open_duration(&self) -> Duration {
        self.open_duration
    }

    /// How long an outstanding probe holds the half-open slot before another
    /// caller may take it. Defaults to the open duration.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout.unwrap_or(self.open_duration)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: u32,
    open_duration: Duration,
    probe_timeout: Option<Duration>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            probe_timeout: None,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets how many consecutive failures open the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the duration the circuit remains open before a probe is allowed.
    ///
    /// Default: 30 seconds
    pub fn open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    /// Sets how long a probe may stay outstanding before its slot is handed to
    /// the next caller.
    ///
    /// Default: same as `open_duration`
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Give this breaker a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Registers a callback when the circuit breaker transitions between states.
    ///
    /// # Callback Signature
    /// `Fn(CircuitState, CircuitState)` - the state transitioned **from**, then
    /// the state transitioned **to**.
    ///
    /// # Example
    /// ```rust,no_run
    /// use outbound_circuitbreaker::{CircuitBreakerConfig, CircuitState};
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .on_state_transition(|from, to| {
    ///         if to == CircuitState::Open {
    ///             eprintln!("circuit opened (was {:?})", from);
    ///         }
    ///     })
    ///     .build();
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Registers a callback when a call is rejected without being attempted.
    ///
    /// # Callback Signature
    /// `Fn(Option<Duration>)` - the remaining open period, or `None` when the
    /// rejection came from an outstanding half-open probe.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Duration>) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallRejected { retry_after, .. } = event {
                    f(*retry_after);
                }
            }));
        self
    }

    /// Registers a callback when a half-open probe is admitted.
    pub fn on_probe_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::ProbePermitted { .. } = event {
                    f();
                }
            }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            open_duration: self.open_duration,
            probe_timeout: self.probe_timeout,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
