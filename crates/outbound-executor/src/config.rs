use crate::events::ExecutorEvent;
use outbound_core::{EventListeners, FnListener};
use std::time::Duration;
use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("rate limit capacity must be at least 1")]
    ZeroCapacity,
    #[error("rate limit window must be non-zero")]
    ZeroWindow,
    #[error("circuit breaker threshold must be at least 1")]
    ZeroThreshold,
    #[error("operation timeout must be non-zero")]
    ZeroOperationTimeout,
    #[error("jitter factor must be within 0.0..=1.0, got {0}")]
    InvalidJitter(f64),
}

/// Configuration for a [`RequestExecutor`](crate::RequestExecutor).
pub struct OutboundConfig {
    pub(crate) dns_cache_ttl: Duration,
    pub(crate) resolve_timeout: Duration,
    pub(crate) rate_limit_capacity: usize,
    pub(crate) rate_limit_window: Duration,
    pub(crate) rate_limit_acquire_timeout: Option<Duration>,
    pub(crate) circuit_breaker_threshold: u32,
    pub(crate) circuit_breaker_open_duration: Duration,
    pub(crate) max_retries: usize,
    pub(crate) base_backoff_delay: Duration,
    pub(crate) max_backoff_delay: Duration,
    pub(crate) jitter_factor: f64,
    pub(crate) rate_limited_backoff_multiplier: u32,
    pub(crate) operation_timeout: Duration,
    pub(crate) event_listeners: EventListeners<ExecutorEvent>,
    pub(crate) name: String,
}

impl OutboundConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OutboundConfigBuilder {
        OutboundConfigBuilder::new()
    }

    /// Checks values the components cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.rate_limit_window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::ZeroOperationTimeout);
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::InvalidJitter(self.jitter_factor));
        }
        Ok(())
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn dns_cache_ttl(&self) -> Duration {
        self.dns_cache_ttl
    }
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for OutboundConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundConfig")
            .field("name", &self.name)
            .field("dns_cache_ttl", &self.dns_cache_ttl)
            .field("rate_limit_capacity", &self.rate_limit_capacity)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("circuit_breaker_threshold", &self.circuit_breaker_threshold)
            .field("circuit_breaker_open_duration", &self.circuit_breaker_open_duration)
            .field("max_retries", &self.max_retries)
            .field("base_backoff_delay", &self.base_backoff_delay)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`OutboundConfig`].
pub struct OutboundConfigBuilder {
    config: OutboundConfig,
}

impl Default for OutboundConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - dns_cache_ttl: 120 seconds
    /// - resolve_timeout: 5 seconds
    /// - rate_limit_capacity: 10 per window
    /// - rate_limit_window: 1 second
    /// - rate_limit_acquire_timeout: none
    /// - circuit_breaker_threshold: 5
    /// - circuit_breaker_open_duration: 30 seconds
    /// - max_retries: 3
    /// - base_backoff_delay: 100ms
    /// - max_backoff_delay: 10 seconds
    /// - jitter_factor: 0.0
    /// - rate_limited_backoff_multiplier: 10
    /// - operation_timeout: 30 seconds
    pub fn new() -> Self {
        Self {
            config: OutboundConfig {
                dns_cache_ttl: Duration::from_secs(120),
                resolve_timeout: Duration::from_secs(5),
                rate_limit_capacity: 10,
                rate_limit_window: Duration::from_secs(1),
                rate_limit_acquire_timeout: None,
                circuit_breaker_threshold: 5,
                circuit_breaker_open_duration: Duration::from_secs(30),
                max_retries: 3,
                base_backoff_delay: Duration::from_millis(100),
                max_backoff_delay: Duration::from_secs(10),
                jitter_factor: 0.0,
                rate_limited_backoff_multiplier: 10,
                operation_timeout: Duration::from_secs(30),
                event_listeners: EventListeners::new(),
                name: String::from("<unnamed>"),
            },
        }
    }

    /// How long a resolved address stays usable.
    pub fn dns_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.dns_cache_ttl = ttl;
        self
    }

    /// Upper bound on a single real resolution.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.config.resolve_timeout = timeout;
        self
    }

    /// Calls admitted per rate-limit window, across all callers.
    pub fn rate_limit_capacity(mut self, capacity: usize) -> Self {
        self.config.rate_limit_capacity = capacity;
        self
    }

    pub fn rate_limit_window(mut self, window: Duration) -> Self {
        self.config.rate_limit_window = window;
        self
    }

    /// Gives up on a rate-limit permit after `timeout` with
    /// [`OutboundError::PermitTimeout`](crate::OutboundError::PermitTimeout).
    pub fn rate_limit_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.rate_limit_acquire_timeout = Some(timeout);
        self
    }

    /// Consecutive failures that open a target's circuit.
    pub fn circuit_breaker_threshold(mut self, threshold: u32) -> Self {
        self.config.circuit_breaker_threshold = threshold;
        self
    }

    pub fn circuit_breaker_open_duration(mut self, duration: Duration) -> Self {
        self.config.circuit_breaker_open_duration = duration;
        self
    }

    /// Retries after the initial attempt; a call makes at most `max_retries + 1` attempts.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn base_backoff_delay(mut self, delay: Duration) -> Self {
        self.config.base_backoff_delay = delay;
        self
    }

    pub fn max_backoff_delay(mut self, delay: Duration) -> Self {
        self.config.max_backoff_delay = delay;
        self
    }

    /// Randomizes each backoff delay by up to ± this fraction.
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.config.jitter_factor = factor;
        self
    }

    /// How much longer the backoff base is for remote rate-limit rejections.
    pub fn rate_limited_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.config.rate_limited_backoff_multiplier = multiplier;
        self
    }

    /// Deadline for one invocation of the caller's operation.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = timeout;
        self
    }

    /// Name used in events, logs and component names.
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.config.name = name.into();
        self
    }

    /// Registers a callback when a retry is scheduled.
    ///
    /// # Callback Signature
    /// `Fn(&str, usize, Duration)` - target, zero-based retry index, and the
    /// backoff delay about to be slept.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize, Duration) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::RetryScheduled {
                    target,
                    attempt,
                    delay,
                    ..
                } = event
                {
                    f(target, *attempt, *delay);
                }
            }));
        self
    }

    /// Registers a callback when a call succeeds.
    ///
    /// # Callback Signature
    /// `Fn(&str, usize)` - target and the number of attempts it took.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::Succeeded {
                    target, attempts, ..
                } = event
                {
                    f(target, *attempts);
                }
            }));
        self
    }

    /// Registers a callback when a call runs out of attempts.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::Exhausted {
                    target, attempts, ..
                } = event
                {
                    f(target, *attempts);
                }
            }));
        self
    }

    /// Registers a callback when a call is rejected by an open circuit.
    pub fn on_circuit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.config
            .event_listeners
            .add(FnListener::new(move |event: &ExecutorEvent| {
                if let ExecutorEvent::CircuitRejected { target, .. } = event {
                    f(target);
                }
            }));
        self
    }

    /// Builds the configuration. Values are checked by
    /// [`OutboundConfig::validate`] when an executor is created.
    pub fn build(self) -> OutboundConfig {
        self.config
    }
}
