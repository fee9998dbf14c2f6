use crate::backoff::{ExponentialBackoff, IntervalFunction};
use std::time::Duration;

/// Delay policy between attempts of one outbound call.
///
/// Ordinary failures back off as `base_delay × 2^attempt`. Failures the remote
/// side reported as rate limiting use a base `rate_limited_multiplier` times
/// larger, and never retry sooner than a `retry_after` hint. Every delay is
/// capped at `max_delay`, jitter included.
///
/// Pure and stateless apart from the jitter source, so one policy can be shared
/// by every caller.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    backoff: ExponentialBackoff,
    rate_limited: ExponentialBackoff,
    max_delay: Duration,
}

impl BackoffPolicy {
    pub fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder::new()
    }

    /// Delay before retry number `attempt` (0-indexed: the first retry uses 0).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.backoff.next_interval(attempt)
    }

    /// Delay before retrying a call the remote side rejected for rate limiting.
    pub fn delay_for_rate_limited(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        let computed = self.rate_limited.next_interval(attempt);
        match retry_after {
            Some(hint) => computed.max(hint.min(self.max_delay)),
            None => computed,
        }
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IntervalFunction for BackoffPolicy {
    fn next_interval(&self, attempt: usize) -> Duration {
        self.delay_for(attempt)
    }
}

/// Builder for [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct BackoffPolicyBuilder {
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    rate_limited_multiplier: u32,
}

impl Default for BackoffPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffPolicyBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - base_delay: 100ms
    /// - max_delay: 10s
    /// - jitter_factor: 0.0 (no jitter)
    /// - rate_limited_multiplier: 10
    pub fn new() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.0,
            rate_limited_multiplier: 10,
        }
    }

    /// Delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Ceiling for every computed delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Randomizes each delay by up to ± this fraction (clamped to `0.0..=1.0`).
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor;
        self
    }

    /// How many times larger the base delay is for rate-limited failures.
    pub fn rate_limited_multiplier(mut self, multiplier: u32) -> Self {
        self.rate_limited_multiplier = multiplier;
        self
    }

    pub fn build(self) -> BackoffPolicy {
        let rate_limited_base = self
            .base_delay
            .saturating_mul(self.rate_limited_multiplier.max(1));
        let exponential = |base: Duration| {
            ExponentialBackoff::new(base)
                .max_interval(self.max_delay)
                .randomization_factor(self.jitter_factor)
        };

        BackoffPolicy {
            backoff: exponential(self.base_delay),
            rate_limited: exponential(rate_limited_base),
            max_delay: self.max_delay,
        }
    }
}
