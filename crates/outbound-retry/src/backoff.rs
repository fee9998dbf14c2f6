use std::time::Duration;

/// Abstraction for computing retry intervals.
pub trait IntervalFunction: Send + Sync {
    /// Computes the delay before the next retry attempt.
    ///
    /// # Arguments
    /// * `attempt` - The retry attempt number (0-indexed, so first retry is 0)
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Exponential backoff: `initial_interval × multiplier^attempt`, optionally
/// capped and randomized.
///
/// With a randomization factor `f` the computed interval `d` is drawn
/// uniformly from `[d × (1 - f), d × (1 + f)]`, and the cap is applied again
/// afterwards so jitter never pushes a delay past `max_interval`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
    randomization_factor: f64,
}

impl ExponentialBackoff {
    /// Creates a new exponential backoff with default multiplier of 2.0.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
            randomization_factor: 0.0,
        }
    }

    /// Sets the multiplier for exponential growth.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum interval to cap exponential growth.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    /// Sets the randomization factor, clamped to `0.0..=1.0`.
    ///
    /// A factor of 0.5 means the interval will be randomized between 50% and
    /// 150% of the calculated value.
    pub fn randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        self
    }

    /// Deterministic part of the interval for `attempt`, before jitter.
    pub fn base_interval(&self, attempt: usize) -> Duration {
        if self.initial_interval.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        // Overflowing growth saturates instead of panicking in `Duration::mul_f64`.
        let interval = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        self.cap(interval)
    }

    fn cap(&self, interval: Duration) -> Duration {
        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }

    fn randomize(&self, duration: Duration) -> Duration {
        use rand::Rng;

        if self.randomization_factor == 0.0 || duration.is_zero() {
            return duration;
        }
        let secs = duration.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let randomized = rand::rng().random_range((secs - delta)..=(secs + delta));
        Duration::try_from_secs_f64(randomized.max(0.0)).unwrap_or(duration)
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self.base_interval(attempt);
        self.cap(self.randomize(interval))
    }
}
