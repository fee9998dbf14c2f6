use crate::events::RateLimiterEvent;
use outbound_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the rate limiter.
pub struct RateLimiterConfig {
    pub(crate) capacity: usize,
    pub(crate) window: Duration,
    pub(crate) acquire_timeout: Option<Duration>,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    capacity: usize,
    window: Duration,
    acquire_timeout: Option<Duration>,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - capacity: 10
    /// - window: 1 second
    /// - acquire_timeout: none (wait for the next refill or cancellation)
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            capacity: 10,
            window: Duration::from_secs(1),
            acquire_timeout: None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the number of permits admitted per window.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the refill interval. Every window the pool is reset to `capacity`.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Bounds how long a caller may wait for a permit.
    ///
    /// Independent of any per-attempt operation timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Sets the name for this rate limiter instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a permit is acquired.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - how long the caller waited. Zero when a permit was
    /// immediately available.
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RateLimiterEvent| {
                if let RateLimiterEvent::PermitAcquired { wait_duration, .. } = event {
                    f(*wait_duration);
                }
            }));
        self
    }

    /// Registers a callback when a caller gives up after the acquire timeout.
    pub fn on_permit_timed_out<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RateLimiterEvent| {
                if let RateLimiterEvent::PermitTimedOut { timeout, .. } = event {
                    f(*timeout);
                }
            }));
        self
    }

    /// Registers a callback when the refill task tops up the pool.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - permits available right after the refill.
    pub fn on_permits_refreshed<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &RateLimiterEvent| {
                if let RateLimiterEvent::PermitsRefreshed {
                    available_permits, ..
                } = event
                {
                    f(*available_permits);
                }
            }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RateLimiterConfig {
        RateLimiterConfig {
            capacity: self.capacity,
            window: self.window,
            acquire_timeout: self.acquire_timeout,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
