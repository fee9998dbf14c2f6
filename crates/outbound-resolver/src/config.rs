use crate::events::ResolverEvent;
use std::time::Duration;
use outbound_core::{EventListeners, FnListener};

/// Configuration for the resolver cache.
pub struct ResolverConfig {
    pub(crate) ttl: Duration,
    pub(crate) resolve_timeout: Duration,
    pub(crate) event_listeners: EventListeners<ResolverEvent>,
    pub(crate) name: String,
}

impl ResolverConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::new()
    }

    /// How long a resolved address stays usable.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfigBuilder::new().build()
    }
}

/// Builder for [`ResolverConfig`].
pub struct ResolverConfigBuilder {
    ttl: Duration,
    resolve_timeout: Duration,
    event_listeners: EventListeners<ResolverEvent>,
    name: String,
}

impl Default for ResolverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - ttl: 120 seconds
    /// - resolve_timeout: 5 seconds
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            ttl: Duration::from_secs(120),
            resolve_timeout: Duration::from_secs(5),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets how long a resolved address may be served from the cache.
    ///
    /// An entry is usable while `now - resolved_at < ttl`.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the deadline for a single uncached resolution.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    /// Sets the name used in events and logs.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked with the hostname on every cache hit.
    pub fn on_cache_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ResolverEvent| {
            if let ResolverEvent::CacheHit { host, .. } = event {
                f(host);
            }
        }));
        self
    }

    /// Registers a callback invoked on every cache miss.
    ///
    /// # Callback Signature
    /// `Fn(&str, bool)` - the hostname, and whether the miss was caused by an
    /// expired entry rather than an absent one.
    pub fn on_cache_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ResolverEvent| {
            if let ResolverEvent::CacheMiss { host, expired, .. } = event {
                f(host, *expired);
            }
        }));
        self
    }

    /// Registers a callback invoked when a real resolution fails.
    pub fn on_resolution_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &ResolverEvent| {
            if let ResolverEvent::ResolutionFailed { host, .. } = event {
                f(host);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ResolverConfig {
        ResolverConfig {
            ttl: self.ttl,
            resolve_timeout: self.resolve_timeout,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}
