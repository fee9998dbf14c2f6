//! TTL-bounded hostname resolution cache.
//!
//! [`ResolverCache`] memoizes hostname to address lookups so repeated outbound
//! calls to the same host skip the resolver entirely until the entry's TTL runs
//! out.
//!
//! - A hit returns the cached address without any I/O.
//! - A miss (absent or expired entry) performs one real resolution through the
//!   configured [`Resolve`] backend and stores the result only on success.
//! - A failed resolution never poisons the cache; the error goes back to the
//!   caller for that one attempt.
//!
//! Concurrent misses for the same host may each resolve independently; the last
//! successful write wins.
//!
//! # Examples
//!
//! ```
//! use outbound_resolver::{ResolverCache, ResolverConfig, StaticResolver};
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let resolver = StaticResolver::new()
//!     .with_entry("api.internal", IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
//!
//! let cache = ResolverCache::new(
//!     ResolverConfig::builder().ttl(Duration::from_secs(120)).build(),
//!     Arc::new(resolver),
//! );
//!
//! let addr = cache.resolve("api.internal").await.unwrap();
//! assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)));
//! # }
//! ```
//!
//! ## Feature Flags
//! - `metrics`: mirrors hit/miss counters into the `metrics` crate
//! - `tracing`: logs misses and failed resolutions

mod config;
mod error;
mod events;
mod resolver;

pub use config::{ResolverConfig, ResolverConfigBuilder};
pub use error::ResolveError;
pub use events::ResolverEvent;
pub use resolver::{FnResolver, Resolve, StaticResolver, SystemResolver};

use outbound_core::OutboundMetrics;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// A hostname resolved at a known point in time.
///
/// Entries are replaced wholesale on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub hostname: String,
    pub address: IpAddr,
    pub resolved_at: Instant,
}

impl ResolvedAddress {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.resolved_at) < ttl
    }
}

/// Shared hostname cache in front of a [`Resolve`] backend.
pub struct ResolverCache {
    entries: Mutex<HashMap<String, ResolvedAddress>>,
    resolver: Arc<dyn Resolve>,
    config: ResolverConfig,
    metrics: Arc<OutboundMetrics>,
}

impl ResolverCache {
    /// Creates a cache that counts into its own metrics.
    pub fn new(config: ResolverConfig, resolver: Arc<dyn Resolve>) -> Self {
        Self::with_metrics(config, resolver, Arc::new(OutboundMetrics::new()))
    }

    /// Creates a cache that counts hits and misses into `metrics`.
    pub fn with_metrics(
        config: ResolverConfig,
        resolver: Arc<dyn Resolve>,
        metrics: Arc<OutboundMetrics>,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            resolver,
            config,
            metrics,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, ResolvedAddress>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the address for `host`, resolving it if the cache has no fresh entry.
    pub async fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        let now = Instant::now();
        let expired = {
            let mut entries = self.entries();
            let cached = entries
                .get(host)
                .map(|entry| (entry.address, entry.is_fresh(now, self.config.ttl)));
            match cached {
                Some((address, true)) => {
                    drop(entries);
                    self.metrics.record_cache_hit();
                    self.config.event_listeners.emit(&ResolverEvent::CacheHit {
                        pattern_name: self.config.name.clone(),
                        timestamp: now,
                        host: host.to_owned(),
                    });
                    return Ok(address);
                }
                Some((_, false)) => {
                    entries.remove(host);
                    true
                }
                None => false,
            }
        };

        self.metrics.record_cache_miss();
        self.config.event_listeners.emit(&ResolverEvent::CacheMiss {
            pattern_name: self.config.name.clone(),
            timestamp: now,
            host: host.to_owned(),
            expired,
        });

        #[cfg(feature = "tracing")]
        debug!(resolver = %self.config.name, host, expired, "Resolver cache miss");

        let started = Instant::now();
        let outcome = match tokio::time::timeout(
            self.config.resolve_timeout,
            self.resolver.resolve(host),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ResolveError::Timeout {
                host: host.to_owned(),
                timeout: self.config.resolve_timeout,
            }),
        };

        match outcome {
            Ok(address) => {
                let resolved_at = Instant::now();
                self.entries().insert(
                    host.to_owned(),
                    ResolvedAddress {
                        hostname: host.to_owned(),
                        address,
                        resolved_at,
                    },
                );
                self.config.event_listeners.emit(&ResolverEvent::Resolved {
                    pattern_name: self.config.name.clone(),
                    timestamp: resolved_at,
                    host: host.to_owned(),
                    address,
                    elapsed: resolved_at.duration_since(started),
                });
                Ok(address)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!(resolver = %self.config.name, host, error = %err, "Resolution failed");

                self.config
                    .event_listeners
                    .emit(&ResolverEvent::ResolutionFailed {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        host: host.to_owned(),
                    });
                Err(err)
            }
        }
    }

    /// Returns the cached entry for `host` if it is still fresh. Performs no I/O
    /// and does not touch the hit/miss counters.
    pub fn peek(&self, host: &str) -> Option<ResolvedAddress> {
        let now = Instant::now();
        self.entries()
            .get(host)
            .filter(|entry| entry.is_fresh(now, self.config.ttl))
            .cloned()
    }

    /// Drops the entry for `host`. Returns true if one was present.
    pub fn invalidate(&self, host: &str) -> bool {
        self.entries().remove(host).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, including ones that have expired but have not
    /// been looked up since.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Counters this cache records into.
    pub fn metrics(&self) -> &Arc<OutboundMetrics> {
        &self.metrics
    }
}

impl std::fmt::Debug for ResolverCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverCache")
            .field("name", &self.config.name)
            .field("ttl", &self.config.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
