use outbound_core::OutboundEvent;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

/// Events emitted by the resolver cache.
#[derive(Debug, Clone)]
pub enum ResolverEvent {
    /// A lookup was answered from the cache.
    CacheHit {
        pattern_name: String,
        timestamp: Instant,
        host: String,
    },
    /// A lookup found no usable entry and went to the resolver.
    CacheMiss {
        pattern_name: String,
        timestamp: Instant,
        host: String,
        /// True when an entry existed but had outlived the TTL.
        expired: bool,
    },
    /// A real resolution succeeded and the cache was updated.
    Resolved {
        pattern_name: String,
        timestamp: Instant,
        host: String,
        address: IpAddr,
        elapsed: Duration,
    },
    /// A real resolution failed; the cache was left untouched.
    ResolutionFailed {
        pattern_name: String,
        timestamp: Instant,
        host: String,
    },
}

impl OutboundEvent for ResolverEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ResolverEvent::CacheHit { .. } => "cache_hit",
            ResolverEvent::CacheMiss { .. } => "cache_miss",
            ResolverEvent::Resolved { .. } => "resolved",
            ResolverEvent::ResolutionFailed { .. } => "resolution_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ResolverEvent::CacheHit { timestamp, .. }
            | ResolverEvent::CacheMiss { timestamp, .. }
            | ResolverEvent::Resolved { timestamp, .. }
            | ResolverEvent::ResolutionFailed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            ResolverEvent::CacheHit { pattern_name, .. }
            | ResolverEvent::CacheMiss { pattern_name, .. }
            | ResolverEvent::Resolved { pattern_name, .. }
            | ResolverEvent::ResolutionFailed { pattern_name, .. } => pattern_name,
        }
    }

    fn subject(&self) -> Option<&str> {
        match self {
            ResolverEvent::CacheHit { host, .. }
            | ResolverEvent::CacheMiss { host, .. }
            | ResolverEvent::Resolved { host, .. }
            | ResolverEvent::ResolutionFailed { host, .. } => Some(host),
        }
    }
}
