use outbound_core::OutboundEvent;
use std::time::Duration;
use tokio::time::Instant;

/// Events emitted by the rate limiter.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A caller obtained a permit.
    PermitAcquired {
        pattern_name: String,
        timestamp: Instant,
        /// How long the caller waited; zero when a permit was free.
        wait_duration: Duration,
    },
    /// A caller gave up after the acquire timeout.
    PermitTimedOut {
        pattern_name: String,
        timestamp: Instant,
        timeout: Duration,
    },
    /// The refill task topped the pool back up to capacity.
    PermitsRefreshed {
        pattern_name: String,
        timestamp: Instant,
        available_permits: usize,
    },
}

impl OutboundEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitTimedOut { .. } => "permit_timed_out",
            RateLimiterEvent::PermitsRefreshed { .. } => "permits_refreshed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitTimedOut { timestamp, .. }
            | RateLimiterEvent::PermitsRefreshed { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { pattern_name, .. }
            | RateLimiterEvent::PermitTimedOut { pattern_name, .. }
            | RateLimiterEvent::PermitsRefreshed { pattern_name, .. } => pattern_name,
        }
    }
}
