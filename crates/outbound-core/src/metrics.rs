//! Shared request counters.
//!
//! One [`OutboundMetrics`] instance is created per executor and handed by `Arc`
//! to the resolver cache and the circuit breakers so every component counts into
//! the same place. Counters only ever grow; there is no reset.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Names of the counters mirrored to the `metrics` facade.
pub mod names {
    /// Attempts handed to the caller's operation (or to resolution).
    pub const SENT: &str = "outbound_requests_sent_total";
    /// Attempts that completed successfully.
    pub const SUCCEEDED: &str = "outbound_requests_succeeded_total";
    /// Attempts that failed for any reason.
    pub const FAILED: &str = "outbound_requests_failed_total";
    /// Backoff sleeps taken before another attempt.
    pub const RETRIES: &str = "outbound_retries_total";
    /// Times a circuit breaker transitioned to open.
    pub const CIRCUIT_TRIPS: &str = "outbound_circuit_trips_total";
    /// Resolver lookups served from cache.
    pub const CACHE_HITS: &str = "outbound_dns_cache_hits_total";
    /// Resolver lookups that needed a real resolution.
    pub const CACHE_MISSES: &str = "outbound_dns_cache_misses_total";
}

/// Monotonic counters describing outbound traffic.
#[derive(Debug, Default)]
pub struct OutboundMetrics {
    sent: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
    circuit_trips: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Point-in-time copy of [`OutboundMetrics`].
///
/// Individual counters are read independently, so a snapshot taken while calls
/// are in flight need not satisfy `succeeded + failed == sent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub sent: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub retries: u64,
    pub circuit_trips: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

macro_rules! counter_op {
    ($fn_name:ident, $field:ident, $metric:expr) => {
        #[doc = concat!("Increments the `", stringify!($field), "` counter.")]
        pub fn $fn_name(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            ::metrics::counter!($metric).increment(1);
        }
    };
}

impl OutboundMetrics {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            ::metrics::describe_counter!(names::SENT, "Outbound attempts started");
            ::metrics::describe_counter!(names::SUCCEEDED, "Outbound attempts that succeeded");
            ::metrics::describe_counter!(names::FAILED, "Outbound attempts that failed");
            ::metrics::describe_counter!(names::RETRIES, "Retries scheduled after a failure");
            ::metrics::describe_counter!(names::CIRCUIT_TRIPS, "Circuit breaker trips");
            ::metrics::describe_counter!(names::CACHE_HITS, "Resolver cache hits");
            ::metrics::describe_counter!(names::CACHE_MISSES, "Resolver cache misses");
        });
        Self::default()
    }

    counter_op!(record_sent, sent, names::SENT);
    counter_op!(record_succeeded, succeeded, names::SUCCEEDED);
    counter_op!(record_failed, failed, names::FAILED);
    counter_op!(record_retry, retries, names::RETRIES);
    counter_op!(record_circuit_trip, circuit_trips, names::CIRCUIT_TRIPS);
    counter_op!(record_cache_hit, cache_hits, names::CACHE_HITS);
    counter_op!(record_cache_miss, cache_misses, names::CACHE_MISSES);

    /// Reads every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            circuit_trips: self.circuit_trips.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}
