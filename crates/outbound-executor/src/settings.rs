//! Deserializable executor settings.

use crate::config::{OutboundConfig, OutboundConfigBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Flat, file-friendly form of [`OutboundConfig`]. Durations are in
/// milliseconds and every field falls back to its default when absent.
///
/// ```
/// use outbound_executor::OutboundSettings;
///
/// let settings: OutboundSettings =
///     serde_json::from_str(r#"{ "rate_limit_capacity": 50, "max_retries": 1 }"#).unwrap();
/// assert_eq!(settings.rate_limit_capacity, 50);
/// assert_eq!(settings.dns_cache_ttl_ms, 120_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundSettings {
    pub name: String,
    pub dns_cache_ttl_ms: u64,
    pub resolve_timeout_ms: u64,
    pub rate_limit_capacity: usize,
    pub rate_limit_window_ms: u64,
    pub rate_limit_acquire_timeout_ms: Option<u64>,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_open_duration_ms: u64,
    pub max_retries: usize,
    pub base_backoff_delay_ms: u64,
    pub max_backoff_delay_ms: u64,
    pub jitter_factor: f64,
    pub rate_limited_backoff_multiplier: u32,
    pub operation_timeout_ms: u64,
}

impl Default for OutboundSettings {
    fn default() -> Self {
        Self {
            name: String::from("<unnamed>"),
            dns_cache_ttl_ms: 120_000,
            resolve_timeout_ms: 5_000,
            rate_limit_capacity: 10,
            rate_limit_window_ms: 1_000,
            rate_limit_acquire_timeout_ms: None,
            circuit_breaker_threshold: 5,
            circuit_breaker_open_duration_ms: 30_000,
            max_retries: 3,
            base_backoff_delay_ms: 100,
            max_backoff_delay_ms: 10_000,
            jitter_factor: 0.0,
            rate_limited_backoff_multiplier: 10,
            operation_timeout_ms: 30_000,
        }
    }
}

impl OutboundSettings {
    /// Starts a builder from these settings so callbacks can still be added.
    pub fn into_builder(self) -> OutboundConfigBuilder {
        let builder = OutboundConfig::builder()
            .name(self.name)
            .dns_cache_ttl(Duration::from_millis(self.dns_cache_ttl_ms))
            .resolve_timeout(Duration::from_millis(self.resolve_timeout_ms))
            .rate_limit_capacity(self.rate_limit_capacity)
            .rate_limit_window(Duration::from_millis(self.rate_limit_window_ms))
            .circuit_breaker_threshold(self.circuit_breaker_threshold)
            .circuit_breaker_open_duration(Duration::from_millis(
                self.circuit_breaker_open_duration_ms,
            ))
            .max_retries(self.max_retries)
            .base_backoff_delay(Duration::from_millis(self.base_backoff_delay_ms))
            .max_backoff_delay(Duration::from_millis(self.max_backoff_delay_ms))
            .jitter_factor(self.jitter_factor)
            .rate_limited_backoff_multiplier(self.rate_limited_backoff_multiplier)
            .operation_timeout(Duration::from_millis(self.operation_timeout_ms));

        match self.rate_limit_acquire_timeout_ms {
            Some(ms) => builder.rate_limit_acquire_timeout(Duration::from_millis(ms)),
            None => builder,
        }
    }
}

impl From<OutboundSettings> for OutboundConfig {
    fn from(settings: OutboundSettings) -> Self {
        settings.into_builder().build()
    }
}
