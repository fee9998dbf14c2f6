use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while waiting for a rate-limit permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimiterError {
    /// No permit became available within the configured acquire timeout.
    #[error("no rate-limit permit within {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The caller's cancellation signal fired while it was waiting.
    #[error("cancelled while waiting for a rate-limit permit")]
    Cancelled,

    /// The limiter was shut down; no more permits will be issued.
    #[error("rate limiter is closed")]
    Closed,
}

impl RateLimiterError {
    /// Returns true if the wait ended because of cancellation or shutdown.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RateLimiterError::Cancelled | RateLimiterError::Closed)
    }
}
