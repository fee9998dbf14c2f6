use std::time::Duration;
use thiserror::Error;

/// Errors produced while turning a hostname into an address.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The underlying lookup failed.
    #[error("failed to resolve '{host}': {error}")]
    Lookup {
        /// Hostname that was looked up.
        host: String,
        /// Error reported by the resolver.
        error: std::io::Error,
    },

    /// The lookup succeeded but returned no usable address.
    #[error("no address found for '{host}'")]
    NoAddress {
        /// Hostname that was looked up.
        host: String,
    },

    /// The lookup did not finish within the configured resolve timeout.
    #[error("resolving '{host}' timed out after {timeout:?}")]
    Timeout {
        /// Hostname that was looked up.
        host: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
}

impl ResolveError {
    /// Hostname the error refers to.
    pub fn host(&self) -> &str {
        match self {
            ResolveError::Lookup { host, .. }
            | ResolveError::NoAddress { host }
            | ResolveError::Timeout { host, .. } => host,
        }
    }

    /// Returns true if the lookup was abandoned because it took too long.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResolveError::Timeout { .. })
    }
}
