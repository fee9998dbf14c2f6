use outbound_resolver::ResolveError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a caller's transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single attempt, as reported by the caller's operation.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(io::Error),

    /// The connection was established but the exchange failed.
    #[error("transport error: {0}")]
    Transport(BoxError),

    /// The remote side rejected the request for rate limiting.
    #[error("rate limited by remote")]
    RateLimited {
        /// Delay the remote side asked for, if it sent one.
        retry_after: Option<Duration>,
    },
}

impl AttemptError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        AttemptError::Transport(err.into())
    }

    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        AttemptError::RateLimited { retry_after }
    }
}

impl From<io::Error> for AttemptError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::AddrInUse
            | io::ErrorKind::NotConnected => AttemptError::Connect(err),
            _ => AttemptError::Transport(Box::new(err)),
        }
    }
}

/// Errors returned by [`RequestExecutor`](crate::RequestExecutor).
#[derive(Debug, Error)]
pub enum OutboundError {
    /// The target's hostname could not be resolved.
    #[error("resolution failed: {0}")]
    Resolution(ResolveError),

    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(io::Error),

    /// The operation failed after connecting.
    #[error("transport error: {0}")]
    Transport(BoxError),

    /// The operation did not finish within the per-attempt timeout.
    #[error("operation timed out after {0:?}")]
    OperationTimeout(Duration),

    /// The remote side rejected the request for rate limiting.
    #[error("rate limited by remote")]
    RateLimited { retry_after: Option<Duration> },

    /// The target's circuit is open; nothing was attempted.
    #[error("circuit open for {target}")]
    CircuitOpen {
        /// `host:port` of the rejected target.
        target: String,
        /// Time left before the circuit admits a probe, when known.
        retry_after: Option<Duration>,
    },

    /// Every attempt failed.
    #[error("all {attempts} attempts failed, last error: {last}")]
    ExhaustedRetries {
        attempts: usize,
        last: Box<OutboundError>,
    },

    /// Waiting for a local rate-limit permit exceeded the configured acquire timeout.
    #[error("no rate-limit permit within {0:?}")]
    PermitTimeout(Duration),

    /// The executor was shut down while the call was waiting.
    #[error("request cancelled")]
    Cancelled,
}

impl OutboundError {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, OutboundError::CircuitOpen { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OutboundError::Cancelled)
    }

    /// Whether another attempt may succeed. Only per-attempt failures are
    /// retryable; rejections and terminal errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OutboundError::Resolution(_)
                | OutboundError::Connect(_)
                | OutboundError::Transport(_)
                | OutboundError::OperationTimeout(_)
                | OutboundError::RateLimited { .. }
        )
    }

    /// Attempts made before giving up, for [`OutboundError::ExhaustedRetries`].
    pub fn attempts(&self) -> Option<usize> {
        match self {
            OutboundError::ExhaustedRetries { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

impl From<AttemptError> for OutboundError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Connect(e) => OutboundError::Connect(e),
            AttemptError::Transport(e) => OutboundError::Transport(e),
            AttemptError::RateLimited { retry_after } => OutboundError::RateLimited { retry_after },
        }
    }
}

impl From<ResolveError> for OutboundError {
    fn from(err: ResolveError) -> Self {
        OutboundError::Resolution(err)
    }
}
