//! Resilient execution of outbound requests.
//!
//! [`RequestExecutor`] wraps a caller-supplied attempt (typically "connect to
//! this address and exchange a message") with the rest of the outbound stack:
//!
//! 1. a system-wide fixed-window **rate limiter** admits the call
//! 2. the target's **circuit breaker** is asked whether the target is usable
//! 3. the **resolver cache** turns the hostname into an address
//! 4. the operation runs under a per-attempt timeout
//! 5. failures are recorded and retried with capped exponential **backoff**
//!
//! All components share one set of [`MetricsSnapshot`] counters and one
//! shutdown token; [`RequestExecutor::shutdown`] unblocks every waiting caller
//! immediately.
//!
//! # Examples
//!
//! ```rust,no_run
//! use outbound_executor::{AttemptError, OutboundConfig, RequestExecutor, Target};
//! use std::time::Duration;
//! use tokio::io::AsyncWriteExt;
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RequestExecutor::new(
//!     OutboundConfig::builder()
//!         .rate_limit_capacity(10)
//!         .max_retries(3)
//!         .operation_timeout(Duration::from_secs(5))
//!         .build(),
//! )?;
//!
//! let target: Target = "example.com:80".parse()?;
//! let outcome = executor
//!     .execute(&target, |addr| async move {
//!         let mut stream = TcpStream::connect(addr).await?;
//!         stream.write_all(b"HEAD / HTTP/1.0\r\n\r\n").await?;
//!         Ok::<_, AttemptError>(())
//!     })
//!     .await?;
//!
//! println!("done after {} attempt(s): {:?}", outcome.attempts, executor.metrics());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//! - `metrics`: mirrors the request counters into the `metrics` crate
//! - `tracing`: logs retries, rejections and exhausted calls, and enables
//!   tracing in every component
//! - `serde`: [`OutboundSettings`] and serializable metrics snapshots

mod config;
mod error;
mod events;
mod executor;
mod layer;
#[cfg(feature = "serde")]
mod settings;
mod target;

pub use config::{ConfigError, OutboundConfig, OutboundConfigBuilder};
pub use error::{AttemptError, BoxError, OutboundError};
pub use events::ExecutorEvent;
pub use executor::{Outcome, RequestExecutor};
pub use layer::{Attempt, Outbound, OutboundLayer, Request};
#[cfg(feature = "serde")]
pub use settings::OutboundSettings;
pub use target::{Target, TargetParseError};

pub use outbound_circuitbreaker::CircuitState;
pub use outbound_core::MetricsSnapshot;
pub use outbound_resolver::{Resolve, StaticResolver, SystemResolver};
pub use tokio_util::sync::CancellationToken;
