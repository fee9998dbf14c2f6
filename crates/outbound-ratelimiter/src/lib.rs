//! Fixed-window admission limiting for outbound requests.
//!
//! A [`RateLimiter`] admits at most `capacity` callers per `window`, system
//! wide, no matter how many tasks are calling. Callers beyond the budget park
//! until the refill task resets the pool at the next window boundary.
//!
//! # Features
//!
//! - **Blocking wait, no polling**: waiters sleep on a semaphore that the
//!   refill task replenishes
//! - **Cancellable**: every wait observes a [`CancellationToken`], and shutting
//!   the refill task down closes the pool
//! - **Optional acquire timeout**: bound the wait independently of any
//!   per-request timeout
//! - **Event system**: observe acquisitions, timeouts and refills
//!
//! No ordering is guaranteed among waiters.
//!
//! # Examples
//!
//! ```
//! use outbound_ratelimiter::{RateLimiter, RateLimiterConfig};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(
//!     RateLimiterConfig::builder()
//!         .capacity(10)
//!         .window(Duration::from_secs(1))
//!         .build(),
//! );
//! let shutdown = CancellationToken::new();
//! limiter.spawn_refill(shutdown.clone());
//!
//! let waited = limiter.acquire_with(&shutdown).await.unwrap();
//! println!("admitted after {:?}", waited);
//! # }
//! ```

mod config;
mod error;
mod events;
mod limiter;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use limiter::RateLimiter;

pub use tokio_util::sync::CancellationToken;
