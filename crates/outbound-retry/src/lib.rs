//! Backoff between retries of an outbound call.
//!
//! [`BackoffPolicy`] computes `base × 2^attempt` capped at a ceiling, with
//! optional bounded jitter so that many callers failing together do not
//! retry in lockstep. Rate-limited failures get a longer schedule of their own.
//!
//! ```
//! use outbound_retry::BackoffPolicy;
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::builder()
//!     .base_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(policy.delay_for(0), Duration::from_millis(100));
//! assert_eq!(policy.delay_for(3), Duration::from_millis(800));
//! assert_eq!(policy.delay_for(10), Duration::from_secs(5));
//! ```

mod backoff;
mod policy;

pub use backoff::{ExponentialBackoff, IntervalFunction};
pub use policy::{BackoffPolicy, BackoffPolicyBuilder};
