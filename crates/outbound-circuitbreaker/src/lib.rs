//! Consecutive-failure circuit breaker for outbound targets.
//!
//! A circuit breaker stops sending traffic to a target after repeated failures
//! and resumes after a cooldown.
//!
//! ## States
//! - **Closed**: Normal operation, all calls pass through
//! - **Open**: `failure_threshold` consecutive failures were recorded; calls are
//!   rejected until `open_duration` has passed
//! - **Half-Open**: The open period is over; exactly one caller is admitted as a
//!   probe. Its success closes the circuit, its failure opens it again for a
//!   full period. Everyone else is rejected while the probe is outstanding.
//!
//! Opening the circuit consumes the failure streak, and any recorded success
//! resets it.
//!
//! ## Usage
//!
//! ```rust
//! use outbound_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::new(
//!     CircuitBreakerConfig::builder()
//!         .failure_threshold(5)
//!         .open_duration(Duration::from_secs(30))
//!         .build(),
//! );
//!
//! match breaker.try_acquire() {
//!     Some(permit) => {
//!         let ok = true; // perform the call
//!         if ok {
//!             permit.record_success();
//!         } else {
//!             permit.record_failure();
//!         }
//!     }
//!     None => println!("circuit open, not calling"),
//! };
//! # }
//! ```
//!
//! For many hosts, [`CircuitBreakerRegistry`] keeps one breaker per target.
//!
//! ## Feature Flags
//! - `metrics`: transition and rejection counters through the `metrics` crate
//! - `tracing`: logs transitions, probes and rejections
//! - `serde`: `Serialize`/`Deserialize` for [`CircuitState`]

mod breaker;
mod circuit;
mod config;
mod events;
mod registry;

pub use breaker::{CallPermit, CircuitBreaker};
pub use circuit::CircuitState;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use events::CircuitBreakerEvent;
pub use registry::CircuitBreakerRegistry;
