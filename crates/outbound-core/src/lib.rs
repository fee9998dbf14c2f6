//! Core infrastructure for outbound.
//!
//! Shared by every outbound component:
//! - the event system used for observability callbacks
//! - the request counters behind the executor's metrics snapshot

pub mod events;
pub mod metrics;

pub use events::{EventListener, EventListeners, FnListener, OutboundEvent, SharedListener};
pub use metrics::{MetricsSnapshot, OutboundMetrics};
