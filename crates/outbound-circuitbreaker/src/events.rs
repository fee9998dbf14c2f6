use crate::circuit::CircuitState;
use outbound_core::OutboundEvent;
use std::time::Duration;
use tokio::time::Instant;

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved between states.
    StateTransition {
        pattern_name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was turned away without being attempted.
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        /// Remaining open period, when the circuit is open rather than probing.
        retry_after: Option<Duration>,
    },
    /// A single probe was let through a half-open circuit.
    ProbePermitted {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl OutboundEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::ProbePermitted { .. } => "probe_permitted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::ProbePermitted { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { pattern_name, .. }
            | CircuitBreakerEvent::CallRejected { pattern_name, .. }
            | CircuitBreakerEvent::ProbePermitted { pattern_name, .. } => pattern_name,
        }
    }
}
