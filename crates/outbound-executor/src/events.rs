use outbound_core::OutboundEvent;
use std::time::Duration;
use tokio::time::Instant;

/// Events emitted by the request executor.
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    /// An attempt failed and another one is scheduled after `delay`.
    RetryScheduled {
        pattern_name: String,
        timestamp: Instant,
        target: String,
        /// Zero-based index of the retry about to wait.
        attempt: usize,
        delay: Duration,
    },
    /// The call succeeded.
    Succeeded {
        pattern_name: String,
        timestamp: Instant,
        target: String,
        attempts: usize,
    },
    /// The call failed on every attempt.
    Exhausted {
        pattern_name: String,
        timestamp: Instant,
        target: String,
        attempts: usize,
    },
    /// The call was turned away by the target's open circuit.
    CircuitRejected {
        pattern_name: String,
        timestamp: Instant,
        target: String,
    },
}

impl OutboundEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::RetryScheduled { .. } => "retry_scheduled",
            ExecutorEvent::Succeeded { .. } => "succeeded",
            ExecutorEvent::Exhausted { .. } => "exhausted",
            ExecutorEvent::CircuitRejected { .. } => "circuit_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::RetryScheduled { timestamp, .. }
            | ExecutorEvent::Succeeded { timestamp, .. }
            | ExecutorEvent::Exhausted { timestamp, .. }
            | ExecutorEvent::CircuitRejected { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            ExecutorEvent::RetryScheduled { pattern_name, .. }
            | ExecutorEvent::Succeeded { pattern_name, .. }
            | ExecutorEvent::Exhausted { pattern_name, .. }
            | ExecutorEvent::CircuitRejected { pattern_name, .. } => pattern_name,
        }
    }

    fn subject(&self) -> Option<&str> {
        Some(self.target())
    }
}

impl ExecutorEvent {
    /// `host:port` of the call this event belongs to.
    pub fn target(&self) -> &str {
        match self {
            ExecutorEvent::RetryScheduled { target, .. }
            | ExecutorEvent::Succeeded { target, .. }
            | ExecutorEvent::Exhausted { target, .. }
            | ExecutorEvent::CircuitRejected { target, .. } => target,
        }
    }
}
