use crate::breaker::CircuitBreaker;
use crate::config::CircuitBreakerConfig;
use outbound_core::OutboundMetrics;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out one [`CircuitBreaker`] per target.
///
/// Breakers are created lazily on first use and live as long as the registry.
/// They share a single configuration (thresholds and listeners) and a single
/// metrics instance, and report under the target key they were created for,
/// so one failing host never opens the circuit for another.
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
    config: Arc<CircuitBreakerConfig>,
    metrics: Arc<OutboundMetrics>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_metrics(config, Arc::new(OutboundMetrics::new()))
    }

    pub fn with_metrics(config: CircuitBreakerConfig, metrics: Arc<OutboundMetrics>) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            config: Arc::new(config),
            metrics,
        }
    }

    /// Returns the breaker for `target`, creating it closed if needed.
    pub fn get(&self, target: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(breaker) = breakers.get(target) {
            return Arc::clone(breaker);
        }
        let breaker = Arc::new(CircuitBreaker::with_shared(
            target,
            Arc::clone(&self.config),
            Arc::clone(&self.metrics),
        ));
        breakers.insert(target.to_string(), Arc::clone(&breaker));
        breaker
    }

    /// Returns the breaker for `target` only if one has been created.
    pub fn find(&self, target: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .cloned()
    }

    /// Closes every known breaker.
    pub fn reset_all(&self) {
        let breakers: Vec<_> = self
            .breakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for breaker in breakers {
            breaker.reset();
        }
    }

    /// Number of targets seen so far.
    pub fn len(&self) -> usize {
        self.breakers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<OutboundMetrics> {
        &self.metrics
    }
}

impl std::fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("targets", &self.len())
            .finish()
    }
}
