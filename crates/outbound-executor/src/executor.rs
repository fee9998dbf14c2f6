use crate::config::{ConfigError, OutboundConfig};
use crate::error::{AttemptError, OutboundError};
use crate::events::ExecutorEvent;
use crate::target::Target;
use outbound_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use outbound_core::{EventListeners, MetricsSnapshot, OutboundMetrics};
use outbound_ratelimiter::{RateLimiter, RateLimiterConfig, RateLimiterError};
use outbound_resolver::{Resolve, ResolverCache, ResolverConfig, SystemResolver};
use outbound_retry::BackoffPolicy;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Successful result of [`RequestExecutor::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    /// Value returned by the operation.
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: usize,
}

impl<T> Outcome<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Runs caller-supplied operations against remote targets behind a shared
/// rate limiter, per-target circuit breakers and a resolver cache, retrying
/// failures with capped exponential backoff.
///
/// Cloning is cheap; clones share every component, the metrics and the
/// shutdown token.
#[derive(Clone)]
pub struct RequestExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: ResolverCache,
    limiter: RateLimiter,
    breakers: CircuitBreakerRegistry,
    backoff: BackoffPolicy,
    metrics: Arc<OutboundMetrics>,
    shutdown: CancellationToken,
    max_retries: usize,
    operation_timeout: Duration,
    event_listeners: EventListeners<ExecutorEvent>,
    name: String,
}

impl RequestExecutor {
    /// Creates an executor that resolves hostnames through the system resolver.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a tokio runtime, since the rate limiter's
    /// refill task is spawned here.
    pub fn new(config: OutboundConfig) -> Result<Self, ConfigError> {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    /// Creates an executor that resolves hostnames through `resolver`.
    ///
    /// # Panics
    ///
    /// Panics if called from outside a tokio runtime.
    pub fn with_resolver(
        config: OutboundConfig,
        resolver: Arc<dyn Resolve>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics = Arc::new(OutboundMetrics::new());
        let shutdown = CancellationToken::new();

        let resolver = ResolverCache::with_metrics(
            ResolverConfig::builder()
                .ttl(config.dns_cache_ttl)
                .resolve_timeout(config.resolve_timeout)
                .name(format!("{}.resolver", config.name))
                .build(),
            resolver,
            Arc::clone(&metrics),
        );

        let mut limiter_config = RateLimiterConfig::builder()
            .capacity(config.rate_limit_capacity)
            .window(config.rate_limit_window)
            .name(format!("{}.ratelimiter", config.name));
        if let Some(timeout) = config.rate_limit_acquire_timeout {
            limiter_config = limiter_config.acquire_timeout(timeout);
        }
        let limiter = RateLimiter::new(limiter_config.build());
        limiter.spawn_refill(shutdown.clone());

        let breakers = CircuitBreakerRegistry::with_metrics(
            CircuitBreakerConfig::builder()
                .failure_threshold(config.circuit_breaker_threshold)
                .open_duration(config.circuit_breaker_open_duration)
                // The half-open slot stays claimed for as long as one attempt can run.
                .probe_timeout(
                    (config.resolve_timeout + config.operation_timeout)
                        .max(config.circuit_breaker_open_duration),
                )
                .build(),
            Arc::clone(&metrics),
        );

        let backoff = BackoffPolicy::builder()
            .base_delay(config.base_backoff_delay)
            .max_delay(config.max_backoff_delay)
            .jitter_factor(config.jitter_factor)
            .rate_limited_multiplier(config.rate_limited_backoff_multiplier)
            .build();

        Ok(Self {
            inner: Arc::new(Inner {
                resolver,
                limiter,
                breakers,
                backoff,
                metrics,
                shutdown,
                max_retries: config.max_retries,
                operation_timeout: config.operation_timeout,
                event_listeners: config.event_listeners,
                name: config.name,
            }),
        })
    }

    /// Runs `operation` against `target` with the configured retry budget.
    ///
    /// See [`execute_with_retries`](Self::execute_with_retries).
    pub async fn execute<T, F, Fut>(
        &self,
        target: &Target,
        operation: F,
    ) -> Result<Outcome<T>, OutboundError>
    where
        F: FnMut(SocketAddr) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        self.execute_with_retries(target, self.inner.max_retries, operation)
            .await
    }

    /// Runs `operation` against `target`, making at most `max_retries + 1`
    /// attempts.
    ///
    /// One rate-limit permit is taken per call, before the first attempt.
    /// Before every attempt the target's circuit is consulted; an open circuit
    /// ends the call with [`OutboundError::CircuitOpen`] without consuming an
    /// attempt. Each attempt resolves the host through the cache and then
    /// invokes `operation` with the resolved address under the operation
    /// timeout. Failures feed the circuit and are retried after a backoff
    /// delay until the attempts run out.
    ///
    /// Every wait observes the executor's shutdown token.
    pub async fn execute_with_retries<T, F, Fut>(
        &self,
        target: &Target,
        max_retries: usize,
        mut operation: F,
    ) -> Result<Outcome<T>, OutboundError>
    where
        F: FnMut(SocketAddr) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let inner = &*self.inner;

        inner
            .limiter
            .acquire_with(&inner.shutdown)
            .await
            .map_err(|err| match err {
                RateLimiterError::Timeout { timeout } => OutboundError::PermitTimeout(timeout),
                RateLimiterError::Cancelled | RateLimiterError::Closed => OutboundError::Cancelled,
            })?;

        let authority = target.authority();
        let breaker = inner.breakers.get(&authority);
        let max_attempts = max_retries.saturating_add(1);
        let mut attempts = 0;

        loop {
            let Some(permit) = breaker.try_acquire() else {
                inner.emit(ExecutorEvent::CircuitRejected {
                    pattern_name: inner.name.clone(),
                    timestamp: Instant::now(),
                    target: authority.clone(),
                });

                #[cfg(feature = "tracing")]
                warn!(executor = %inner.name, target = %authority, attempts, "Circuit open, call rejected");

                return Err(OutboundError::CircuitOpen {
                    target: authority,
                    retry_after: breaker.remaining_open(),
                });
            };

            inner.metrics.record_sent();
            let result = self.attempt(target, &mut operation).await;
            attempts += 1;

            let err = match result {
                Ok(value) => {
                    permit.record_success();
                    inner.metrics.record_succeeded();
                    inner.emit(ExecutorEvent::Succeeded {
                        pattern_name: inner.name.clone(),
                        timestamp: Instant::now(),
                        target: authority,
                        attempts,
                    });
                    return Ok(Outcome { value, attempts });
                }
                Err(OutboundError::Cancelled) => {
                    // Abandoned, not failed: the circuit is left alone.
                    drop(permit);
                    inner.metrics.record_failed();
                    return Err(OutboundError::Cancelled);
                }
                Err(err) => {
                    permit.record_failure();
                    inner.metrics.record_failed();
                    err
                }
            };

            if attempts >= max_attempts {
                inner.emit(ExecutorEvent::Exhausted {
                    pattern_name: inner.name.clone(),
                    timestamp: Instant::now(),
                    target: authority,
                    attempts,
                });

                #[cfg(feature = "tracing")]
                warn!(executor = %inner.name, attempts, error = %err, "Retries exhausted");

                return Err(OutboundError::ExhaustedRetries {
                    attempts,
                    last: Box::new(err),
                });
            }

            let retry = attempts - 1;
            let delay = match &err {
                OutboundError::RateLimited { retry_after } => {
                    inner.backoff.delay_for_rate_limited(retry, *retry_after)
                }
                _ => inner.backoff.delay_for(retry),
            };

            inner.emit(ExecutorEvent::RetryScheduled {
                pattern_name: inner.name.clone(),
                timestamp: Instant::now(),
                target: authority.clone(),
                attempt: retry,
                delay,
            });

            #[cfg(feature = "tracing")]
            debug!(executor = %inner.name, target = %authority, attempt = retry, ?delay, error = %err, "Retrying after backoff");

            tokio::select! {
                biased;
                _ = inner.shutdown.cancelled() => return Err(OutboundError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            inner.metrics.record_retry();
        }
    }

    /// One attempt: resolve, then run the operation under the timeout.
    async fn attempt<T, F, Fut>(&self, target: &Target, operation: &mut F) -> Result<T, OutboundError>
    where
        F: FnMut(SocketAddr) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let inner = &*self.inner;

        let address = tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => return Err(OutboundError::Cancelled),
            resolved = inner.resolver.resolve(target.host()) => resolved?,
        };
        let address = SocketAddr::new(address, target.port());

        let timeout = inner.operation_timeout;
        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => Err(OutboundError::Cancelled),
            outcome = tokio::time::timeout(timeout, operation(address)) => match outcome {
                Ok(result) => result.map_err(OutboundError::from),
                Err(_) => Err(OutboundError::OperationTimeout(timeout)),
            },
        }
    }

    /// Point-in-time copy of the request counters. Safe to call while calls
    /// are in flight.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Cancels every pending permit wait, resolution, operation and backoff
    /// sleep, and stops the rate limiter's refill task. Later calls fail with
    /// [`OutboundError::Cancelled`].
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// The token [`shutdown`](Self::shutdown) cancels, for tying other work to
    /// the executor's lifetime.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub fn resolver(&self) -> &ResolverCache {
        &self.inner.resolver
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerRegistry {
        &self.inner.breakers
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl Inner {
    fn emit(&self, event: ExecutorEvent) {
        self.event_listeners.emit(&event);
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("name", &self.inner.name)
            .field("max_retries", &self.inner.max_retries)
            .field("operation_timeout", &self.inner.operation_timeout)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
