use crate::{RateLimiterConfig, RateLimiterError, RateLimiterEvent};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Fixed-window admission limiter.
///
/// Permits live in a semaphore that starts full. Each admitted caller consumes
/// one permit for good; a periodic refill task tops the pool back up to
/// `capacity` once per window. Waiting callers park on the semaphore instead
/// of polling, and are woken as soon as the refill lands.
///
/// Cloning is cheap and every clone shares the same pool.
#[derive(Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    config: Arc<RateLimiterConfig>,
}

impl RateLimiter {
    /// Creates a limiter with a full pool. Call [`spawn_refill`](Self::spawn_refill)
    /// to start replenishing it.
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.capacity)),
            config: Arc::new(config),
        }
    }

    /// Starts the periodic refill task on the current tokio runtime.
    ///
    /// The task stops when `shutdown` is cancelled (closing the pool so that
    /// every waiter wakes up with [`RateLimiterError::Closed`]) or when the last
    /// clone of this limiter is dropped.
    pub fn spawn_refill(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let semaphore = Arc::downgrade(&self.semaphore);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + config.window, config.window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        if let Some(semaphore) = semaphore.upgrade() {
                            semaphore.close();
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        if !top_up(&semaphore, &config) {
                            break;
                        }
                    }
                }
            }

            #[cfg(feature = "tracing")]
            debug!(ratelimiter = %config.name, "Refill task stopped");
        })
    }

    /// Waits for a permit with no cancellation other than the configured
    /// acquire timeout and limiter shutdown.
    pub async fn acquire(&self) -> Result<Duration, RateLimiterError> {
        self.acquire_with(&CancellationToken::new()).await
    }

    /// Waits for a permit, giving up if `cancel` fires first.
    ///
    /// Returns how long the caller waited.
    pub async fn acquire_with(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Duration, RateLimiterError> {
        let started = Instant::now();

        let wait = async {
            let take = async {
                self.semaphore
                    .acquire()
                    .await
                    .map(|permit| permit.forget())
                    .map_err(|_| RateLimiterError::Closed)
            };
            match self.config.acquire_timeout {
                Some(timeout) => tokio::time::timeout(timeout, take)
                    .await
                    .unwrap_or(Err(RateLimiterError::Timeout { timeout })),
                None => take.await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RateLimiterError::Cancelled),
            acquired = wait => acquired,
        };

        match outcome {
            Ok(()) => {
                let wait_duration = started.elapsed();
                self.config
                    .event_listeners
                    .emit(&RateLimiterEvent::PermitAcquired {
                        pattern_name: self.config.name.clone(),
                        timestamp: Instant::now(),
                        wait_duration,
                    });

                #[cfg(feature = "tracing")]
                trace!(ratelimiter = %self.config.name, ?wait_duration, "Permit acquired");

                Ok(wait_duration)
            }
            Err(err) => {
                if let RateLimiterError::Timeout { timeout } = err {
                    self.config
                        .event_listeners
                        .emit(&RateLimiterEvent::PermitTimedOut {
                            pattern_name: self.config.name.clone(),
                            timestamp: Instant::now(),
                            timeout,
                        });
                }
                Err(err)
            }
        }
    }

    /// Takes a permit if one is free right now.
    pub fn try_acquire(&self) -> bool {
        match self.semaphore.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Resets the pool to full capacity immediately, as the refill task does
    /// at the end of every window.
    pub fn refill(&self) {
        top_up(&Arc::downgrade(&self.semaphore), &self.config);
    }

    /// Closes the pool. Pending and future waits fail with [`RateLimiterError::Closed`].
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Permits left in the current window.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits admitted per window.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        self.config.window
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.config.name)
            .field("capacity", &self.config.capacity)
            .field("available", &self.available_permits())
            .finish()
    }
}

/// Adds back exactly the permits consumed since the last refill. Returns false
/// once the limiter is gone or closed.
fn top_up(semaphore: &Weak<Semaphore>, config: &RateLimiterConfig) -> bool {
    let Some(semaphore) = semaphore.upgrade() else {
        return false;
    };
    if semaphore.is_closed() {
        return false;
    }

    let available = semaphore.available_permits();
    if available < config.capacity {
        semaphore.add_permits(config.capacity - available);
    }

    config
        .event_listeners
        .emit(&RateLimiterEvent::PermitsRefreshed {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            available_permits: semaphore.available_permits(),
        });
    true
}
