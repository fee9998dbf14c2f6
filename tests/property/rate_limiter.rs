//! Property tests for the fixed-window rate limiter.
//!
//! Invariants tested:
//! - Never admits more than `capacity` calls in one window
//! - A refill restores the pool to capacity and never beyond
//! - Waiting callers are admitted window by window

use outbound_ratelimiter::{RateLimiter, RateLimiterConfig};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

fn limiter(capacity: usize, window: Duration) -> RateLimiter {
    RateLimiter::new(
        RateLimiterConfig::builder()
            .capacity(capacity)
            .window(window)
            .build(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: try_acquire admits exactly `capacity` calls per window
    #[test]
    fn admits_at_most_capacity(capacity in 1usize..=100, requests in 0usize..=300) {
        let limiter = limiter(capacity, Duration::from_secs(1));
        let admitted = (0..requests).filter(|_| limiter.try_acquire()).count();
        prop_assert_eq!(admitted, requests.min(capacity));
    }

    /// Property: refills top the pool back up to capacity, never past it
    #[test]
    fn refill_restores_capacity(
        capacity in 1usize..=50,
        used in 0usize..=50,
        refills in 1usize..=5,
    ) {
        let limiter = limiter(capacity, Duration::from_secs(1));
        for _ in 0..used {
            limiter.try_acquire();
        }
        for _ in 0..refills {
            limiter.refill();
        }
        prop_assert_eq!(limiter.available_permits(), capacity);
    }

    /// Property: queued callers drain at `capacity` per window
    #[test]
    fn queued_callers_drain_per_window(capacity in 1usize..=10, callers in 1usize..=60) {
        let rt = Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        rt.block_on(async {
            let window = Duration::from_secs(1);
            let limiter = limiter(capacity, window);
            let shutdown = CancellationToken::new();
            let _refill = limiter.spawn_refill(shutdown.clone());

            let admitted = Arc::new(AtomicUsize::new(0));
            let start = tokio::time::Instant::now();
            let tasks: Vec<_> = (0..callers)
                .map(|_| {
                    let limiter = limiter.clone();
                    let admitted = Arc::clone(&admitted);
                    tokio::spawn(async move {
                        limiter.acquire().await.unwrap();
                        admitted.fetch_add(1, Ordering::SeqCst);
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }

            prop_assert_eq!(admitted.load(Ordering::SeqCst), callers);
            let windows = (callers - 1) / capacity;
            prop_assert!(start.elapsed() >= window * windows as u32);
            prop_assert!(start.elapsed() < window * (windows as u32 + 1));

            shutdown.cancel();
            Ok(())
        })?;
    }
}
