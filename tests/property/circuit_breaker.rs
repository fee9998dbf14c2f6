//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - Opens exactly when the failure streak reaches the threshold
//! - A success anywhere in the streak starts it over
//! - Rejects every call while open
//! - Admits a single probe once the open period has passed

use outbound_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use proptest::prelude::*;
use std::time::Duration;
use tokio::runtime::Builder;

fn breaker(threshold: u32, open: Duration) -> CircuitBreaker {
    CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .open_duration(open)
            .build(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the circuit opens on the threshold-th consecutive failure and not before
    #[test]
    fn opens_exactly_at_threshold(threshold in 1u32..=20) {
        let cb = breaker(threshold, Duration::from_secs(60));

        for _ in 1..threshold {
            prop_assert!(cb.allow());
            cb.record_failure();
            prop_assert_eq!(cb.state(), CircuitState::Closed);
        }
        prop_assert!(cb.allow());
        cb.record_failure();
        prop_assert_eq!(cb.state(), CircuitState::Open);
        prop_assert!(!cb.allow());
    }

    /// Property: a sequence that never has `threshold` failures in a row keeps the circuit closed
    #[test]
    fn interleaved_successes_keep_circuit_closed(
        threshold in 2u32..=10,
        outcomes in proptest::collection::vec(any::<bool>(), 0..200),
    ) {
        let cb = breaker(threshold, Duration::from_secs(60));
        let mut streak = 0u32;
        let mut opened = false;

        for success in outcomes {
            if !cb.allow() {
                prop_assert!(opened);
                break;
            }
            if success {
                cb.record_success();
                streak = 0;
            } else {
                cb.record_failure();
                streak += 1;
                if streak >= threshold {
                    opened = true;
                }
            }
            prop_assert_eq!(cb.state() == CircuitState::Open, opened);
            if !opened {
                prop_assert_eq!(cb.consecutive_failures(), streak);
            }
        }
    }

    /// Property: after the open period exactly one of many callers is let through
    #[test]
    fn single_probe_after_open_period(
        threshold in 1u32..=5,
        open_ms in 10u64..=5_000,
        callers in 2usize..=32,
    ) {
        let rt = Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        rt.block_on(async {
            let cb = breaker(threshold, Duration::from_millis(open_ms));
            for _ in 0..threshold {
                cb.record_failure();
            }
            prop_assert!(!cb.allow());

            tokio::time::sleep(Duration::from_millis(open_ms)).await;

            let permits: Vec<_> = (0..callers).filter_map(|_| cb.try_acquire()).collect();
            prop_assert_eq!(permits.len(), 1);
            prop_assert!(permits[0].is_probe());
            prop_assert_eq!(cb.state(), CircuitState::HalfOpen);
            Ok(())
        })?;
    }
}
