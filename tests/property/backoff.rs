//! Property tests for the backoff policy.
//!
//! Invariants tested:
//! - Delays never exceed the configured maximum
//! - Without jitter, delays never shrink as attempts grow
//! - Jitter stays within its factor of the deterministic delay
//! - Rate-limited delays are never shorter than ordinary ones

use outbound_retry::BackoffPolicy;
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: every delay is capped
    #[test]
    fn delay_never_exceeds_max(
        base_ms in 0u64..=5_000,
        max_ms in 0u64..=60_000,
        jitter in 0.0f64..=1.0,
        attempt in 0usize..=200,
    ) {
        let policy = BackoffPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(Duration::from_millis(max_ms))
            .jitter_factor(jitter)
            .build();

        prop_assert!(policy.delay_for(attempt) <= Duration::from_millis(max_ms));
    }

    /// Property: without jitter the sequence is monotonically non-decreasing
    #[test]
    fn delays_are_monotonic_without_jitter(
        base_ms in 1u64..=1_000,
        max_ms in 1u64..=120_000,
        attempts in 1usize..=64,
    ) {
        let policy = BackoffPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(Duration::from_millis(max_ms))
            .build();

        let mut previous = Duration::ZERO;
        for attempt in 0..attempts {
            let delay = policy.delay_for(attempt);
            prop_assert!(delay >= previous, "attempt {} shrank: {:?} < {:?}", attempt, delay, previous);
            previous = delay;
        }
    }

    /// Property: jitter keeps the delay within its factor of the base
    #[test]
    fn jitter_stays_in_band(
        base_ms in 10u64..=1_000,
        jitter in 0.0f64..=1.0,
        attempt in 0usize..=6,
    ) {
        let max = Duration::from_secs(3600);
        let plain = BackoffPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(max)
            .build();
        let jittered = BackoffPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(max)
            .jitter_factor(jitter)
            .build();

        let center = plain.delay_for(attempt).as_secs_f64();
        let delay = jittered.delay_for(attempt).as_secs_f64();
        let slack = 1e-6;
        prop_assert!(delay >= center * (1.0 - jitter) - slack);
        prop_assert!(delay <= center * (1.0 + jitter) + slack);
    }

    /// Property: a remote rate-limit rejection never backs off less
    #[test]
    fn rate_limited_delay_dominates(
        base_ms in 1u64..=1_000,
        max_ms in 1u64..=60_000,
        attempt in 0usize..=16,
        hint_ms in proptest::option::of(0u64..=120_000),
    ) {
        let policy = BackoffPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(Duration::from_millis(max_ms))
            .build();

        let plain = policy.delay_for(attempt);
        let limited = policy.delay_for_rate_limited(attempt, hint_ms.map(Duration::from_millis));
        prop_assert!(limited >= plain);
        prop_assert!(limited <= Duration::from_millis(max_ms));
    }
}
