//! Circuit breaker stress tests

use outbound_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Test: thousands of threads racing for the half-open probe
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_probe_race() {
    for round in 0..100 {
        let cb = Arc::new(CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(1)
                .open_duration(Duration::from_millis(1))
                .build(),
        ));
        cb.record_failure();
        tokio::time::sleep(Duration::from_millis(2)).await;

        let probes = Arc::new(AtomicUsize::new(0));
        let racers: Vec<_> = (0..64)
            .map(|_| {
                let cb = Arc::clone(&cb);
                let probes = Arc::clone(&probes);
                tokio::spawn(async move {
                    if cb.allow() {
                        probes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for racer in racers {
            racer.await.unwrap();
        }

        assert_eq!(probes.load(Ordering::SeqCst), 1, "round {round}");
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }
}

/// Test: a million state reads while another task flips the circuit
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_state_reads_during_transitions() {
    let cb = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .failure_threshold(1)
            .build(),
    ));

    let flipper = {
        let cb = Arc::clone(&cb);
        tokio::spawn(async move {
            for _ in 0..100_000 {
                cb.force_open();
                cb.reset();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cb = Arc::clone(&cb);
            tokio::spawn(async move {
                for _ in 0..250_000 {
                    let state = cb.state();
                    assert_ne!(state, CircuitState::HalfOpen);
                }
            })
        })
        .collect();

    flipper.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(cb.state(), CircuitState::Closed);
}
