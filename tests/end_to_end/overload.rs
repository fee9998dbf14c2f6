//! Many callers against a host that never answers.

use super::{executor, HOST};
use outbound_executor::{AttemptError, CircuitState, OutboundConfig, OutboundError, Target};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn refused() -> AttemptError {
    io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused").into()
}

#[tokio::test(start_paused = true)]
async fn failing_host_trips_circuit_and_sheds_load() {
    let exec = executor(
        OutboundConfig::builder()
            .name("overload")
            .dns_cache_ttl(Duration::from_secs(2))
            .rate_limit_capacity(10)
            .rate_limit_window(Duration::from_secs(1))
            .circuit_breaker_threshold(5)
            .circuit_breaker_open_duration(Duration::from_secs(30))
            .max_retries(3)
            .build(),
    );
    let target = Target::new(HOST, 443);
    let operations = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..200)
        .map(|_| {
            let exec = exec.clone();
            let target = target.clone();
            let operations = Arc::clone(&operations);
            tokio::spawn(async move {
                exec.execute(&target, |_| {
                    operations.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(refused()) }
                })
                .await
            })
        })
        .collect();

    let results = tokio::time::timeout(Duration::from_secs(60), futures::future::join_all(handles))
        .await
        .expect("a caller was left blocked");

    let mut circuit_open = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => panic!("the host never succeeds"),
            Err(OutboundError::CircuitOpen { .. }) => circuit_open += 1,
            Err(err) => assert!(err.attempts().is_some(), "unexpected error: {err}"),
        }
    }

    let metrics = exec.metrics();
    assert!(metrics.circuit_trips >= 1);
    assert_eq!(metrics.succeeded, 0);
    assert_eq!(metrics.sent, metrics.failed);
    assert_eq!(metrics.sent as usize, operations.load(Ordering::SeqCst));

    // Only the calls that ran before the circuit opened reached the host.
    assert!(operations.load(Ordering::SeqCst) <= 10 * 4);
    assert!(circuit_open >= 190, "only {circuit_open} calls were shed");

    // 190 callers queue behind the first window at 10 permits per second.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(18), "finished after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(30), "finished after {elapsed:?}");

    let breaker = exec.circuit_breakers().find(&target.authority()).unwrap();
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn circuits_are_isolated_per_target() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(100)
            .circuit_breaker_threshold(2)
            .max_retries(0)
            .build(),
    );
    let broken = Target::new(HOST, 1);
    let healthy = Target::new(HOST, 2);

    for _ in 0..2 {
        let _ = exec
            .execute(&broken, |_| async { Err::<(), _>(refused()) })
            .await;
    }

    let rejected = exec
        .execute(&broken, |_| async { Ok::<_, AttemptError>(()) })
        .await;
    assert!(rejected.unwrap_err().is_circuit_open());

    let outcome = exec
        .execute(&healthy, |_| async { Ok::<_, AttemptError>("fine") })
        .await
        .unwrap();
    assert_eq!(outcome.value, "fine");
    assert_eq!(exec.circuit_breakers().len(), 2);

    // Both targets share the host, so the address came from one cache entry.
    assert_eq!(exec.resolver().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_successes_share_the_cache() {
    let exec = executor(OutboundConfig::builder().rate_limit_capacity(50).build());
    let target = Target::new(HOST, 80);

    let calls = (0..50).map(|i| {
        let exec = exec.clone();
        let target = target.clone();
        async move {
            exec.execute(&target, move |addr| async move {
                Ok::<_, AttemptError>((i, addr))
            })
            .await
        }
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        let outcome = result.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.value.1.port(), 80);
    }

    let metrics = exec.metrics();
    assert_eq!(metrics.sent, 50);
    assert_eq!(metrics.succeeded, 50);
    assert_eq!(metrics.cache_hits + metrics.cache_misses, 50);
    assert!(metrics.cache_misses >= 1);
}
