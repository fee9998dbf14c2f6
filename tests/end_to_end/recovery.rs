//! Circuits reopening and recovering after the open period.

use super::{executor, HOST};
use outbound_executor::{AttemptError, CircuitState, OutboundConfig, OutboundError, Target};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config() -> OutboundConfig {
    OutboundConfig::builder()
        .rate_limit_capacity(100)
        .circuit_breaker_threshold(2)
        .circuit_breaker_open_duration(Duration::from_secs(10))
        .max_retries(0)
        .build()
}

async fn fail(exec: &outbound_executor::RequestExecutor, target: &Target) -> OutboundError {
    exec.execute(target, |_| async {
        Err::<(), AttemptError>(io::Error::from(io::ErrorKind::ConnectionRefused).into())
    })
    .await
    .unwrap_err()
}

#[tokio::test(start_paused = true)]
async fn only_one_caller_runs_while_half_open() {
    let exec = executor(config());
    let target = Target::new(HOST, 9000);
    fail(&exec, &target).await;
    fail(&exec, &target).await;
    assert!(fail(&exec, &target).await.is_circuit_open());

    tokio::time::sleep(Duration::from_secs(10)).await;

    let trials = Arc::new(AtomicUsize::new(0));
    let callers: Vec<_> = (0..8)
        .map(|_| {
            let exec = exec.clone();
            let target = target.clone();
            let trials = Arc::clone(&trials);
            tokio::spawn(async move {
                exec.execute(&target, |_| {
                    trials.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok::<_, AttemptError>(())
                    }
                })
                .await
            })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for caller in callers {
        match caller.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) if err.is_circuit_open() => rejected += 1,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(trials.load(Ordering::SeqCst), 1);
    assert_eq!(admitted, 1);
    assert_eq!(rejected, 7);

    let breaker = exec.circuit_breakers().get(&target.authority());
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_half_open_call_reopens_for_a_full_period() {
    let exec = executor(config());
    let target = Target::new(HOST, 9001);
    fail(&exec, &target).await;
    fail(&exec, &target).await;
    assert_eq!(exec.metrics().circuit_trips, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let reopened = fail(&exec, &target).await;
    assert_eq!(reopened.attempts(), Some(1));
    assert_eq!(exec.metrics().circuit_trips, 2);

    let breaker = exec.circuit_breakers().get(&target.authority());
    assert_eq!(breaker.state(), CircuitState::Open);
    let remaining = breaker.remaining_open().unwrap();
    assert!(remaining > Duration::from_secs(9), "remaining {remaining:?}");

    match fail(&exec, &target).await {
        OutboundError::CircuitOpen { target: rejected, retry_after } => {
            assert_eq!(rejected, target.authority());
            assert!(retry_after.is_some());
        }
        other => panic!("expected an open circuit, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_half_open_call_frees_the_slot() {
    let exec = executor(config());
    let target = Target::new(HOST, 9002);
    fail(&exec, &target).await;
    fail(&exec, &target).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    // A half-open call that is dropped mid-flight never reports an outcome.
    let stuck = {
        let exec = exec.clone();
        let target = target.clone();
        tokio::spawn(async move {
            exec.execute(&target, |_| std::future::pending::<Result<(), AttemptError>>())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(fail(&exec, &target).await.is_circuit_open());

    stuck.abort();
    let _ = stuck.await;

    let outcome = exec
        .execute(&target, |_| async { Ok::<_, AttemptError>("recovered") })
        .await
        .unwrap();
    assert_eq!(outcome.value, "recovered");
    assert_eq!(
        exec.circuit_breakers().get(&target.authority()).state(),
        CircuitState::Closed
    );
}

#[tokio::test(start_paused = true)]
async fn slow_half_open_call_keeps_the_slot_past_the_open_period() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(100)
            .circuit_breaker_threshold(1)
            .circuit_breaker_open_duration(Duration::from_secs(10))
            .operation_timeout(Duration::from_secs(30))
            .max_retries(0)
            .build(),
    );
    let target = Target::new(HOST, 9003);
    fail(&exec, &target).await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    let started = Arc::new(AtomicUsize::new(0));
    let slow = {
        let exec = exec.clone();
        let target = target.clone();
        let started = Arc::clone(&started);
        tokio::spawn(async move {
            exec.execute(&target, |_| {
                started.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<(), AttemptError>>()
            })
            .await
        })
    };

    tokio::time::sleep(Duration::from_secs(11)).await;
    let late = exec
        .execute(&target, |_| {
            started.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, AttemptError>(()) }
        })
        .await;
    assert!(late.unwrap_err().is_circuit_open());
    assert_eq!(started.load(Ordering::SeqCst), 1);

    // The slow call times out, re-opening the circuit.
    let timed_out = slow.await.unwrap().unwrap_err();
    assert_eq!(timed_out.attempts(), Some(1));
    assert_eq!(
        exec.circuit_breakers().get(&target.authority()).state(),
        CircuitState::Open
    );
}
