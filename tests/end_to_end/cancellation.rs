//! Shutdown reaching every kind of wait.

use super::{executor, HOST};
use outbound_executor::{AttemptError, OutboundConfig, OutboundError, Target};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn shutdown_releases_callers_queued_for_permits() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(2)
            .rate_limit_window(Duration::from_secs(60))
            .build(),
    );
    let target = Target::new(HOST, 80);

    for _ in 0..2 {
        exec.execute(&target, |_| async { Ok::<_, AttemptError>(()) })
            .await
            .unwrap();
    }
    assert_eq!(exec.rate_limiter().available_permits(), 0);

    let waiters: Vec<_> = (0..20)
        .map(|_| {
            let exec = exec.clone();
            let target = target.clone();
            tokio::spawn(async move {
                exec.execute(&target, |_| async { Ok::<_, AttemptError>(()) })
                    .await
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let start = Instant::now();
    exec.shutdown();

    for waiter in waiters {
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(OutboundError::Cancelled)));
    }
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(exec.metrics().sent, 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_token_can_be_shared_with_other_work() {
    let exec = executor(OutboundConfig::default());
    let token = exec.shutdown_token();

    let background = tokio::spawn(async move {
        token.cancelled().await;
        "stopped"
    });

    assert!(!exec.is_shutdown());
    exec.shutdown();
    assert!(exec.is_shutdown());
    assert_eq!(background.await.unwrap(), "stopped");
}

#[tokio::test(start_paused = true)]
async fn permit_timeout_is_reported_separately_from_shutdown() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(1)
            .rate_limit_window(Duration::from_secs(10))
            .rate_limit_acquire_timeout(Duration::from_millis(250))
            .build(),
    );
    let target = Target::new(HOST, 80);

    exec.execute(&target, |_| async { Ok::<_, AttemptError>(()) })
        .await
        .unwrap();
    let err = exec
        .execute(&target, |_| async { Ok::<_, AttemptError>(()) })
        .await
        .unwrap_err();

    match err {
        OutboundError::PermitTimeout(timeout) => assert_eq!(timeout, Duration::from_millis(250)),
        other => panic!("expected a permit timeout, got {other}"),
    }
    assert!(!exec.is_shutdown());
}
