//! Event callbacks registered on the executor configuration.

use super::{executor, HOST};
use outbound_executor::{AttemptError, OutboundConfig, Target};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::test(start_paused = true)]
async fn callbacks_follow_a_call_through_retries() {
    let _guard = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .finish()
        .set_default();

    let log = Arc::new(Mutex::new(Vec::new()));
    let config = {
        let (retry, success, exhausted, rejected) =
            (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        OutboundConfig::builder()
            .name("listeners")
            .circuit_breaker_threshold(3)
            .max_retries(1)
            .on_retry(move |target, attempt, delay| {
                retry
                    .lock()
                    .unwrap()
                    .push(format!("retry {target} #{attempt} {delay:?}"));
            })
            .on_success(move |target, attempts| {
                success
                    .lock()
                    .unwrap()
                    .push(format!("success {target} after {attempts}"));
            })
            .on_exhausted(move |target, attempts| {
                exhausted
                    .lock()
                    .unwrap()
                    .push(format!("exhausted {target} after {attempts}"));
            })
            .on_circuit_rejected(move |target| {
                rejected.lock().unwrap().push(format!("rejected {target}"));
            })
            .build()
    };
    let exec = executor(config);
    let target = Target::new(HOST, 7000);
    let refused = || AttemptError::from(io::Error::from(io::ErrorKind::ConnectionRefused));

    let mut first = true;
    exec.execute(&target, |_| {
        let fail = std::mem::take(&mut first);
        async move { if fail { Err(refused()) } else { Ok(()) } }
    })
    .await
    .unwrap();

    let _ = exec
        .execute(&target, |_| async { Err::<(), _>(refused()) })
        .await;
    let _ = exec
        .execute(&target, |_| async { Err::<(), _>(refused()) })
        .await;

    let log = log.lock().unwrap().clone();
    assert_eq!(
        log,
        vec![
            format!("retry {HOST}:7000 #0 {:?}", Duration::from_millis(100)),
            format!("success {HOST}:7000 after 2"),
            format!("retry {HOST}:7000 #0 {:?}", Duration::from_millis(100)),
            format!("exhausted {HOST}:7000 after 2"),
            // The third failure opens the circuit, so the retry is turned away.
            format!("retry {HOST}:7000 #0 {:?}", Duration::from_millis(100)),
            format!("rejected {HOST}:7000"),
        ]
    );
}
