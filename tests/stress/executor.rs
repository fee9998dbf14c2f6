//! Executor stress tests

use outbound_executor::{AttemptError, OutboundConfig, RequestExecutor, StaticResolver, Target};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn executor(config: OutboundConfig) -> RequestExecutor {
    RequestExecutor::with_resolver(
        config,
        Arc::new(StaticResolver::new().with_entry("stress.internal", IpAddr::V4(Ipv4Addr::LOCALHOST))),
    )
    .unwrap()
}

/// Test: 200k successful calls from 8 worker tasks
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_high_volume_successes() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(1_000_000)
            .build(),
    );
    let target = Target::new("stress.internal", 80);
    let start = Instant::now();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let exec = exec.clone();
            let target = target.clone();
            tokio::spawn(async move {
                for _ in 0..25_000 {
                    exec.execute(&target, |_| async { Ok::<_, AttemptError>(()) })
                        .await
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.await.unwrap();
    }

    let elapsed = start.elapsed();
    println!("200k calls completed in {:?}", elapsed);
    println!("Throughput: {:.0} calls/sec", 200_000.0 / elapsed.as_secs_f64());

    let metrics = exec.metrics();
    assert_eq!(metrics.sent, 200_000);
    assert_eq!(metrics.succeeded, 200_000);
    assert_eq!(metrics.cache_hits + metrics.cache_misses, 200_000);
}

/// Test: counters stay consistent with a mix of outcomes under contention
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_mixed_outcomes_keep_counters_consistent() {
    let exec = executor(
        OutboundConfig::builder()
            .rate_limit_capacity(1_000_000)
            .circuit_breaker_threshold(u32::MAX)
            .base_backoff_delay(Duration::ZERO)
            .max_retries(2)
            .build(),
    );

    let callers: Vec<_> = (0..5_000u32)
        .map(|i| {
            let exec = exec.clone();
            let target = Target::new("stress.internal", 1000 + (i % 16) as u16);
            tokio::spawn(async move {
                let mut attempt = 0;
                exec.execute(&target, move |_| {
                    attempt += 1;
                    let fail = (i + attempt) % 3 == 0;
                    async move {
                        if fail {
                            Err(AttemptError::from(io::Error::from(io::ErrorKind::ConnectionReset)))
                        } else {
                            Ok(())
                        }
                    }
                })
                .await
            })
        })
        .collect();

    let mut ok = 0u64;
    for caller in callers {
        if caller.await.unwrap().is_ok() {
            ok += 1;
        }
    }

    let metrics = exec.metrics();
    assert_eq!(metrics.succeeded, ok);
    assert_eq!(metrics.sent, metrics.succeeded + metrics.failed);
    assert_eq!(exec.circuit_breakers().len(), 16);
}
