//! Outbound TCP client
//!
//! Sends a line to a local echo server through a `RequestExecutor`, then
//! hammers a port nobody listens on until its circuit opens.
//!
//! Run with: cargo run --example tcp_client

use outbound_executor::{
    AttemptError, OutboundConfig, OutboundError, RequestExecutor, StaticResolver, Target,
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let echo_port = listener.local_addr()?.port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                let mut lines = BufReader::new(read).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if write.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    let resolver = StaticResolver::new()
        .with_entry("echo.local", IpAddr::V4(Ipv4Addr::LOCALHOST))
        .with_entry("dead.local", IpAddr::V4(Ipv4Addr::LOCALHOST));

    let config = OutboundConfig::builder()
        .name("demo")
        .rate_limit_capacity(20)
        .circuit_breaker_threshold(3)
        .circuit_breaker_open_duration(Duration::from_secs(5))
        .max_retries(2)
        .base_backoff_delay(Duration::from_millis(50))
        .operation_timeout(Duration::from_secs(2))
        .on_retry(|target, attempt, delay| {
            println!("  retry #{} for {} in {:?}", attempt + 1, target, delay);
        })
        .on_circuit_rejected(|target| println!("  circuit open for {}", target))
        .build();

    let executor = RequestExecutor::with_resolver(config, Arc::new(resolver))?;

    println!("--- echo ---");
    let echo = Target::new("echo.local", echo_port);
    let outcome = executor
        .execute(&echo, |addr| async move {
            let mut stream = TcpStream::connect(addr).await?;
            stream.write_all(b"hello\n").await?;
            let mut reply = String::new();
            BufReader::new(stream).read_line(&mut reply).await?;
            Ok::<_, AttemptError>(reply.trim_end().to_string())
        })
        .await?;
    println!("echoed {:?} after {} attempt(s)", outcome.value, outcome.attempts);

    println!("--- dead port ---");
    // Port 9 on loopback is closed on most machines.
    let dead = Target::new("dead.local", 9);
    for call in 1..=3 {
        let result = executor
            .execute(&dead, |addr| async move {
                TcpStream::connect(addr).await?;
                Ok::<_, AttemptError>(())
            })
            .await;
        match result {
            Ok(_) => println!("call {call}: connected"),
            Err(OutboundError::CircuitOpen { retry_after, .. }) => {
                println!("call {call}: rejected, retry after {retry_after:?}")
            }
            Err(err) => println!("call {call}: {err}"),
        }
    }

    println!("--- metrics ---");
    println!("{:#?}", executor.metrics());

    executor.shutdown();
    Ok(())
}
