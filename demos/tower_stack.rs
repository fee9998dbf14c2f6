//! Outbound requests as a Tower service
//!
//! Wraps a plain "connect and write" transport with `OutboundLayer` and
//! drives it with `ServiceExt::oneshot`.
//!
//! Run with: cargo run --example tower_stack

use outbound_executor::{
    Attempt, OutboundConfig, OutboundLayer, Request, RequestExecutor, StaticResolver, Target,
};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::{service_fn, Layer, ServiceExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Counts the bytes of every connection it accepts and writes the count back.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                if stream.read_to_end(&mut buf).await.is_ok() {
                    let _ = stream.write_all(&(buf.len() as u64).to_be_bytes()).await;
                }
            });
        }
    });

    let executor = RequestExecutor::with_resolver(
        OutboundConfig::builder()
            .name("tower-demo")
            .operation_timeout(Duration::from_secs(1))
            .build(),
        Arc::new(StaticResolver::new().with_entry("counter.local", IpAddr::V4(Ipv4Addr::LOCALHOST))),
    )?;

    let transport = service_fn(|attempt: Attempt<Vec<u8>>| async move {
        let mut stream = TcpStream::connect(attempt.address).await?;
        stream.write_all(&attempt.payload).await?;
        stream.shutdown().await?;
        let mut reply = [0u8; 8];
        stream.read_exact(&mut reply).await?;
        Ok::<_, std::io::Error>(u64::from_be_bytes(reply))
    });

    let service = OutboundLayer::new(executor.clone()).layer(transport);
    let target = Target::new("counter.local", port);

    for payload in ["a", "hello", "hello, world"] {
        let counted = service
            .clone()
            .oneshot(Request::new(target.clone(), payload.as_bytes().to_vec()))
            .await?;
        println!("{payload:?} -> {counted} bytes");
    }

    println!("{:?}", executor.metrics());
    executor.shutdown();
    Ok(())
}
