//! Tower integration.

use crate::error::{AttemptError, OutboundError};
use crate::executor::RequestExecutor;
use crate::target::Target;
use futures::future::BoxFuture;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// A request for an [`Outbound`] service: where to send it and what to send.
#[derive(Debug, Clone)]
pub struct Request<R> {
    pub target: Target,
    pub payload: R,
}

impl<R> Request<R> {
    pub fn new(target: Target, payload: R) -> Self {
        Self { target, payload }
    }
}

/// What the wrapped transport service receives for each attempt.
#[derive(Debug, Clone)]
pub struct Attempt<R> {
    pub target: Target,
    /// Resolved address for this attempt.
    pub address: SocketAddr,
    pub payload: R,
}

/// A Tower layer that runs every call of the wrapped transport through a
/// [`RequestExecutor`].
///
/// The wrapped service handles a single [`Attempt`]; the resulting
/// [`Outbound`] service accepts a [`Request`] and takes care of rate limiting,
/// the target's circuit, resolution and retries.
///
/// # Example
///
/// ```rust,no_run
/// use outbound_executor::{Attempt, OutboundConfig, OutboundLayer, Request, RequestExecutor, Target};
/// use tower::{service_fn, Layer, ServiceExt};
///
/// # async fn example() {
/// let executor = RequestExecutor::new(OutboundConfig::default()).unwrap();
/// let transport = service_fn(|attempt: Attempt<Vec<u8>>| async move {
///     Ok::<_, std::io::Error>(attempt.payload.len())
/// });
///
/// let service = OutboundLayer::new(executor).layer(transport);
/// let written = service
///     .oneshot(Request::new(Target::new("example.com", 443), b"ping".to_vec()))
///     .await
///     .unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct OutboundLayer {
    executor: RequestExecutor,
}

impl OutboundLayer {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }
}

impl<S> Layer<S> for OutboundLayer {
    type Service = Outbound<S>;

    fn layer(&self, service: S) -> Self::Service {
        Outbound {
            inner: service,
            executor: self.executor.clone(),
        }
    }
}

/// Service produced by [`OutboundLayer`].
#[derive(Clone)]
pub struct Outbound<S> {
    inner: S,
    executor: RequestExecutor,
}

impl<S> Outbound<S> {
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }
}

impl<S, R> Service<Request<R>> for Outbound<S>
where
    S: Service<Attempt<R>> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send + 'static,
    S::Error: Into<AttemptError>,
    R: Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = OutboundError;
    type Future = BoxFuture<'static, Result<S::Response, OutboundError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the transport is awaited per attempt.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<R>) -> Self::Future {
        let executor = self.executor.clone();
        let inner = self.inner.clone();

        Box::pin(async move {
            let Request { target, payload } = req;
            let attempt_target = target.clone();
            let operation = move |address: SocketAddr| {
                let attempt = Attempt {
                    target: attempt_target.clone(),
                    address,
                    payload: payload.clone(),
                };
                let svc = inner.clone();
                async move { svc.oneshot(attempt).await.map_err(Into::<AttemptError>::into) }
            };

            executor
                .execute(&target, operation)
                .await
                .map(|outcome| outcome.into_inner())
        })
    }
}
