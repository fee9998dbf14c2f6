//! Backends that perform a real (uncached) resolution.

use crate::ResolveError;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::net::IpAddr;

/// Performs one uncached hostname lookup.
///
/// Implementations return the single address the caller should connect to.
pub trait Resolve: Send + Sync + 'static {
    /// Resolves `host` to an address.
    fn resolve(&self, host: &str) -> BoxFuture<'static, Result<IpAddr, ResolveError>>;
}

/// Resolves through the operating system via [`tokio::net::lookup_host`].
///
/// The first address returned by the system is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str) -> BoxFuture<'static, Result<IpAddr, ResolveError>> {
        let host = host.to_owned();
        Box::pin(async move {
            let mut addrs = tokio::net::lookup_host((host.as_str(), 0))
                .await
                .map_err(|error| ResolveError::Lookup {
                    host: host.clone(),
                    error,
                })?;
            let first = addrs.next().map(|addr| addr.ip());
            drop(addrs);
            first.ok_or(ResolveError::NoAddress { host })
        })
    }
}

/// Resolves from a fixed table. Unknown hosts fail with [`ResolveError::NoAddress`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, IpAddr>,
}

impl StaticResolver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub fn with_entry(mut self, host: impl Into<String>, addr: IpAddr) -> Self {
        self.table.insert(host.into(), addr);
        self
    }
}

impl Resolve for StaticResolver {
    fn resolve(&self, host: &str) -> BoxFuture<'static, Result<IpAddr, ResolveError>> {
        let result = self
            .table
            .get(host)
            .copied()
            .ok_or_else(|| ResolveError::NoAddress {
                host: host.to_owned(),
            });
        Box::pin(async move { result })
    }
}

/// Resolves by calling a closure.
pub struct FnResolver<F> {
    f: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&str) -> Result<IpAddr, ResolveError> + Send + Sync + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Resolve for FnResolver<F>
where
    F: Fn(&str) -> Result<IpAddr, ResolveError> + Send + Sync + 'static,
{
    fn resolve(&self, host: &str) -> BoxFuture<'static, Result<IpAddr, ResolveError>> {
        let result = (self.f)(host);
        Box::pin(async move { result })
    }
}
