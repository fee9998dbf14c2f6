//! Callbacks fired by the resolver cache, the rate limiter, the circuit
//! breakers and the executor.
//!
//! Each component defines one event enum and keeps an [`EventListeners`]
//! for it, filled from the `on_*` methods of its config builder. Events are
//! delivered synchronously on the task that caused them, so listeners should
//! hand heavy work off elsewhere.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::time::Instant;

/// An event emitted by one of the outbound components.
///
/// `source` is the name the component was configured with. Components built
/// by an executor are named after it (`"billing.resolver"`,
/// `"billing.ratelimiter"`), while circuit breakers take the `host:port` they
/// guard.
pub trait OutboundEvent: Send + Sync + fmt::Debug {
    /// Stable snake_case name, e.g. `"cache_miss"` or `"retry_scheduled"`.
    fn event_type(&self) -> &'static str;

    /// Tokio clock reading taken when the event was produced. Follows a
    /// paused test clock.
    fn timestamp(&self) -> Instant;

    fn source(&self) -> &str;

    /// Host or `host:port` the event is about. `None` for events concerning
    /// state shared by every target, like the rate limiter's permit pool.
    fn subject(&self) -> Option<&str> {
        None
    }
}

/// Receives events of a single type.
pub trait EventListener<E: OutboundEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

pub type SharedListener<E> = Arc<dyn EventListener<E>>;

/// Listeners registered on one component, called in registration order.
///
/// Cloning is cheap; clones share the listeners.
pub struct EventListeners<E: OutboundEvent> {
    listeners: Vec<SharedListener<E>>,
}

impl<E: OutboundEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E: OutboundEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener.
    ///
    /// A panic inside a listener is contained so the component that emitted
    /// the event keeps serving calls. Returns how many listeners panicked.
    pub fn emit(&self, event: &E) -> usize {
        self.listeners
            .iter()
            .filter(|listener| {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    listener.on_event(event);
                }))
                .is_err()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: OutboundEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: OutboundEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Adapts a closure into an [`EventListener`]. This is what the `on_*`
/// builder methods register.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: OutboundEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
