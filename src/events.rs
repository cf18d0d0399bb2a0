//! Navigation lifecycle events
//!
//! The router owns an [`EventEmitter`] and exposes `bind`/`unbind` through
//! its own API. Four events exist:
//!
//! | Event                | Payload                          |
//! |----------------------|----------------------------------|
//! | `navigating`         | path, method, cause, router      |
//! | `navigationComplete` | path, method, cause, router      |
//! | `notFound`           | path, method, router             |
//! | `error`              | path, method, router, error      |
//!
//! Listeners run synchronously, in the order they were bound.

use crate::context::Cause;
use crate::error::HandlerFailure;
use crate::state::Router;
use http::Method;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The events a router emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A route was found and its handler chain is being run
    Navigating,
    /// Every handler in the chain ran and called `next`
    NavigationComplete,
    /// No route matched the method and path
    NotFound,
    /// The handler chain was aborted by a failure
    Error,
}

impl EventKind {
    /// All event kinds
    pub const ALL: [EventKind; 4] = [
        EventKind::Navigating,
        EventKind::NavigationComplete,
        EventKind::NotFound,
        EventKind::Error,
    ];

    /// The event name as used by `bind`
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Navigating => "navigating",
            EventKind::NavigationComplete => "navigationComplete",
            EventKind::NotFound => "notFound",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown router event '{}'", s))
    }
}

/// Payload delivered to listeners
pub struct RouterEvent<'r> {
    /// Which event this is
    pub kind: EventKind,
    /// Path of the navigation (the full URL for `notFound` on the server)
    pub path: String,
    /// Request method (`GET` for browser navigations)
    pub method: Method,
    /// Why the navigation happened; absent for `notFound` and `error`
    pub cause: Option<Cause>,
    /// The router that emitted the event
    pub router: &'r Router,
    /// The failure, for `error` events
    pub error: Option<HandlerFailure>,
}

impl<'r> RouterEvent<'r> {
    pub(crate) fn new(kind: EventKind, router: &'r Router, path: &str, method: &Method) -> Self {
        Self {
            kind,
            path: path.to_string(),
            method: method.clone(),
            cause: None,
            router,
            error: None,
        }
    }

    pub(crate) fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub(crate) fn with_error(mut self, error: HandlerFailure) -> Self {
        self.error = Some(error);
        self
    }
}

impl fmt::Debug for RouterEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterEvent")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("cause", &self.cause)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// A bound event listener
pub type Listener = Arc<dyn Fn(&RouterEvent<'_>) + Send + Sync>;

/// Handle returned by `bind`, used to `unbind` the listener later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    listeners: HashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

/// Minimal publish/subscribe over [`EventKind`]
#[derive(Default)]
pub struct EventEmitter {
    registry: RwLock<Registry>,
}

impl EventEmitter {
    /// Create an emitter with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener for `kind`
    pub fn bind<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&RouterEvent<'_>) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns `false` if it was not bound to `kind`
    pub fn unbind(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut registry = self.registry.write();
        let Some(listeners) = registry.listeners.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(bound, _)| *bound != id);
        listeners.len() != before
    }

    /// Invoke every listener bound to `event.kind`, in bind order
    ///
    /// The listener list is copied before the first call, so listeners may
    /// bind or unbind without affecting the event in flight.
    pub fn trigger(&self, event: &RouterEvent<'_>) {
        let listeners: Vec<Listener> = {
            let registry = self.registry.read();
            match registry.listeners.get(&event.kind) {
                Some(listeners) => listeners
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect(),
                None => return,
            }
        };

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of listeners bound to `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .listeners
            .get(&kind)
            .map_or(0, |listeners| listeners.len())
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.read();
        let mut counts: Vec<(&'static str, usize)> = registry
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind.as_str(), listeners.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
