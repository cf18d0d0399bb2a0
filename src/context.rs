//! Per-navigation context and handler chain
//!
//! Every dispatch builds one [`Context`]. It carries the navigation data
//! (cause, path, params, query, and on the server the host request and
//! response) and drives the route's handler chain through [`Context::next`].
//!
//! The chain is a small state machine: a private copy of the route's
//! handlers, a cursor, and a terminal continuation that runs exactly once,
//! when the last handler hands over (`advance` past the end) or when a
//! handler fails (`abort`).

use crate::error::HandlerFailure;
use crate::events::{EventKind, RouterEvent};
use crate::middleware::BoxedHandler;
use crate::params::{QueryParams, RouteParams};
use crate::route::RouteRef;
use crate::server::Body;
use crate::state::Router;
use crate::{debug_log, trace_log, warn_log};
use http::{Method, Request, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Cause
// ============================================================================

/// Why a navigation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cause {
    /// An HTTP request reached the server dispatcher
    HttpRequest,
    /// `navigate_to`, a history pop or an intercepted link
    Navigation,
    /// The browser router started with `auto_start`
    Startup,
}

impl Cause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::HttpRequest => "httpRequest",
            Cause::Navigation => "navigation",
            Cause::Startup => "startup",
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Continuation run when the chain settles
pub(crate) type Terminal<'a> = Box<dyn FnOnce(Option<HandlerFailure>) + 'a>;

/// Handler queue of a single dispatch
pub(crate) struct Chain<'a> {
    handlers: Vec<BoxedHandler>,
    cursor: usize,
    terminal: Option<Terminal<'a>>,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(handlers: &[BoxedHandler], terminal: Terminal<'a>) -> Self {
        Self {
            handlers: handlers.to_vec(),
            cursor: 0,
            terminal: Some(terminal),
        }
    }

    /// Pop the next handler, if any remain
    fn advance(&mut self) -> Option<BoxedHandler> {
        let handler = self.handlers.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(handler)
    }

    /// Take the terminal continuation; `None` once the chain has settled
    fn settle(&mut self) -> Option<Terminal<'a>> {
        self.terminal.take()
    }

    fn is_settled(&self) -> bool {
        self.terminal.is_none()
    }

    fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.cursor)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Navigation data that is not derived from the route itself
pub(crate) struct ContextInit<'a> {
    pub router: &'a Router,
    pub cause: Cause,
    pub path: String,
    pub full_path: String,
    pub method: Method,
    pub params: RouteParams,
    pub query: QueryParams,
    pub request: Option<&'a mut Request<Body>>,
    pub response: Option<&'a mut Response<Body>>,
}

/// The object every handler receives.
///
/// # Example
///
/// ```
/// use isoroute::{handler_fn, Router};
///
/// let mut router = Router::server();
/// router
///     .get(
///         "/hello/{name}",
///         [handler_fn(|cxt| {
///             let name = cxt.params().get("name").cloned().unwrap_or_default();
///             if let Some(response) = cxt.response_mut() {
///                 *response.body_mut() = format!("Hello, {}", name).into_bytes();
///             }
///             Ok(())
///         })],
///     )
///     .unwrap();
/// ```
pub struct Context<'a> {
    router: &'a Router,
    route: RouteRef,
    cause: Cause,
    path: String,
    full_path: String,
    method: Method,
    params: RouteParams,
    query: QueryParams,
    request: Option<&'a mut Request<Body>>,
    response: Option<&'a mut Response<Body>>,
    chain: Chain<'a>,
}

impl<'a> Context<'a> {
    /// Build a context over a shallow copy of `route`'s handler chain
    pub(crate) fn new(init: ContextInit<'a>, route: RouteRef, terminal: Terminal<'a>) -> Self {
        let chain = Chain::new(route.handlers(), terminal);
        Self {
            router: init.router,
            route,
            cause: init.cause,
            path: init.path,
            full_path: init.full_path,
            method: init.method,
            params: init.params,
            query: init.query,
            request: init.request,
            response: init.response,
            chain,
        }
    }

    /// Hand over to the next handler in the chain
    ///
    /// When no handler remains, `navigationComplete` is emitted and the
    /// dispatch finishes successfully. A handler that returns `Err` aborts
    /// the chain as if [`Context::fail`] had been called. Once the chain has
    /// settled this does nothing.
    pub fn next(&mut self) {
        if self.chain.is_settled() {
            trace_log!("next() on settled chain for '{}' ignored", self.path);
            return;
        }

        match self.chain.advance() {
            Some(handler) => {
                trace_log!(
                    "Running handler '{}' for '{}' ({} left)",
                    handler.name(),
                    self.path,
                    self.chain.remaining()
                );
                if let Err(error) = handler.handle(self) {
                    self.abort(HandlerFailure::from(error));
                }
            }
            None => self.complete(),
        }
    }

    /// Abort the chain with an error
    ///
    /// The remaining handlers are skipped and the failure is reported to the
    /// dispatcher right away.
    pub fn fail(&mut self, error: impl Into<anyhow::Error>) {
        self.abort(HandlerFailure::from(error.into()));
    }

    fn abort(&mut self, failure: HandlerFailure) {
        match self.chain.settle() {
            Some(terminal) => {
                warn_log!(
                    "Handler chain for {} '{}' failed: {}",
                    self.method,
                    self.path,
                    failure
                );
                terminal(Some(failure));
            }
            None => {
                warn_log!(
                    "Dropping failure raised after '{}' settled: {}",
                    self.path,
                    failure
                );
            }
        }
    }

    fn complete(&mut self) {
        let Some(terminal) = self.chain.settle() else {
            return;
        };

        debug_log!("Navigation to '{}' complete", self.path);
        self.router.emit(
            &RouterEvent::new(
                EventKind::NavigationComplete,
                self.router,
                &self.path,
                &self.method,
            )
            .with_cause(self.cause),
        );
        terminal(None);
    }

    /// Whether the chain already completed or failed
    pub fn is_settled(&self) -> bool {
        self.chain.is_settled()
    }

    /// Why this navigation happened
    pub fn cause(&self) -> Cause {
        self.cause
    }

    /// The matched path, without query string or fragment
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path including query string and fragment
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Request method; always `GET` in the browser
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Parameters captured by the route pattern
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut RouteParams {
        &mut self.params
    }

    /// Decoded query string
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryParams {
        &mut self.query
    }

    /// The host request (server only)
    pub fn request(&self) -> Option<&Request<Body>> {
        self.request.as_deref()
    }

    /// The host request (server only)
    pub fn request_mut(&mut self) -> Option<&mut Request<Body>> {
        self.request.as_deref_mut()
    }

    /// The host response (server only)
    pub fn response(&self) -> Option<&Response<Body>> {
        self.response.as_deref()
    }

    /// The host response (server only)
    pub fn response_mut(&mut self) -> Option<&mut Response<Body>> {
        self.response.as_deref_mut()
    }

    /// The router running this navigation
    pub fn router(&self) -> &'a Router {
        self.router
    }

    /// The route that matched
    pub fn route(&self) -> &RouteRef {
        &self.route
    }

    /// Whether this navigation runs against a browser host
    pub fn can_use_dom(&self) -> bool {
        self.router.platform().can_use_dom()
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cause", &self.cause)
            .field("path", &self.path)
            .field("full_path", &self.full_path)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("query", &self.query)
            .field("route", &self.route.path())
            .field("settled", &self.chain.is_settled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
