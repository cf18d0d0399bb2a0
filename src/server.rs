//! Server-side dispatch
//!
//! On a server the router behaves like a piece of HTTP middleware: it gets
//! the host's request, response and `next` continuation. Requests without a
//! matching route are passed on with `next(None)`; a failing handler chain
//! is passed on with `next(Some(failure))`. A chain that finishes normally
//! owns the response and `next` is never called.

use crate::context::{Cause, Context, ContextInit, Terminal};
use crate::error::HandlerFailure;
use crate::events::{EventKind, RouterEvent};
use crate::params::{QueryParams, RouteParams};
use crate::state::Router;
use crate::{debug_log, trace_log};
use http::{Request, Response};

/// Body type of the requests and responses the router dispatches
pub type Body = Vec<u8>;

/// Access to the values the router attaches to a matched request
pub trait RequestExt {
    /// Parameters captured by the route pattern
    fn route_params(&self) -> Option<&RouteParams>;

    /// Decoded query string
    fn query_params(&self) -> Option<&QueryParams>;
}

impl<B> RequestExt for Request<B> {
    fn route_params(&self) -> Option<&RouteParams> {
        self.extensions().get::<RouteParams>()
    }

    fn query_params(&self) -> Option<&QueryParams> {
        self.extensions().get::<QueryParams>()
    }
}

impl Router {
    /// Dispatch one HTTP request
    ///
    /// `navigating` is emitted before the first handler runs. `next` is
    /// called with `None` when no route matches and with the failure when
    /// the chain aborts; the `error` event follows the call.
    pub fn dispatch_request<'a, N>(
        &'a self,
        request: &'a mut Request<Body>,
        response: &'a mut Response<Body>,
        next: N,
    ) where
        N: FnOnce(Option<HandlerFailure>) + 'a,
    {
        let method = request.method().clone();
        let uri = request.uri();
        let path = uri.path().to_string();
        let full_path = uri
            .path_and_query()
            .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());
        let query = QueryParams::parse(uri.query().unwrap_or_default());

        let Some(found) = self.routes().find_by_path(&path, &method) else {
            debug_log!("No route for {} '{}'", method, full_path);
            self.emit(&RouterEvent::new(
                EventKind::NotFound,
                self,
                &full_path,
                &method,
            ));
            next(None);
            return;
        };

        request.extensions_mut().insert(found.params.clone());
        request.extensions_mut().insert(query.clone());

        let error_path = full_path.clone();
        let error_method = method.clone();
        let terminal: Terminal<'a> = Box::new(move |failure| {
            let Some(failure) = failure else {
                trace_log!("Chain for '{}' finished, response owned by route", error_path);
                return;
            };
            next(Some(failure.clone()));
            self.emit(
                &RouterEvent::new(EventKind::Error, self, &error_path, &error_method)
                    .with_error(failure),
            );
        });

        let mut cxt = Context::new(
            ContextInit {
                router: self,
                cause: Cause::HttpRequest,
                path: path.clone(),
                full_path,
                method: method.clone(),
                params: found.params,
                query,
                request: Some(request),
                response: Some(response),
            },
            found.route,
            terminal,
        );

        debug_log!("Dispatching {} '{}'", method, path);
        self.emit(
            &RouterEvent::new(EventKind::Navigating, self, &path, &method)
                .with_cause(Cause::HttpRequest),
        );

        cxt.next();
    }
}

/// What happened to a request handed to [`ServerDispatcher::serve`]
#[derive(Debug)]
pub enum Outcome {
    /// A route handled the request
    Handled(Response<Body>),
    /// The request was passed on: `None` when no route matched, the failure
    /// when the handler chain aborted
    Next(Option<HandlerFailure>),
}

/// The router bound as HTTP middleware, returned by `start()` on a server
///
/// # Example
///
/// ```
/// use isoroute::{handler_fn, Outcome, Router, StartOptions};
///
/// let mut router = Router::server();
/// router
///     .get("/", [handler_fn(|cxt| {
///         if let Some(response) = cxt.response_mut() {
///             *response.body_mut() = b"home".to_vec();
///         }
///         Ok(())
///     })])
///     .unwrap();
///
/// let dispatcher = router.start(StartOptions::default()).unwrap();
/// let request = http::Request::get("/").body(Vec::new()).unwrap();
///
/// match dispatcher.serve(request) {
///     Outcome::Handled(response) => assert_eq!(response.body(), b"home"),
///     Outcome::Next(_) => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServerDispatcher<'r> {
    router: &'r Router,
}

impl<'r> ServerDispatcher<'r> {
    pub(crate) fn new(router: &'r Router) -> Self {
        Self { router }
    }

    /// The `(request, response, next)` middleware entry point
    pub fn dispatch<'a, N>(
        &'a self,
        request: &'a mut Request<Body>,
        response: &'a mut Response<Body>,
        next: N,
    ) where
        N: FnOnce(Option<HandlerFailure>) + 'a,
    {
        self.router.dispatch_request(request, response, next);
    }

    /// Dispatch an owned request against a fresh `200 OK` response
    pub fn serve(&self, mut request: Request<Body>) -> Outcome {
        let mut response = Response::new(Body::new());
        let mut passed = None;
        self.router
            .dispatch_request(&mut request, &mut response, |failure| {
                passed = Some(failure);
            });

        match passed {
            Some(failure) => Outcome::Next(failure),
            None => Outcome::Handled(response),
        }
    }

    pub fn router(&self) -> &'r Router {
        self.router
    }
}
