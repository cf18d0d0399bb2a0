//! Client-side dispatch
//!
//! On a browser host every navigation is a `GET`. A navigation resolves its
//! route, records a history entry (`replaceState` when the pathname does not
//! change, `pushState` otherwise), runs the handler chain and then emits
//! `navigating`. Note the order: on the server `navigating` comes before the
//! first handler, here it comes after the chain has run.
//!
//! There is no host continuation in the browser, so a failing chain only
//! produces an `error` event.

use crate::context::{Cause, Context, ContextInit, Terminal};
use crate::events::{EventKind, RouterEvent};
use crate::history::{HistoryState, PopStateEvent};
use crate::params::{QueryParams, RouteParams};
use crate::platform::{ClickEvent, HostListener};
use crate::route::RouteRef;
use crate::state::Router;
use crate::{debug_log, trace_log, warn_log};
use http::Method;
use url::Url;

/// Extra inputs for [`Router::navigate`]
///
/// # Example
///
/// ```
/// use isoroute::{NavigateOptions, QueryParams, RouteParams};
///
/// let options = NavigateOptions::new()
///     .params(RouteParams::new().with("id", "42"))
///     .query(QueryParams::new().with("tab", "posts"))
///     .hash("top");
/// assert_eq!(options.hash.as_deref(), Some("top"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Query string for named targets; replaces the parsed query otherwise
    pub query: Option<QueryParams>,
    /// Parameters for named targets; replaces the matched params otherwise
    pub params: Option<RouteParams>,
    /// Fragment appended to named targets
    pub hash: Option<String>,
    /// Defaults to [`Cause::Navigation`]
    pub cause: Option<Cause>,
}

impl NavigateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    pub fn params(mut self, params: RouteParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// A navigation target resolved to a route
struct Resolved {
    /// URL handed to the history API
    href: String,
    url: Url,
    route: RouteRef,
    params: RouteParams,
}

/// `true` when `target` is a path rather than a route name
fn is_path(target: &str) -> bool {
    target.contains('/')
}

/// Pathname, query string and fragment of `url`
fn full_path(url: &Url) -> String {
    let mut full = url.path().to_string();
    if let Some(query) = url.query() {
        full.push('?');
        full.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        full.push('#');
        full.push_str(fragment);
    }
    full
}

impl Router {
    /// Navigate to a path (`/users/42?tab=posts`) or a route name
    ///
    /// Returns `true` when a route was found and its chain started. Does
    /// nothing on a server router.
    pub fn navigate_to(&self, target: &str) -> bool {
        self.navigate(target, NavigateOptions::default())
    }

    /// Navigate with explicit query, params, hash or cause
    ///
    /// For a route name the URL is rebuilt from the route pattern, the given
    /// params and query, and the hash.
    pub fn navigate(&self, target: &str, options: NavigateOptions) -> bool {
        let Some(location) = self.platform().with_host(|host| host.location()) else {
            warn_log!("navigate('{}') ignored: router is not browser-hosted", target);
            return false;
        };

        let location = match Url::parse(&location) {
            Ok(location) => location,
            Err(_e) => {
                warn_log!("Host location '{}' is not a valid URL: {}", location, _e);
                self.emit_not_found(target);
                return false;
            }
        };

        let Some(resolved) = self.resolve_target(&location, target, &options) else {
            debug_log!("No client route for '{}'", target);
            self.emit_not_found(target);
            return false;
        };

        self.run_navigation(&location, resolved, options);
        true
    }

    fn resolve_target(
        &self,
        location: &Url,
        target: &str,
        options: &NavigateOptions,
    ) -> Option<Resolved> {
        if is_path(target) {
            let url = location.join(target).ok()?;
            let found = self.routes().find_by_path(url.path(), &Method::GET)?;
            return Some(Resolved {
                href: target.to_string(),
                url,
                route: found.route,
                params: found.params,
            });
        }

        let route = self.routes().find_by_name(target, &Method::GET)?.clone();
        let params = options.params.clone().unwrap_or_default();

        let mut href = route.url_for(&params)?;
        if let Some(query) = options.query.as_ref().filter(|query| !query.is_empty()) {
            href.push('?');
            href.push_str(&query.to_query_string());
        }
        if let Some(hash) = options.hash.as_deref().filter(|hash| !hash.is_empty()) {
            href.push('#');
            href.push_str(hash.trim_start_matches('#'));
        }

        let url = location.join(&href).ok()?;
        let params = route.matches(url.path()).unwrap_or(params);
        Some(Resolved {
            href,
            url,
            route,
            params,
        })
    }

    fn run_navigation(&self, location: &Url, resolved: Resolved, options: NavigateOptions) {
        let method = Method::GET;
        let cause = options.cause.unwrap_or(Cause::Navigation);
        let path = resolved.url.path().to_string();
        let params = options.params.unwrap_or(resolved.params);
        let query = options
            .query
            .unwrap_or_else(|| QueryParams::parse(resolved.url.query().unwrap_or_default()));

        let state = HistoryState {
            full_path: full_path(&resolved.url),
            path: path.clone(),
            params: params.clone(),
            query: query.clone(),
            cause,
        };

        let error_path = path.clone();
        let terminal: Terminal<'_> = Box::new(move |failure| {
            if let Some(failure) = failure {
                self.emit(
                    &RouterEvent::new(EventKind::Error, self, &error_path, &Method::GET)
                        .with_error(failure),
                );
            }
        });

        let mut cxt = Context::new(
            ContextInit {
                router: self,
                cause,
                path: path.clone(),
                full_path: state.full_path.clone(),
                method: method.clone(),
                params,
                query,
                request: None,
                response: None,
            },
            resolved.route,
            terminal,
        );

        let replace = location.path() == path;
        self.platform().with_host(|host| {
            if replace {
                host.replace_state(&state, &resolved.href);
            } else {
                host.push_state(&state, &resolved.href);
            }
        });

        debug_log!(
            "Navigating to '{}' ({}, {})",
            state.full_path,
            cause,
            if replace { "replace" } else { "push" }
        );
        cxt.next();

        self.emit(
            &RouterEvent::new(EventKind::Navigating, self, &path, &method).with_cause(cause),
        );
    }

    fn emit_not_found(&self, target: &str) {
        self.emit(&RouterEvent::new(EventKind::NotFound, self, target, &Method::GET));
    }

    /// Replay a history entry after back/forward
    ///
    /// The stored full path is navigated to again with the stored cause,
    /// params and query. An entry without state navigates to the host's
    /// current location. Ignored unless the router is started.
    pub fn handle_pop_state(&self, event: &PopStateEvent) -> bool {
        if !self.is_listening(HostListener::PopState) {
            trace_log!("popstate ignored: listener not attached");
            return false;
        }

        match &event.state {
            Some(state) => self.navigate(
                &state.full_path,
                NavigateOptions {
                    query: Some(state.query.clone()),
                    params: Some(state.params.clone()),
                    hash: None,
                    cause: Some(state.cause),
                },
            ),
            None => {
                let Some(href) = self.platform().with_host(|host| host.location()) else {
                    return false;
                };
                self.navigate_to(&href)
            }
        }
    }

    /// Intercept a document click on a same-origin link
    ///
    /// Returns `true` when the click was turned into a navigation; the
    /// event's default action is then prevented.
    pub fn handle_click(&self, event: &mut ClickEvent) -> bool {
        if !self.is_listening(HostListener::Click) {
            return false;
        }
        if event.default_prevented || event.is_modified() || event.button != 0 {
            return false;
        }

        let Some(anchor) = &event.anchor else {
            return false;
        };
        if !anchor.opens_in_place() || anchor.download || anchor.opt_out {
            return false;
        }

        let Some(location) = self
            .platform()
            .with_host(|host| host.location())
            .and_then(|location| Url::parse(&location).ok())
        else {
            return false;
        };
        let Ok(href) = location.join(&anchor.href) else {
            return false;
        };
        if href.origin() != location.origin() {
            trace_log!("Leaving cross-origin link '{}' to the browser", href);
            return false;
        }

        let target = full_path(&href);
        event.prevent_default();
        self.navigate(&target, NavigateOptions::new().cause(Cause::Navigation));
        true
    }
}
