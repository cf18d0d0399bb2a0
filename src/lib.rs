//! # isoroute
//!
//! An isomorphic router: one route table drives both server-side request
//! dispatch and client-side (browser) navigation.
//!
//! - **Route Table** - Routes per HTTP verb, optionally named, matched first-match-wins
//! - **Patterns** - `{name}`, `{name}?`, `{name}(regex)` and `*` captures
//! - **Middleware Chains** - Ordered handlers that hand over with `next()`
//! - **Events** - `navigating`, `navigationComplete`, `notFound`, `error`
//! - **Server Dispatch** - `(request, response, next)` middleware over `http` types
//! - **Browser Dispatch** - History entries, back/forward replay and link interception
//!
//! # Server
//!
//! ```
//! use isoroute::{handler_fn, Outcome, RequestExt, Router, StartOptions};
//!
//! let mut router = Router::server();
//! router.get(
//!     "/hello/{name}",
//!     [
//!         handler_fn(|cxt| {
//!             println!("cause of this request: {}", cxt.cause());
//!             cxt.next();
//!             Ok(())
//!         }),
//!         handler_fn(|cxt| {
//!             let name = cxt
//!                 .request()
//!                 .and_then(|request| request.route_params())
//!                 .and_then(|params| params.get("name").cloned())
//!                 .unwrap_or_default();
//!             if let Some(response) = cxt.response_mut() {
//!                 *response.body_mut() = format!("Hello, {}", name).into_bytes();
//!             }
//!             Ok(())
//!         }),
//!     ],
//! )?;
//!
//! let server = router.start(StartOptions::default()).expect("server router");
//! let request = http::Request::get("/hello/Goober").body(Vec::new())?;
//! match server.serve(request) {
//!     Outcome::Handled(response) => assert_eq!(response.body(), b"Hello, Goober"),
//!     Outcome::Next(_) => unreachable!(),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Browser
//!
//! A browser router is built over a [`BrowserHost`]. [`MemoryHistory`] is an
//! in-process host:
//!
//! ```
//! use isoroute::{handler_fn, HistoryCall, MemoryHistory, Router, StartOptions};
//!
//! let history = MemoryHistory::new("http://localhost/")?;
//! let mut router = Router::browser(history.clone());
//! router.get_named("user", "/users/{id}", [handler_fn(|cxt| {
//!     println!("showing user {}", cxt.params().get("id").unwrap());
//!     Ok(())
//! })])?;
//!
//! router.start(StartOptions::default());
//! router.navigate_to("/users/42");
//!
//! assert_eq!(history.pathname(), "/users/42");
//! assert_eq!(history.calls(), vec![HistoryCall::Push("/users/42".to_string())]);
//! # Ok::<(), isoroute::RouterError>(())
//! ```
//!
//! # Events
//!
//! ```
//! use isoroute::{EventKind, Router};
//!
//! let router = Router::server();
//! router.bind(EventKind::NotFound, |event| {
//!     eprintln!("no route for {} {}", event.method, event.path);
//! });
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging (mutually exclusive with `log`)
//! - `cache` (default) - LRU cache for path lookups

#![doc(html_root_url = "https://docs.rs/isoroute/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Cache (optional)
#[cfg(feature = "cache")]
pub mod cache;

// Core routing modules
pub mod matcher;
pub mod middleware;
pub mod params;
pub mod route;
pub mod state;

// Error handling
pub mod error;

// Events and per-navigation context
pub mod context;
pub mod events;

// Platforms and dispatchers
pub mod client;
pub mod history;
pub mod lifecycle;
pub mod platform;
pub mod server;

// Re-export main types for convenient access
#[cfg(feature = "cache")]
pub use cache::{CacheStats, RouteCache};
pub use client::NavigateOptions;
pub use context::{Cause, Context};
pub use error::{HandlerFailure, HandlerResult, RouterError};
pub use events::{EventEmitter, EventKind, Listener, ListenerId, RouterEvent};
pub use history::{HistoryCall, HistoryState, MemoryHistory, PopStateEvent};
pub use lifecycle::StartOptions;
pub use matcher::{RoutePattern, GLOB_PARAM};
pub use middleware::{boxed, handler_fn, BoxedHandler, FnHandler, RouteHandler};
pub use params::{QueryParams, QueryValue, RouteParams};
pub use platform::{Anchor, BrowserHost, ClickEvent, HostListener, Platform};
pub use route::{Route, RouteMatch, RouteRef, RouteTable};
pub use server::{Body, Outcome, RequestExt, ServerDispatcher};
pub use state::{Router, RouterConfig};
