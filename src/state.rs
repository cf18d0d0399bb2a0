//! The router
//!
//! [`Router`] owns the route table, the event emitter and the platform it
//! runs on. Routes are registered per HTTP verb:
//!
//! ```
//! use isoroute::{handler_fn, Router};
//!
//! let mut router = Router::server();
//! router
//!     .get("/", [handler_fn(|_cxt| Ok(()))])?
//!     .post_named("create-post", "/posts", [handler_fn(|_cxt| Ok(()))])?
//!     .del("/posts/{id}", [handler_fn(|_cxt| Ok(()))])?;
//!
//! assert_eq!(router.routes().len(), 3);
//! assert_eq!(
//!     router.url_for("create-post", &Default::default()),
//!     None, // only GET routes are reverse-routed
//! );
//! # Ok::<(), isoroute::RouterError>(())
//! ```

#[cfg(feature = "cache")]
use crate::cache::CacheStats;
use crate::error::RouterError;
use crate::events::{EventEmitter, EventKind, ListenerId, RouterEvent};
use crate::lifecycle::Lifecycle;
use crate::middleware::BoxedHandler;
use crate::params::RouteParams;
use crate::platform::{BrowserHost, Platform};
use crate::route::RouteTable;
use crate::trace_log;
use http::Method;
use parking_lot::Mutex;

/// Router configuration
///
/// # Example
///
/// ```
/// use isoroute::{MemoryHistory, RouterConfig};
///
/// let history = MemoryHistory::new("http://localhost/").unwrap();
/// let router = RouterConfig::browser(history).strict(true).build();
/// assert!(router.can_use_dom());
/// ```
#[derive(Debug)]
pub struct RouterConfig {
    platform: Platform,
    strict: bool,
    #[cfg_attr(not(feature = "cache"), allow(dead_code))]
    cache_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Server,
            strict: false,
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl RouterConfig {
    /// Default number of cached path lookups
    pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

    /// Server router configuration
    pub fn server() -> Self {
        Self::default()
    }

    /// Browser router configuration over `host`
    pub fn browser(host: impl BrowserHost + 'static) -> Self {
        Self {
            platform: Platform::browser(host),
            ..Self::default()
        }
    }

    /// Treat a trailing slash as significant
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Number of path lookups to cache; 0 disables the cache
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Router {
        Router::new(self)
    }
}

/// Isomorphic router
pub struct Router {
    pub(crate) table: RouteTable,
    pub(crate) events: EventEmitter,
    pub(crate) platform: Platform,
    pub(crate) lifecycle: Mutex<Lifecycle>,
}

macro_rules! verb_methods {
    ($($(#[$doc:meta])* $method:ident, $named:ident => $verb:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $method<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouterError>
            where
                I: IntoIterator<Item = BoxedHandler>,
            {
                self.route($verb, None, path, handlers)
            }

            $(#[$doc])*
            ///
            /// The name must be unique among routes with the same method.
            pub fn $named<I>(
                &mut self,
                name: &str,
                path: &str,
                handlers: I,
            ) -> Result<&mut Self, RouterError>
            where
                I: IntoIterator<Item = BoxedHandler>,
            {
                self.route($verb, Some(name), path, handlers)
            }
        )*
    };
}

impl Router {
    /// Create a router from a configuration
    pub fn new(config: RouterConfig) -> Self {
        let table = RouteTable::new().strict(config.strict);
        #[cfg(feature = "cache")]
        let table = table.with_cache(config.cache_capacity);

        Self {
            table,
            events: EventEmitter::new(),
            platform: config.platform,
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Router for an HTTP server
    pub fn server() -> Self {
        RouterConfig::server().build()
    }

    /// Router driving a browser host
    pub fn browser(host: impl BrowserHost + 'static) -> Self {
        RouterConfig::browser(host).build()
    }

    /// Register a route for `method`
    ///
    /// On a browser router only `GET` routes are kept; other methods are
    /// accepted and ignored.
    pub fn route<I>(
        &mut self,
        method: Method,
        name: Option<&str>,
        path: &str,
        handlers: I,
    ) -> Result<&mut Self, RouterError>
    where
        I: IntoIterator<Item = BoxedHandler>,
    {
        if self.platform.can_use_dom() && method != Method::GET {
            trace_log!("Ignoring {} '{}' on browser router", method, path);
            return Ok(self);
        }

        self.table
            .register(method, name, path, handlers.into_iter().collect())?;
        Ok(self)
    }

    verb_methods! {
        /// Register a `GET` route
        get, get_named => Method::GET;
        /// Register a `POST` route
        post, post_named => Method::POST;
        /// Register a `PUT` route
        put, put_named => Method::PUT;
        /// Register a `PATCH` route
        patch, patch_named => Method::PATCH;
        /// Register a `DELETE` route
        del, del_named => Method::DELETE;
        /// Register a `HEAD` route
        head, head_named => Method::HEAD;
        /// Register an `OPTIONS` route
        options, options_named => Method::OPTIONS;
        /// Register a `TRACE` route
        trace, trace_named => Method::TRACE;
    }

    /// The route table
    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /// Route cache statistics; `None` when caching is disabled
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.table.cache_stats()
    }

    /// The platform this router runs on
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// `true` for a browser router
    pub fn can_use_dom(&self) -> bool {
        self.platform.can_use_dom()
    }

    /// Build the path of the `GET` route named `name`
    ///
    /// Returns `None` when there is no such route or a required parameter is
    /// missing.
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Option<String> {
        self.table.find_by_name(name, &Method::GET)?.url_for(params)
    }

    /// Listen for a router event
    pub fn bind<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&RouterEvent<'_>) + Send + Sync + 'static,
    {
        self.events.bind(kind, listener)
    }

    /// Remove a listener added with [`Router::bind`]
    pub fn unbind(&self, kind: EventKind, id: ListenerId) -> bool {
        self.events.unbind(kind, id)
    }

    pub(crate) fn emit(&self, event: &RouterEvent<'_>) {
        self.events.trigger(event);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::server()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("platform", &self.platform)
            .field("routes", &self.table.len())
            .field("events", &self.events)
            .field("started", &self.is_started())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::middleware::handler_fn;

    fn noop() -> [BoxedHandler; 1] {
        [handler_fn(|_cxt| Ok(()))]
    }

    #[test]
    fn test_verb_registration() {
        let mut router = Router::server();
        router
            .get("/", noop())
            .unwrap()
            .post("/", noop())
            .unwrap()
            .put("/", noop())
            .unwrap()
            .patch("/", noop())
            .unwrap()
            .del("/", noop())
            .unwrap()
            .head("/", noop())
            .unwrap()
            .options("/", noop())
            .unwrap()
            .trace("/", noop())
            .unwrap();

        let methods: Vec<&str> = router
            .routes()
            .routes()
            .iter()
            .map(|route| route.method().as_str())
            .collect();
        assert_eq!(
            methods,
            vec!["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "TRACE"]
        );
    }

    #[test]
    fn test_named_conflict() {
        let mut router = Router::server();
        router.get_named("home", "/", noop()).unwrap();

        let err = router.get_named("home", "/index", noop()).unwrap_err();
        assert!(err.is_name_conflict());

        assert!(router.post_named("home", "/", noop()).is_ok());
    }

    #[test]
    fn test_browser_ignores_non_get() {
        let history = MemoryHistory::new("http://localhost/").unwrap();
        let mut router = Router::browser(history);

        router.post("/", noop()).unwrap();
        router.put("/", noop()).unwrap();
        router.patch("/", noop()).unwrap();
        router.del("/", noop()).unwrap();
        router.head("/", noop()).unwrap();
        router.options("/", noop()).unwrap();
        router.trace("/", noop()).unwrap();
        assert!(router.routes().is_empty());

        router.get("/", noop()).unwrap();
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut router = Router::server();
        let err = router.get("/{bad name}", noop()).unwrap_err();
        assert!(err.is_invalid_pattern());
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_empty_handler_chain_rejected() {
        let mut router = Router::server();
        let err = router.get("/", Vec::new()).unwrap_err();
        assert!(matches!(err, RouterError::EmptyHandlerChain { .. }));
    }

    #[test]
    fn test_url_for() {
        let mut router = Router::server();
        router.get_named("hello", "/hello/{name}", noop()).unwrap();

        let params = RouteParams::new().with("name", "Goober");
        assert_eq!(router.url_for("hello", &params), Some("/hello/Goober".to_string()));
        assert_eq!(router.url_for("hello", &RouteParams::new()), None);
        assert_eq!(router.url_for("missing", &params), None);
    }

    #[test]
    fn test_strict_config() {
        let mut router = RouterConfig::server().strict(true).build();
        router.get("/about", noop()).unwrap();

        assert!(router.routes().find_by_path("/about", &Method::GET).is_some());
        assert!(router.routes().find_by_path("/about/", &Method::GET).is_none());
    }

    #[test]
    fn test_bind_unbind_delegation() {
        let router = Router::server();
        let id = router.bind(EventKind::NotFound, |_| {});
        assert_eq!(router.events.listener_count(EventKind::NotFound), 1);
        assert!(router.unbind(EventKind::NotFound, id));
        assert_eq!(router.events.listener_count(EventKind::NotFound), 0);
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_stats_follow_config() {
        let mut router = Router::server();
        router.get("/users/{id}", noop()).unwrap();
        router.routes().find_by_path("/users/1", &Method::GET);
        router.routes().find_by_path("/users/1", &Method::GET);

        let stats = router.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        let uncached = RouterConfig::server().cache_capacity(0).build();
        assert!(uncached.cache_stats().is_none());
    }
}
