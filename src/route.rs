//! Route definitions and the route table
//!
//! Routes are kept in registration order and looked up first-match-wins:
//! there is no specificity ranking, so register `/users/new` before
//! `/users/{id}` if both should be reachable.

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, RouteCache};
use crate::error::RouterError;
use crate::matcher::RoutePattern;
use crate::middleware::BoxedHandler;
use crate::params::RouteParams;
use crate::{debug_log, trace_log};
use http::Method;
#[cfg(feature = "cache")]
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared route handle
pub type RouteRef = Arc<Route>;

/// A registered route: method, pattern and handler chain.
///
/// Immutable once registered.
pub struct Route {
    name: Option<String>,
    method: Method,
    pattern: RoutePattern,
    handlers: Vec<BoxedHandler>,
}

impl Route {
    /// Create a route, compiling its pattern
    pub fn new(
        method: Method,
        name: Option<String>,
        path: &str,
        handlers: Vec<BoxedHandler>,
        strict: bool,
    ) -> Result<Self, RouterError> {
        if handlers.is_empty() {
            return Err(RouterError::EmptyHandlerChain {
                path: path.to_string(),
            });
        }

        Ok(Self {
            name,
            method,
            pattern: RoutePattern::compile_with(path, strict)?,
            handlers,
        })
    }

    /// Route name, if registered with one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// HTTP method this route answers
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path pattern text
    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    /// The compiled matcher
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The handler chain, in execution order
    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }

    /// Check whether this route answers `method` (ASCII case-insensitive)
    pub fn accepts(&self, method: &Method) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method.as_str())
    }

    /// Match a path against this route's pattern
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        self.pattern.matches(path)
    }

    /// Build a concrete path for this route from parameters
    pub fn url_for(&self, params: &RouteParams) -> Option<String> {
        self.pattern.fill(params)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.pattern.as_str())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route
    pub route: RouteRef,
    /// The path that was matched
    pub path: String,
    /// Parameters extracted from the path
    pub params: RouteParams,
}

/// Ordered collection of routes
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteRef>,
    strict: bool,
    #[cfg(feature = "cache")]
    cache: Option<Mutex<RouteCache>>,
}

impl RouteTable {
    /// Create an empty table with non-strict trailing slash matching
    pub fn new() -> Self {
        Self::default()
    }

    /// Require patterns to spell out trailing slashes
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Cache successful path lookups, keeping at most `capacity` entries
    ///
    /// A capacity of zero disables the cache.
    #[cfg(feature = "cache")]
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = RouteCache::with_capacity(capacity).map(Mutex::new);
        self
    }

    /// Hit, miss and invalidation counts; `None` when caching is disabled
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.lock().stats().clone())
    }

    /// Append a route
    ///
    /// Fails with [`RouterError::NameConflict`] when `name` is already used
    /// by a route with the same method.
    pub fn register(
        &mut self,
        method: Method,
        name: Option<&str>,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<RouteRef, RouterError> {
        if let Some(name) = name {
            if self.find_by_name(name, &method).is_some() {
                return Err(RouterError::NameConflict {
                    name: name.to_string(),
                    method,
                });
            }
        }

        let route = Arc::new(Route::new(
            method,
            name.map(str::to_string),
            path,
            handlers,
            self.strict,
        )?);

        debug_log!(
            "Registered route {} '{}'{}",
            route.method(),
            route.path(),
            route
                .name()
                .map(|n| format!(" as '{}'", n))
                .unwrap_or_default()
        );

        self.routes.push(Arc::clone(&route));
        self.invalidate_cache();

        Ok(route)
    }

    /// Find the first route, in registration order, that accepts `method`
    /// and whose pattern matches `path`
    pub fn find_by_path(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        if let Some(found) = self.cached(path, method) {
            return Some(found);
        }

        for (index, route) in self.routes.iter().enumerate() {
            if !route.accepts(method) {
                continue;
            }
            if let Some(params) = route.matches(path) {
                trace_log!("'{}' matched route '{}'", path, route.path());
                self.remember(path, method, index, &params);

                return Some(RouteMatch {
                    route: Arc::clone(route),
                    path: path.to_string(),
                    params,
                });
            }
        }

        None
    }

    /// Find the route registered under `name` for `method`
    pub fn find_by_name(&self, name: &str, method: &Method) -> Option<&RouteRef> {
        self.routes
            .iter()
            .find(|route| route.name() == Some(name) && route.accepts(method))
    }

    /// All routes in registration order
    pub fn routes(&self) -> &[RouteRef] {
        &self.routes
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    #[cfg(feature = "cache")]
    fn cached(&self, path: &str, method: &Method) -> Option<RouteMatch> {
        let (index, params) = self.cache.as_ref()?.lock().get(method, path)?;
        let route = self.routes.get(index)?;
        Some(RouteMatch {
            route: Arc::clone(route),
            path: path.to_string(),
            params,
        })
    }

    #[cfg(not(feature = "cache"))]
    fn cached(&self, _path: &str, _method: &Method) -> Option<RouteMatch> {
        None
    }

    #[cfg(feature = "cache")]
    fn remember(&self, path: &str, method: &Method, index: usize, params: &RouteParams) {
        if let Some(cache) = &self.cache {
            cache.lock().insert(method, path, index, params.clone());
        }
    }

    #[cfg(not(feature = "cache"))]
    fn remember(&self, _path: &str, _method: &Method, _index: usize, _params: &RouteParams) {}

    // Appending can turn a cached miss into a hit, so start over.
    #[cfg(feature = "cache")]
    fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    #[cfg(not(feature = "cache"))]
    fn invalidate_cache(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::handler_fn;

    fn noop() -> Vec<BoxedHandler> {
        vec![handler_fn(|_cxt| Ok(()))]
    }

    #[test]
    fn test_register_keeps_order() {
        let mut table = RouteTable::new();
        table.register(Method::GET, None, "/", noop()).unwrap();
        table
            .register(Method::POST, None, "/hello/{name}", noop())
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[0].path(), "/");
        assert_eq!(table.routes()[1].method(), &Method::POST);
        assert_eq!(table.routes()[1].path(), "/hello/{name}");
    }

    #[test]
    fn test_handler_chain_preserved() {
        let middleware = handler_fn(|_cxt| Ok(()));
        let handler = handler_fn(|_cxt| Ok(()));

        let mut table = RouteTable::new();
        let route = table
            .register(
                Method::GET,
                None,
                "/",
                vec![Arc::clone(&middleware), Arc::clone(&handler)],
            )
            .unwrap();

        assert_eq!(route.handlers().len(), 2);
        assert!(Arc::ptr_eq(&route.handlers()[0], &middleware));
        assert!(Arc::ptr_eq(&route.handlers()[1], &handler));
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::new();
        table.register(Method::GET, None, "/users/{id}", noop()).unwrap();
        table.register(Method::GET, None, "/users/new", noop()).unwrap();

        let found = table.find_by_path("/users/new", &Method::GET).unwrap();
        assert_eq!(found.route.path(), "/users/{id}");
        assert_eq!(found.params.get("id"), Some(&"new".to_string()));
    }

    #[test]
    fn test_find_by_path_checks_method() {
        let mut table = RouteTable::new();
        table.register(Method::POST, None, "/items", noop()).unwrap();
        table.register(Method::GET, None, "/items", noop()).unwrap();

        let found = table.find_by_path("/items", &Method::GET).unwrap();
        assert_eq!(found.route.method(), &Method::GET);
        assert!(table.find_by_path("/items", &Method::DELETE).is_none());
        assert!(table.find_by_path("/other", &Method::GET).is_none());
    }

    #[test]
    fn test_find_by_path_method_case_insensitive() {
        let mut table = RouteTable::new();
        table.register(Method::GET, None, "/", noop()).unwrap();

        let lowercase = Method::from_bytes(b"get").unwrap();
        assert!(table.find_by_path("/", &lowercase).is_some());
    }

    #[test]
    fn test_name_conflict_same_method() {
        let mut table = RouteTable::new();
        table
            .register(Method::GET, Some("hello"), "/hello", noop())
            .unwrap();

        let error = table
            .register(Method::GET, Some("hello"), "/hi", noop())
            .unwrap_err();
        assert!(error.is_name_conflict());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_name_different_method() {
        let mut table = RouteTable::new();
        table
            .register(Method::GET, Some("hello"), "/hello", noop())
            .unwrap();
        table
            .register(Method::POST, Some("hello"), "/hello", noop())
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.find_by_name("hello", &Method::POST).unwrap().method(),
            &Method::POST
        );
        assert!(table.find_by_name("hello", &Method::PUT).is_none());
        assert!(table.find_by_name("missing", &Method::GET).is_none());
    }

    #[test]
    fn test_empty_chain_rejected() {
        let mut table = RouteTable::new();
        let error = table.register(Method::GET, None, "/", Vec::new()).unwrap_err();

        assert_eq!(
            error,
            RouterError::EmptyHandlerChain {
                path: "/".to_string()
            }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut table = RouteTable::new();
        let error = table
            .register(Method::GET, None, "/{bad name}", noop())
            .unwrap_err();

        assert!(error.is_invalid_pattern());
        assert!(table.is_empty());
    }

    #[test]
    fn test_strict_table() {
        let mut table = RouteTable::new().strict(true);
        table.register(Method::GET, None, "/users", noop()).unwrap();

        assert!(table.find_by_path("/users", &Method::GET).is_some());
        assert!(table.find_by_path("/users/", &Method::GET).is_none());
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cached_lookup_matches_uncached() {
        let mut table = RouteTable::new().with_cache(8);
        table.register(Method::GET, None, "/users/{id}", noop()).unwrap();

        let first = table.find_by_path("/users/7", &Method::GET).unwrap();
        let second = table.find_by_path("/users/7", &Method::GET).unwrap();

        assert!(Arc::ptr_eq(&first.route, &second.route));
        assert_eq!(second.params.get("id"), Some(&"7".to_string()));
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_cleared_on_register() {
        let mut table = RouteTable::new().with_cache(8);
        table.register(Method::GET, None, "/a", noop()).unwrap();
        assert!(table.find_by_path("/b", &Method::GET).is_none());

        table.register(Method::GET, None, "/b", noop()).unwrap();
        assert!(table.find_by_path("/b", &Method::GET).is_some());
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_stats() {
        assert!(RouteTable::new().cache_stats().is_none());
        assert!(RouteTable::new().with_cache(0).cache_stats().is_none());

        let mut table = RouteTable::new().with_cache(8);
        table.register(Method::GET, None, "/users/{id}", noop()).unwrap();

        table.find_by_path("/users/7", &Method::GET).unwrap();
        table.find_by_path("/users/7", &Method::GET).unwrap();

        let stats = table.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 0.001);
    }
}
