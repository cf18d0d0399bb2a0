//! Route resolution caching
//!
//! Remembers which route (by table index) answered a `(method, path)` pair
//! together with the extracted parameters, with LRU eviction. Only hits are
//! cached; the table clears the cache whenever a route is appended.

use crate::params::RouteParams;
use crate::trace_log;
use http::Method;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache key: upper-cased method plus the exact path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: String,
    path: String,
}

impl CacheKey {
    fn new(method: &Method, path: &str) -> Self {
        Self {
            method: method.as_str().to_ascii_uppercase(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    route_index: usize,
    params: RouteParams,
}

/// Cache performance statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Route resolution cache with LRU eviction
#[derive(Debug)]
pub struct RouteCache {
    entries: LruCache<CacheKey, CacheEntry>,
    stats: CacheStats,
}

impl RouteCache {
    /// Returns `None` for a zero capacity
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let cap = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        })
    }

    pub fn get(&mut self, method: &Method, path: &str) -> Option<(usize, RouteParams)> {
        let key = CacheKey::new(method, path);
        if let Some(entry) = self.entries.get(&key) {
            self.stats.hits += 1;
            trace_log!("Route cache hit for {} '{}'", method, path);
            Some((entry.route_index, entry.params.clone()))
        } else {
            self.stats.misses += 1;
            trace_log!("Route cache miss for {} '{}'", method, path);
            None
        }
    }

    pub fn insert(&mut self, method: &Method, path: &str, route_index: usize, params: RouteParams) {
        self.entries.push(
            CacheKey::new(method, path),
            CacheEntry {
                route_index,
                params,
            },
        );
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing route cache");
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
