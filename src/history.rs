//! History entries and an in-process browser host
//!
//! [`HistoryState`] is what the router stores with every history entry: the
//! serializable part of a navigation context. [`MemoryHistory`] keeps a
//! history stack in memory and implements [`BrowserHost`], which makes it
//! usable for tests, server-side rendering of client flows, and non-web
//! shells.

use crate::context::Cause;
use crate::error::RouterError;
use crate::params::{QueryParams, RouteParams};
use crate::platform::{BrowserHost, HostListener};
use crate::{error_log, warn_log};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

/// State stored with a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// Path with query string and fragment
    pub full_path: String,
    /// Path without query string
    pub path: String,
    pub params: RouteParams,
    pub query: QueryParams,
    pub cause: Cause,
}

/// Payload of a `popstate` event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopStateEvent {
    /// State of the entry that became current; `None` for entries created
    /// outside the router
    pub state: Option<HistoryState>,
}

/// History mutation recorded by [`MemoryHistory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCall {
    Push(String),
    Replace(String),
}

/// Navigation history entry
#[derive(Debug, Clone)]
struct HistoryEntry {
    url: Url,
    /// JSON text of the state, like a structured clone
    state: Option<String>,
}

impl HistoryEntry {
    fn new(url: Url) -> Self {
        Self { url, state: None }
    }

    fn with_state(url: Url, state: &HistoryState) -> Self {
        let state = match serde_json::to_string(state) {
            Ok(json) => Some(json),
            Err(_e) => {
                error_log!("Failed to serialize history state for {}: {}", url, _e);
                None
            }
        };
        Self { url, state }
    }

    fn state(&self) -> Option<HistoryState> {
        serde_json::from_str(self.state.as_deref()?).ok()
    }
}

#[derive(Debug)]
struct History {
    entries: Vec<HistoryEntry>,
    current: usize,
    /// Maximum number of entries (0 = unlimited)
    max_size: usize,
    listeners: HashSet<HostListener>,
    /// Most recent calls, bounded by `max_size`
    calls: VecDeque<HistoryCall>,
}

impl History {
    fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    fn resolve(&self, url: &str) -> Option<Url> {
        match self.current_entry().url.join(url) {
            Ok(url) => Some(url),
            Err(_e) => {
                warn_log!("Ignoring history update to '{}': {}", url, _e);
                None
            }
        }
    }

    fn record(&mut self, call: HistoryCall) {
        if self.max_size > 0 && self.calls.len() >= self.max_size {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    fn push(&mut self, state: &HistoryState, url: &str) {
        self.record(HistoryCall::Push(url.to_string()));
        let Some(url) = self.resolve(url) else {
            return;
        };

        // Remove forward history when pushing
        self.entries.truncate(self.current + 1);
        self.entries.push(HistoryEntry::with_state(url, state));
        self.current += 1;

        self.enforce_size_limit();
    }

    fn replace(&mut self, state: &HistoryState, url: &str) {
        self.record(HistoryCall::Replace(url.to_string()));
        let Some(url) = self.resolve(url) else {
            return;
        };

        let current = self.current;
        self.entries[current] = HistoryEntry::with_state(url, state);
    }

    fn go(&mut self, delta: isize) -> Option<PopStateEvent> {
        let target = self.current.checked_add_signed(delta)?;
        if target >= self.entries.len() {
            return None;
        }
        self.current = target;
        Some(PopStateEvent {
            state: self.current_entry().state(),
        })
    }

    fn enforce_size_limit(&mut self) {
        if self.max_size > 0 && self.entries.len() > self.max_size {
            // Remove oldest entries, keeping the current entry reachable
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
            self.current = self.current.saturating_sub(excess);
        }
    }
}

/// In-memory browser host.
///
/// Cloning gives another handle to the same history, so one clone can be
/// handed to the router while another drives back/forward and inspects the
/// entries.
///
/// # Example
///
/// ```
/// use isoroute::MemoryHistory;
///
/// let history = MemoryHistory::new("http://localhost/").unwrap();
/// assert_eq!(history.pathname(), "/");
/// assert!(history.calls().is_empty());
/// assert!(!history.can_go_back());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    inner: Arc<Mutex<History>>,
}

impl MemoryHistory {
    /// Default entry limit
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    /// Create a history whose only entry is `href`
    pub fn new(href: &str) -> Result<Self, RouterError> {
        Self::with_max_size(href, Self::DEFAULT_MAX_SIZE)
    }

    /// Create with a custom entry limit (0 = unlimited)
    pub fn with_max_size(href: &str, max_size: usize) -> Result<Self, RouterError> {
        let url = Url::parse(href).map_err(|e| RouterError::InvalidUrl {
            url: href.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(History {
                entries: vec![HistoryEntry::new(url)],
                current: 0,
                max_size,
                listeners: HashSet::new(),
                calls: VecDeque::new(),
            })),
        })
    }

    /// Absolute URL of the current entry
    pub fn href(&self) -> String {
        self.inner.lock().current_entry().url.to_string()
    }

    /// Path of the current entry
    pub fn pathname(&self) -> String {
        self.inner.lock().current_entry().url.path().to_string()
    }

    /// State stored with the current entry
    pub fn state(&self) -> Option<HistoryState> {
        self.inner.lock().current_entry().state()
    }

    /// Step back one entry, returning the `popstate` payload
    ///
    /// Returns `None` at the start of the history.
    pub fn back(&self) -> Option<PopStateEvent> {
        self.inner.lock().go(-1)
    }

    /// Step forward one entry, returning the `popstate` payload
    pub fn forward(&self) -> Option<PopStateEvent> {
        self.inner.lock().go(1)
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.lock().current > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let history = self.inner.lock();
        history.current + 1 < history.entries.len()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Always `false`: a history has at least one entry
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// The latest `pushState`/`replaceState` calls, oldest first
    ///
    /// At most `max_size` calls are kept.
    pub fn calls(&self) -> Vec<HistoryCall> {
        self.inner.lock().calls.iter().cloned().collect()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Whether the router asked for `listener` to be attached
    pub fn is_listening(&self, listener: HostListener) -> bool {
        self.inner.lock().listeners.contains(&listener)
    }
}

impl BrowserHost for MemoryHistory {
    fn location(&self) -> String {
        self.href()
    }

    fn push_state(&mut self, state: &HistoryState, url: &str) {
        self.inner.lock().push(state, url);
    }

    fn replace_state(&mut self, state: &HistoryState, url: &str) {
        self.inner.lock().replace(state, url);
    }

    fn add_listener(&mut self, listener: HostListener) {
        self.inner.lock().listeners.insert(listener);
    }

    fn remove_listener(&mut self, listener: HostListener) {
        self.inner.lock().listeners.remove(&listener);
    }
}
