//! Host platform abstraction
//!
//! A router is either mounted in an HTTP server or driven by a browser-like
//! host. The choice is made at construction through [`Platform`]; nothing is
//! detected at runtime.
//!
//! A browser host exposes the parts of the History API the router needs and
//! tells the router which document listeners to attach. The host forwards
//! the matching events to [`Router::handle_pop_state`] and
//! [`Router::handle_click`] while those listeners are attached.
//!
//! [`Router::handle_pop_state`]: crate::Router::handle_pop_state
//! [`Router::handle_click`]: crate::Router::handle_click

use crate::history::HistoryState;
use parking_lot::Mutex;
use std::fmt;

/// Document listeners the router can ask a host to attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostListener {
    /// `popstate` on the window
    PopState,
    /// `click` on the document
    Click,
}

impl HostListener {
    pub fn event_name(&self) -> &'static str {
        match self {
            HostListener::PopState => "popstate",
            HostListener::Click => "click",
        }
    }
}

/// The browser surface a router depends on.
///
/// Implementations wrap `window.history` and `document.location` (or an
/// in-process stand-in such as [`MemoryHistory`](crate::MemoryHistory)).
pub trait BrowserHost: Send {
    /// Absolute URL of the current document
    fn location(&self) -> String;

    /// Add a history entry (`history.pushState`)
    fn push_state(&mut self, state: &HistoryState, url: &str);

    /// Overwrite the current history entry (`history.replaceState`)
    fn replace_state(&mut self, state: &HistoryState, url: &str);

    /// Start forwarding `listener` events to the router
    fn add_listener(&mut self, listener: HostListener);

    /// Stop forwarding `listener` events to the router
    fn remove_listener(&mut self, listener: HostListener);
}

/// Where a router runs
#[derive(Default)]
pub enum Platform {
    /// Mounted as middleware in an HTTP server
    #[default]
    Server,
    /// Driving navigation in a browser host
    Browser(Mutex<Box<dyn BrowserHost>>),
}

impl Platform {
    /// Browser platform over `host`
    pub fn browser(host: impl BrowserHost + 'static) -> Self {
        Platform::Browser(Mutex::new(Box::new(host)))
    }

    /// `true` on a browser host
    pub fn can_use_dom(&self) -> bool {
        matches!(self, Platform::Browser(_))
    }

    /// Run `f` against the browser host; `None` on a server
    ///
    /// The host stays locked only for the duration of `f`.
    pub(crate) fn with_host<R>(&self, f: impl FnOnce(&mut dyn BrowserHost) -> R) -> Option<R> {
        match self {
            Platform::Server => None,
            Platform::Browser(host) => {
                let mut host = host.lock();
                Some(f(host.as_mut()))
            }
        }
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Server => f.write_str("Server"),
            Platform::Browser(_) => f.write_str("Browser"),
        }
    }
}

// ============================================================================
// Click events
// ============================================================================

/// The anchor element nearest to a click target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// `href`, absolute or relative to the document
    pub href: String,
    /// `target` attribute
    pub target: Option<String>,
    /// Whether the `download` attribute is present
    pub download: bool,
    /// Whether the link asks not to be intercepted
    pub opt_out: bool,
}

impl Anchor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn download(mut self) -> Self {
        self.download = true;
        self
    }

    pub fn opt_out(mut self) -> Self {
        self.opt_out = true;
        self
    }

    /// Whether following this link keeps the current browsing context
    pub fn opens_in_place(&self) -> bool {
        match self.target.as_deref() {
            None | Some("") | Some("_self") => true,
            Some(_) => false,
        }
    }
}

/// A document click as seen by the link interceptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub default_prevented: bool,
    pub meta_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    /// Mouse button, `0` is the primary button
    pub button: i16,
    /// Closest `<a>` ancestor of the click target, if any
    pub anchor: Option<Anchor>,
}

impl ClickEvent {
    /// Plain primary-button click on `anchor`
    pub fn on(anchor: Anchor) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::default()
        }
    }

    /// `event.preventDefault()`
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a modifier key was held
    pub fn is_modified(&self) -> bool {
        self.meta_key || self.ctrl_key || self.shift_key || self.alt_key
    }
}
