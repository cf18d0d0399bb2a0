//! Router lifecycle: `start()` and `stop()`
//!
//! A router is **stopped** until `start()` is called. On a server, `start()`
//! hands back the router bound as middleware. In a browser it asks the host
//! to attach the `popstate` listener (and the `click` listener unless
//! `handle_links` is off), optionally navigates to the current location,
//! and marks the router started. `stop()` detaches what `start()` attached.

use crate::client::NavigateOptions;
use crate::context::Cause;
use crate::platform::{HostListener, Platform};
use crate::server::ServerDispatcher;
use crate::state::Router;
use crate::{debug_log, info_log, trace_log};
use serde::Deserialize;

/// Options for [`Router::start`]
///
/// Deserializes from `{"autoStart": true, "handleLinks": false}`; missing
/// fields keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StartOptions {
    /// Navigate to the current location on start (browser only)
    pub auto_start: bool,
    /// Intercept same-origin link clicks (browser only)
    pub handle_links: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            auto_start: false,
            handle_links: true,
        }
    }
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn handle_links(mut self, handle_links: bool) -> Self {
        self.handle_links = handle_links;
        self
    }
}

/// Started flag and the host listeners currently attached
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    started: bool,
    listeners: Vec<HostListener>,
}

impl Router {
    /// Start routing
    ///
    /// Returns the server dispatcher on a server router and `None` in a
    /// browser. Starting a started browser router does nothing.
    pub fn start(&self, options: StartOptions) -> Option<ServerDispatcher<'_>> {
        if !self.platform().can_use_dom() {
            self.lifecycle.lock().started = true;
            info_log!("Router started as server middleware ({} routes)", self.routes().len());
            return Some(self.dispatcher());
        }

        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.started {
                trace_log!("start() ignored: router already started");
                return None;
            }
            lifecycle.started = true;
        }

        self.attach(HostListener::PopState);

        if options.auto_start {
            if let Some(href) = self.platform().with_host(|host| host.location()) {
                debug_log!("Auto-starting at '{}'", href);
                self.navigate(&href, NavigateOptions::new().cause(Cause::Startup));
            }
        }

        if options.handle_links {
            self.attach(HostListener::Click);
        }

        info_log!("Router started in browser ({} routes)", self.routes().len());
        None
    }

    /// Stop client-side routing
    ///
    /// Detaches the host listeners. Does nothing on a server or when the
    /// router is not started.
    pub fn stop(&self) {
        if !self.platform().can_use_dom() {
            return;
        }

        let listeners = {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.started {
                return;
            }
            lifecycle.started = false;
            std::mem::take(&mut lifecycle.listeners)
        };

        for listener in listeners {
            self.platform()
                .with_host(|host| host.remove_listener(listener));
        }
        info_log!("Router stopped");
    }

    /// Whether `start()` has been called (and not undone by `stop()`)
    pub fn is_started(&self) -> bool {
        self.lifecycle.lock().started
    }

    /// The router bound as server middleware, regardless of lifecycle state
    pub fn dispatcher(&self) -> ServerDispatcher<'_> {
        ServerDispatcher::new(self)
    }

    pub(crate) fn is_listening(&self, listener: HostListener) -> bool {
        self.lifecycle.lock().listeners.contains(&listener)
    }

    fn attach(&self, listener: HostListener) {
        if let Platform::Browser(_) = self.platform() {
            self.lifecycle.lock().listeners.push(listener);
            self.platform().with_host(|host| host.add_listener(listener));
            trace_log!("Attached '{}' listener", listener.event_name());
        }
    }
}
