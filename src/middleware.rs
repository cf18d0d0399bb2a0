//! Route handlers and middleware
//!
//! A route owns an ordered chain of handlers. Every handler receives the
//! navigation [`Context`] and decides how the chain proceeds:
//!
//! - call [`Context::next`] to hand over to the next handler (middleware),
//! - return `Ok(())` without calling `next` to finish the chain (the handler
//!   owns the response),
//! - return `Err(..)` or call [`Context::fail`] to abort the chain.
//!
//! # Example
//!
//! ```no_run
//! use isoroute::{handler_fn, Context, HandlerResult, RouteHandler};
//!
//! struct CausePrinter;
//!
//! impl RouteHandler for CausePrinter {
//!     fn handle(&self, cxt: &mut Context<'_>) -> HandlerResult {
//!         println!("cause of this request: {}", cxt.cause());
//!         cxt.next();
//!         Ok(())
//!     }
//! }
//!
//! let hello = handler_fn(|cxt| {
//!     let name = cxt.params().get("name").cloned().unwrap_or_default();
//!     println!("Hello, {}", name);
//!     Ok(())
//! });
//! ```

use crate::context::Context;
use crate::error::HandlerResult;
use std::sync::Arc;

/// A handler in a route's chain.
pub trait RouteHandler: Send + Sync + 'static {
    /// Handle a navigation
    ///
    /// Returning `Err` is the same as calling `cxt.fail(err)`: the remaining
    /// handlers are skipped and the failure is reported.
    fn handle(&self, cxt: &mut Context<'_>) -> HandlerResult;

    /// Handler name for debugging
    fn name(&self) -> &str {
        "RouteHandler"
    }
}

/// Shared, type-erased handler.
///
/// Routes hold their chain as `Vec<BoxedHandler>`; each dispatch takes a
/// shallow copy, so cloning only bumps reference counts.
pub type BoxedHandler = Arc<dyn RouteHandler>;

/// Create a handler from a closure
///
/// # Example
///
/// ```
/// use isoroute::handler_fn;
///
/// let logger = handler_fn(|cxt| {
///     println!("navigating to {}", cxt.path());
///     cxt.next();
///     Ok(())
/// });
/// assert_eq!(logger.name(), "FnHandler");
/// ```
pub fn handler_fn<F>(handler: F) -> BoxedHandler
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(FnHandler { handler })
}

/// Handler created from a closure
pub struct FnHandler<F> {
    handler: F,
}

impl<F> RouteHandler for FnHandler<F>
where
    F: Fn(&mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, cxt: &mut Context<'_>) -> HandlerResult {
        (self.handler)(cxt)
    }

    fn name(&self) -> &str {
        "FnHandler"
    }
}

/// Wrap any [`RouteHandler`] as a [`BoxedHandler`]
pub fn boxed<H: RouteHandler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}
