//! Error handling for the router
//!
//! Two kinds of failure exist:
//!
//! - [`RouterError`] is returned synchronously from registration calls
//!   (duplicate names, malformed patterns, empty handler chains).
//! - [`HandlerFailure`] is produced when a handler returns `Err` or calls
//!   [`Context::fail`](crate::Context::fail). It never escapes a dispatcher:
//!   it is delivered through the `error` event and, on the server, handed to
//!   the host's continuation.
//!
//! A route that does not match is not an error at all; it is reported with
//! the `notFound` event.

use http::Method;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type returned by route handlers.
///
/// Returning `Err` aborts the rest of the handler chain.
pub type HandlerResult = anyhow::Result<()>;

/// Errors raised while configuring a router
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A route with the same name is already registered for this method
    #[error("route name '{name}' is already registered for {method}")]
    NameConflict { name: String, method: Method },

    /// The path pattern could not be compiled
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route was registered without any handler
    #[error("route '{path}' must have at least one handler")]
    EmptyHandlerChain { path: String },

    /// A URL handed to the router could not be parsed
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RouterError {
    /// Check if this is a name conflict
    pub fn is_name_conflict(&self) -> bool {
        matches!(self, RouterError::NameConflict { .. })
    }

    /// Check if this is a pattern error
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(self, RouterError::InvalidPattern { .. })
    }
}

/// A failure raised inside a handler chain.
///
/// Cloning is cheap: every clone shares the same underlying error, so the
/// value passed to the host continuation and the one carried by the `error`
/// event are the same error.
#[derive(Clone)]
pub struct HandlerFailure {
    inner: Arc<anyhow::Error>,
}

impl HandlerFailure {
    /// Create a failure from a plain message
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::from(anyhow::Error::msg(message))
    }

    /// Borrow the underlying error
    pub fn error(&self) -> &anyhow::Error {
        &self.inner
    }

    /// Try to view the failure as a concrete error type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Check whether two values refer to the same failure
    pub fn same_as(&self, other: &HandlerFailure) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<anyhow::Error> for HandlerFailure {
    fn from(error: anyhow::Error) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerFailure").field(&*self.inner).finish()
    }
}

impl std::error::Error for HandlerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

// ============================================================================
// Tests
// ============================================================================
