//! Logging abstraction layer
//!
//! The router logs through these macros so that the backend is picked at
//! compile time:
//!
//! - `log` (default) - forwards to the `log` facade
//! - `tracing` - forwards to `tracing` events
//!
//! The two features are mutually exclusive. With neither enabled the macros
//! expand to nothing.
//!
//! # Usage
//!
//! ```ignore
//! use isoroute::{debug_log, warn_log};
//!
//! debug_log!("dispatching {} {}", method, path);
//! warn_log!("handler chain for '{}' failed: {}", path, error);
//! ```

/// Trace-level logging
///
/// Per-handler chain progress, cache hits and misses.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging
///
/// Route registration, dispatch start, not-found bypasses.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Info-level logging
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Warn-level logging
///
/// Handler chain failures.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Error-level logging
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
