#![deny(missing_docs)]
//! Shared logging utilities for the scrape worker workspace.
//!
//! This crate provides the `worker_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every record emitted
//! through the macros is prefixed with the identity of the running worker, so a
//! log line can always be traced back to the process that produced it.

use std::sync::OnceLock;

#[doc(hidden)]
pub use log;

/// Placeholder identity used until [`set_worker_id`] has been called.
pub const UNSET_WORKER_ID: &str = "-";

static WORKER_ID: OnceLock<String> = OnceLock::new();

/// Records the identity of this worker for the rest of the process lifetime.
///
/// Returns `false` if an identity was already recorded; the first one wins.
pub fn set_worker_id(id: impl Into<String>) -> bool {
    WORKER_ID.set(id.into()).is_ok()
}

/// Returns the recorded worker identity, or [`UNSET_WORKER_ID`].
pub fn worker_id() -> &'static str {
    WORKER_ID.get().map(String::as_str).unwrap_or(UNSET_WORKER_ID)
}

/// Logs a trace-level message tagged with the worker identity.
#[macro_export]
macro_rules! worker_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("[{}] {}", $crate::worker_id(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the worker identity.
#[macro_export]
macro_rules! worker_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("[{}] {}", $crate::worker_id(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the worker identity.
#[macro_export]
macro_rules! worker_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("[{}] {}", $crate::worker_id(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the worker identity.
#[macro_export]
macro_rules! worker_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("[{}] {}", $crate::worker_id(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the worker identity.
#[macro_export]
macro_rules! worker_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("[{}] {}", $crate::worker_id(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_identity_wins() {
        assert!(set_worker_id("worker-a"));
        assert!(!set_worker_id("worker-b"));
        assert_eq!(worker_id(), "worker-a");
        worker_info!("identity recorded: {}", worker_id());
    }
}
