#![deny(missing_docs)]
//! Shared logging utilities for the songgen workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread job scope that tags log lines with the job they belong to, and
//! a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Job id attached to log lines emitted on this thread.
    static CURRENT_JOB: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Returns the job id of the innermost active [`JobScope`] on this thread.
pub fn current_job() -> Option<u64> {
    CURRENT_JOB.with(|v| v.get())
}

/// Prefix prepended by the logging macros, e.g. `"[job 3] "`.
///
/// Empty when no job scope is active.
#[doc(hidden)]
pub fn job_prefix() -> String {
    match current_job() {
        Some(job_id) => format!("[job {job_id}] "),
        None => String::new(),
    }
}

/// Tags every log line emitted on this thread with a job id until dropped.
///
/// Scopes nest; dropping one restores the id that was active before it.
/// Keep scopes synchronous: an async task may resume on another thread.
#[must_use = "the job tag is removed as soon as the scope is dropped"]
pub struct JobScope {
    previous: Option<u64>,
}

impl JobScope {
    /// Enters a scope for `job_id`.
    pub fn enter(job_id: u64) -> Self {
        let previous = CURRENT_JOB.with(|v| v.replace(Some(job_id)));
        Self { previous }
    }
}

impl Drop for JobScope {
    fn drop(&mut self) {
        CURRENT_JOB.with(|v| v.set(self.previous));
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::job_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
