// This file implements the application's logging system.
// It provides macros for different log levels (INFO, WARN, ERROR, DEBUG)
// with colored terminal output, and optionally mirrors every message into a
// structured log file through `tracing`.

use colored::*; // Used for adding color to log messages.
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering}; // For thread-safe, atomic control of the debug flag.
use std::sync::{Mutex, OnceLock}; // Ensures the DEBUG_ENABLED flag is initialized exactly once.
use std::time::Instant;

/// Provides convenient logging macros.
/// `#[macro_export]` makes these macros globally available within the crate.

// `log_info!` for general application progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        ::tracing::info!(target: "grover", "{}", message);
        eprintln!("{} {}", "[INFO]".bright_green(), message);
    }};
}

// `log_warn!` for non-critical issues or noteworthy conditions.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        ::tracing::warn!(target: "grover", "{}", message);
        eprintln!("{} {}", "[WARN]".bright_yellow(), message);
    }};
}

// `log_error!` for critical errors requiring immediate attention.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        ::tracing::error!(target: "grover", "{}", message);
        eprintln!("{} {}", "[ERROR]".bright_red(), message);
    }};
}

// `log_debug!` for detailed internal application tracing.
// Messages are only printed if debug mode is enabled via `is_debug_enabled()`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
            let message = format!($($arg)*);
            ::tracing::debug!(target: "grover", "{}", message);
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    };
}

// Global flag to control debug logging, ensured to be initialized once.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger, setting the global debug mode and, when `log_file` is
/// given, installing a `tracing` subscriber that appends every message to it.
/// This function should be called once at application startup.
///
/// # Arguments
/// * `debug`: If `true`, enables debug logging; otherwise, only info, warn, and error messages are printed.
/// * `log_file`: Optional path of the structured log sink.
pub fn init(debug: bool, log_file: Option<&Path>) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug)) // Initialize if not already set.
        .store(debug, Ordering::Relaxed); // Update the flag with the provided debug value.

    if let Some(path) = log_file {
        install_file_sink(path, debug);
    }

    if debug {
        log_debug!("[Grover::Logger] Logger initialized in DEBUG mode");
    }
}

fn install_file_sink(path: &Path, debug: bool) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log_warn!(
                    "[Grover::Logger] Could not create log directory {}: {}",
                    parent.display(),
                    e
                );
                return;
            }
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            log_warn!(
                "[Grover::Logger] Could not open log file {}: {}. Continuing with console logging only.",
                path.display().to_string().yellow(),
                e
            );
            return;
        }
    };

    let max_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let result = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(Mutex::new(file))
        .try_init();

    if let Err(e) = result {
        log_warn!("[Grover::Logger] Structured log sink already installed: {}", e);
    }
}

/// Checks if debug logging is currently enabled.
/// Used primarily by the `log_debug!` macro.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get() // Attempt to retrieve the AtomicBool.
        .map(|f| f.load(Ordering::Relaxed)) // Load its value if present.
        .unwrap_or(false) // Default to false if `init` was never called.
}

/// A timed operation. Created by [`begin`], finished with [`Op::complete`].
///
/// An `Op` dropped without being completed is reported as abandoned, which is
/// what happens when the work it wraps bails out with `?`.
pub struct Op {
    label: String,
    started: Instant,
    completed: bool,
}

/// Starts a timed operation and logs its beginning.
pub fn begin(label: impl Into<String>) -> Op {
    let label = label.into();
    log_info!("{}...", label);
    Op {
        label,
        started: Instant::now(),
        completed: false,
    }
}

impl Op {
    /// Marks the operation as successfully completed and logs the elapsed time.
    pub fn complete(mut self) {
        self.completed = true;
        log_info!(
            "{} completed in {} ms",
            self.label,
            self.started.elapsed().as_millis().to_string().green()
        );
    }
}

impl Drop for Op {
    fn drop(&mut self) {
        if !self.completed {
            log_warn!(
                "{} abandoned after {} ms",
                self.label,
                self.started.elapsed().as_millis()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_follows_init() {
        init(true, None);
        assert!(is_debug_enabled());
        init(false, None);
        assert!(!is_debug_enabled());
    }

    #[test]
    fn completed_op_is_marked() {
        let op = begin("Loading fixture");
        assert!(!op.completed);
        op.complete();
    }
}
