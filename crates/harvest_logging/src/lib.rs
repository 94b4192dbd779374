#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `harvest_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.
//!
//! A harvest run is a single cooperative flow on one thread, so the page that
//! is currently being loaded is tracked in a thread-local and prefixed to each
//! message as `[page N]`.

use std::cell::Cell;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Thread-local storage for the listing page currently being processed.
    static CURRENT_PAGE: Cell<u32> = const { Cell::new(0) };
}

/// Sets the listing page index for the current thread.
/// The harvest loop calls this whenever a new page is loaded; 0 clears it.
pub fn set_current_page(page: u32) {
    CURRENT_PAGE.with(|v| v.set(page));
}

/// Retrieves the listing page index for the current thread.
/// Returns 0 if no page is being processed.
pub fn current_page() -> u32 {
    CURRENT_PAGE.with(|v| v.get())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __harvest_log {
    ($level:expr, $($arg:tt)*) => {{
        let page = $crate::current_page();
        if page == 0 {
            $crate::__log::log!($level, $($arg)*);
        } else {
            $crate::__log::log!($level, "[page {}] {}", page, format_args!($($arg)*));
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_trace {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!($crate::__log::Level::Trace, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_debug {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!($crate::__log::Level::Debug, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_info {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!($crate::__log::Level::Info, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_warn {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!($crate::__log::Level::Warn, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! harvest_error {
    ($($arg:tt)*) => {{
        $crate::__harvest_log!($crate::__log::Level::Error, $($arg)*);
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
    fn current_page_is_per_thread() {
        set_current_page(4);
        assert_eq!(current_page(), 4);
        let other = std::thread::spawn(current_page).join().unwrap();
        assert_eq!(other, 0);
        set_current_page(0);
        assert_eq!(current_page(), 0);
    }

    #[test]
    fn macros_accept_format_arguments() {
        initialize_for_tests();
        set_current_page(2);
        harvest_info!("rows={} page_total={}", 3, 7);
        harvest_debug!("plain message");
        set_current_page(0);
        harvest_warn!("no page context {}", "here");
    }
}
