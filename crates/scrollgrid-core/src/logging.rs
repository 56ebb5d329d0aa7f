//! Logging facilities for scrollgrid.
//!
//! scrollgrid uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("scrollgrid=debug")
//!     .init();
//! ```
//!
//! Components that report lifecycle messages to their host hold a [`Logger`],
//! which tags every record with a subsystem and a category so hosts can route
//! or filter them.

use std::fmt;
use std::sync::Arc;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target, used by the UI loop.
    pub const CORE: &str = "scrollgrid_core";
    /// Signal emission target.
    pub const SIGNAL: &str = "scrollgrid_core::signal";
    /// Grid controller target.
    pub const CONTROLLER: &str = "scrollgrid::controller";
    /// Layout engine target.
    pub const LAYOUT: &str = "scrollgrid::layout";
    /// Content lifecycle target.
    pub const LIFECYCLE: &str = "scrollgrid::lifecycle";
    /// View tree target.
    pub const VIEW_TREE: &str = "scrollgrid::view_tree";
    /// Host-facing messages emitted through [`Logger`](super::Logger).
    pub const HOST: &str = "scrollgrid::host";
    /// Performance spans.
    pub const PERF: &str = "scrollgrid::perf";
}

/// A tagged logger handed to grid components by their host.
///
/// Cloning is cheap; clones share subsystem and category strings.
#[derive(Clone)]
pub struct Logger {
    subsystem: Arc<str>,
    category: Arc<str>,
    enabled: bool,
}

impl Logger {
    /// Create a logger for the given subsystem and category.
    pub fn new(subsystem: impl Into<Arc<str>>, category: impl Into<Arc<str>>) -> Self {
        Self {
            subsystem: subsystem.into(),
            category: category.into(),
            enabled: true,
        }
    }

    /// A logger that drops every message.
    pub fn disabled() -> Self {
        Self {
            subsystem: Arc::from(""),
            category: Arc::from(""),
            enabled: false,
        }
    }

    /// The subsystem tag.
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// The category tag.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether messages are forwarded to `tracing`.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log a debug-level message.
    pub fn debug(&self, message: &str) {
        if self.enabled {
            tracing::debug!(
                target: targets::HOST,
                subsystem = %self.subsystem,
                category = %self.category,
                "{message}"
            );
        }
    }

    /// Log a warning.
    pub fn warn(&self, message: &str) {
        if self.enabled {
            tracing::warn!(
                target: targets::HOST,
                subsystem = %self.subsystem,
                category = %self.category,
                "{message}"
            );
        }
    }

    /// Log an error.
    pub fn error(&self, message: &str) {
        if self.enabled {
            tracing::error!(
                target: targets::HOST,
                subsystem = %self.subsystem,
                category = %self.category,
                "{message}"
            );
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("scrollgrid", "GridScrollController")
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("subsystem", &self.subsystem)
            .field("category", &self.category)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing layout and reload passes.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Trace-level event under the core target.
#[macro_export]
macro_rules! ui_trace {
    ($($arg:tt)*) => {
        $crate::tracing::trace!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

/// Debug-level event under the core target.
#[macro_export]
macro_rules! ui_debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: $crate::logging::targets::CORE, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let writer = CaptureWriter::default();
        let sink = writer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = writer.0.lock().clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_logger_tags_messages() {
        let logger = Logger::new("com.example.feed", "grid");
        let output = capture(|| logger.debug("End refreshing."));

        assert!(output.contains("End refreshing."));
        assert!(output.contains("com.example.feed"));
        assert!(output.contains("grid"));
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let logger = Logger::disabled();
        let output = capture(|| logger.warn("should not appear"));
        assert!(!logger.is_enabled());
        assert!(output.is_empty());
    }

    #[test]
    fn test_perf_span() {
        // Just ensure it compiles and doesn't panic
        let output = capture(|| {
            let _span = PerfSpan::new("reload");
            crate::ui_debug!("inside span");
        });
        assert!(output.contains("inside span"));
    }
}
