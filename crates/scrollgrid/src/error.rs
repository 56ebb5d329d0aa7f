//! Error and diagnostic types for the grid.

use std::collections::VecDeque;

use scrollgrid_core::LoopError;
use scrollgrid_core::logging::targets;

use crate::view_tree::ViewTreeError;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// How many absorbed errors a controller remembers.
pub const MAX_DIAGNOSTICS: usize = 64;

/// Errors that can occur in the grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// A configuration value is outside its allowed range.
    #[error("Invalid value for '{field}': {reason}")]
    Configuration { field: &'static str, reason: String },

    /// A grid position resolved to an index past the end of the content.
    #[error("Index {index} is out of range for {count} controllers")]
    IndexOutOfRange { index: usize, count: usize },

    /// The shared view tree rejected an operation.
    #[error("View tree error: {0}")]
    View(#[from] ViewTreeError),

    /// The UI loop is gone.
    #[error("UI loop error: {0}")]
    Loop(#[from] LoopError),
}

impl GridError {
    /// Create a configuration error.
    pub fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

/// An error that was absorbed instead of propagated.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// What the grid was doing when the error occurred.
    pub context: &'static str,
    /// The absorbed error.
    pub error: GridError,
}

/// Bounded log of the most recent absorbed errors.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    total: u64,
}

impl Diagnostics {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an absorbed error, evicting the oldest entry when full.
    pub fn record(&mut self, context: &'static str, error: GridError) {
        tracing::warn!(target: targets::CONTROLLER, context, %error, "absorbed grid error");
        if self.entries.len() == MAX_DIAGNOSTICS {
            self.entries.pop_front();
        }
        self.entries.push_back(Diagnostic { context, error });
        self.total += 1;
    }

    /// Entries currently held, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&Diagnostic> {
        self.entries.back()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of errors recorded over the log's lifetime, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Drop every held entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
