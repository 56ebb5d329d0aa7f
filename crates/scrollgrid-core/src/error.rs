//! Error types for the scrollgrid UI loop.

use std::fmt;

/// The main error type for UI loop operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    /// The loop that owned the queue has been dropped.
    LoopClosed,
}

impl fmt::Display for LoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopClosed => write!(f, "The UI loop has been dropped"),
        }
    }
}

impl std::error::Error for LoopError {}

/// A specialized Result type for UI loop operations.
pub type Result<T> = std::result::Result<T, LoopError>;
