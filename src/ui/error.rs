//! UI error types

use thiserror::Error;

/// Errors that can occur in UI operations
#[derive(Debug, Error)]
pub enum UiError {
    /// Terminal setup, drawing, or input failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The terminal browser needs an interactive terminal
    #[error("Not a terminal: {0}")]
    NotATerminal(&'static str),
}

/// Result type for UI operations
pub type Result<T> = std::result::Result<T, UiError>;
