//! Error handling for the gesture interpreter
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the application. Per-frame problems (noise lines, malformed
//! frames) are not errors here; they are reported as values by the pipeline.

use thiserror::Error;

/// Main error type for gesture-rs operations
#[derive(Error, Debug)]
pub enum GestureError {
    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failures terminate the current acquisition session
    #[error("Transport error: {0}")]
    Transport(String),

    /// Feature vector arity does not match the classifier input
    #[error("Inference error: expected {expected} features, got {actual}")]
    Inference { expected: usize, actual: usize },

    /// A device line exceeded the length limit and was discarded
    #[error("Line of {length} bytes exceeds the {limit} byte limit")]
    LineTooLong { length: usize, limit: usize },

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<GestureError>,
    },
}

impl GestureError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GestureError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error ends the acquisition session
    pub fn is_terminal(&self) -> bool {
        match self {
            GestureError::Transport(_) | GestureError::Io(_) => true,
            GestureError::WithContext { source, .. } => source.is_terminal(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GestureError {
    fn from(err: serde_json::Error) -> Self {
        GestureError::Serialization(err.to_string())
    }
}

/// Result type alias for gesture-rs operations
pub type Result<T> = std::result::Result<T, GestureError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
