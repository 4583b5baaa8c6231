//! Error types for the pusher framework.

use thiserror::Error;

/// Result type alias using [`FrameworkError`].
pub type Result<T> = std::result::Result<T, FrameworkError>;

/// Errors raised by process plumbing (logging, signals, task management).
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// Logging could not be initialized.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// Invalid log filter directive.
    #[error("Invalid log level '{level}': {message}")]
    LogLevel { level: String, message: String },

    /// Signal handler registration failed.
    #[error("Failed to listen for {signal}: {source}")]
    Signal {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FrameworkError {
    /// Create a logging initialization error.
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}
