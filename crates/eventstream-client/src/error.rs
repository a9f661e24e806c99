//! Error types for event-stream operations

use thiserror::Error;

/// Result type alias for event-stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors that can occur while running an event stream
#[derive(Error, Debug)]
pub enum StreamError {
    /// HTTP request or body read failed
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Transport failure reported by a non-HTTP transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request was cancelled on purpose
    #[error("Stream cancelled")]
    Cancelled,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value could not be built
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl StreamError {
    /// Create a transport error from a message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a configuration error from a message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is the explicit-cancel classification.
    ///
    /// Cancelled completions end the session; every other error is retried.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancelled() {
        assert!(StreamError::Cancelled.is_cancelled());
        assert!(!StreamError::transport("reset by peer").is_cancelled());
        assert!(!StreamError::config("bad").is_cancelled());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            StreamError::transport("reset by peer").to_string(),
            "Transport error: reset by peer"
        );
        assert_eq!(StreamError::Cancelled.to_string(), "Stream cancelled");
    }
}
