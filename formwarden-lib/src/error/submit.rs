//! Submit helper error types

use std::time::Duration;

/// Errors that can occur while sending form data to an endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A custom transport failed.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SubmitError {
    /// Creates a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
