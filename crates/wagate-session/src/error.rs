//! Error types for session and credential services.

/// Error type for session and credential services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache rejected the operation.
    #[error("Cache error: {0}")]
    Cache(#[from] wagate_cache::Error),

    /// The gateway answered with a non-success status.
    #[error("Gateway error ({status}): {message}")]
    Gateway {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The session exists but cannot send messages.
    #[error("Session is not connected: {0}")]
    NotConnected(String),

    /// The credential store failed.
    #[error("Credential store error: {0}")]
    Store(String),
}

impl Error {
    /// Check if the gateway reported the session as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Gateway { status: 404, .. })
    }
}

/// Result type for session and credential services.
pub type Result<T> = std::result::Result<T, Error>;
