//! Error types for cache operations.

/// Error type for cache operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key was empty or otherwise unusable.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// A TTL or interval was negative, zero where a positive value is
    /// required, or too large to represent.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// The cache was destroyed and can no longer be used.
    #[error("Cache has been destroyed")]
    CacheClosed,
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
