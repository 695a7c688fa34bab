//! Error types for Hitwindow.

use thiserror::Error;

/// Main error type for Hitwindow operations.
#[derive(Error, Debug)]
pub enum HitwindowError {
    /// The limiter was called with an empty name, a zero interval or a zero threshold.
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),

    /// The counter store could not be reached or rejected the batch.
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// The counter store answered with a reply of unexpected shape.
    #[error("Malformed counter store response: {0}")]
    MalformedResponse(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Hitwindow operations.
pub type Result<T> = std::result::Result<T, HitwindowError>;
