//! Error types for Tiergate.

use thiserror::Error;

/// Main error type for Tiergate operations.
///
/// A denied request is not an error; it is reported as `Ok(false)`.
#[derive(Error, Debug)]
pub enum TiergateError {
    /// Configuration-related errors: invalid quotas, unknown or
    /// unregistered tiers, malformed configuration files.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied input rejected before touching limiter state.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tiergate operations.
pub type Result<T> = std::result::Result<T, TiergateError>;

impl From<::config::ConfigError> for TiergateError {
    fn from(err: ::config::ConfigError) -> Self {
        TiergateError::Config(err.to_string())
    }
}
