//! Common error types for zemer

use thiserror::Error;

/// Common result type for zemer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the zemer crates
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream page fetch failed or timed out
    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    /// Requested resource not found (e.g. a page with no recordings)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Archive assembly or streaming error
    #[error("Archive error: {0}")]
    Archive(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server error
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
