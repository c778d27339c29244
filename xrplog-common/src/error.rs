//! Common error types for XRPLog

use thiserror::Error;

/// Common result type for XRPLog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure error types shared across XRPLog crates
///
/// Classification failures are not represented here; they are values of
/// [`crate::classify::ClassifyError`] and flow to subscribers as events.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// WebSocket transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
