//! # Error Types
//!
//! Custom error types for ROV Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for ROV Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors (open, write, read)
    #[error("Serial error: {0}")]
    Serial(String),

    /// Controller backend errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// Command frame encoding errors
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type alias for ROV Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
