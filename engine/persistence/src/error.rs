//! Error types for the value store

use thiserror::Error;

/// Result type alias for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Errors that can occur in the value store
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Values and trades were keyed by different items
    #[error("Values and trades must cover the same items; mismatched: {}", .0.join(", "))]
    KeyMismatch(Vec<String>),

    /// Store used before `initialize`
    #[error("Value store not initialized")]
    NotInitialized,
}

impl PersistenceError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
