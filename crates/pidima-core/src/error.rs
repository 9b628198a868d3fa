//! Conversation engine errors.

use thiserror::Error;

/// Errors surfaced by the conversation engine.
///
/// Most operations on the conversation itself are total and never return
/// these; they come from configuration, custom intent rules and storage
/// backends.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Storage backend I/O failure.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted log could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Intent rule pattern failed to compile.
    #[error("Invalid intent pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Timing or other configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
