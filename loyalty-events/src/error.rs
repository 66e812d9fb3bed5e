//! Error types for the event bus

use thiserror::Error;

/// Event bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Payload deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
