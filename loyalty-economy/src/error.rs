//! Error types for the economic control loop

use thiserror::Error;

/// Result type for economy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Economy errors
#[derive(Error, Debug)]
pub enum Error {
    /// Propagated ledger/storage error
    #[error(transparent)]
    Ledger(#[from] loyalty_ledger::Error),

    /// Metrics snapshot could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed scheduler run time
    #[error("Invalid run time: {0}")]
    InvalidRunTime(String),
}
