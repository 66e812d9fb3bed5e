//! Error types for the alerting subscriber

use thiserror::Error;

/// Result type for alerting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Alerting errors
#[derive(Error, Debug)]
pub enum Error {
    /// Propagated ledger/storage error
    #[error(transparent)]
    Ledger(#[from] loyalty_ledger::Error),

    /// Propagated metrics error
    #[error(transparent)]
    Economy(#[from] loyalty_economy::Error),

    /// Snapshot or payload (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
