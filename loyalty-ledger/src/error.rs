//! Error types for the points ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input, caller's fault
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing account, transaction, or audit row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Account balance cannot cover the requested movement
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Redemption value exceeds the allowed share of the ticket total
    #[error("Redemption cap exceeded: {0}")]
    RedemptionCapExceeded(String),

    /// Entity is not in a state that permits the operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Acted on after the expiry deadline
    #[error("Expired: {0}")]
    Expired(String),

    /// Audit hash mismatch, ledger rows were mutated after sealing
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Storage error (RocksDB), retryable at the storage layer only
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// True for business-rule failures that must be surfaced to the caller
    /// untouched, never retried
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotFound(_)
                | Error::InsufficientBalance(_)
                | Error::RedemptionCapExceeded(_)
                | Error::InvalidState(_)
                | Error::Expired(_)
        )
    }
}
