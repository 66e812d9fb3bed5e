//! Loyalty Points Ledger Core
//!
//! Append-only points ledger with per-entry and per-day tamper-evident
//! SHA-256 hashes.
//!
//! # Architecture
//!
//! - **Double entry**: every transaction writes one debit and one credit row
//! - **Single writer**: one actor task serializes all balance mutations
//! - **Atomic commits**: balances, transaction, and ledger rows land in one
//!   RocksDB `WriteBatch`
//! - **Daily seals**: a lazily created per-day digest proves the ledger has
//!   not been altered since sealing
//!
//! # Invariants
//!
//! - Conservation: customer and business balances move by the same amount in
//!   opposite directions for every transaction
//! - Pairing: exactly two ledger entries per transaction, equal magnitude,
//!   one debit and one credit
//! - Append-only: ledger rows are never rewritten, except the one-time hash
//!   backfill for legacy rows

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod audit;
pub mod backfill;
pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod storage;
pub mod types;
pub mod writer;

// Re-exports
pub use config::Config;
pub use engine::PointsLedger;
pub use error::{Error, Result};
pub use storage::Storage;
pub use types::{
    Account, AccountKind, DailyAuditHash, EarnReceipt, LedgerEntry, RedeemReceipt, Transaction,
    TransactionStatus, TransactionType,
};
