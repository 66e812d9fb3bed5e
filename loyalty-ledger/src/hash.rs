//! Tamper-evidence hashing for the points ledger
//!
//! This module provides:
//! - Per-entry SHA-256 digests over a pipe-joined field tuple
//! - Transaction audit hashes over the creation facts
//! - The daily fold that seals a whole UTC day of ledger rows
//!
//! Everything here is a pure function of its inputs. Timestamps are
//! formatted as ISO-8601 with millisecond precision and a `Z` suffix, and
//! the formatted string is what gets hashed, so recomputation from stored
//! rows is exact.

use crate::types::{DailyAuditHash, LedgerEntry, TransactionType};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash and the timestamp that was folded into it
///
/// The timestamp must be persisted as the row's `created_at`, otherwise
/// verification fails forever for that row.
#[derive(Debug, Clone)]
pub struct StampedHash {
    /// Hex-encoded SHA-256
    pub hash: String,
    /// Timestamp captured once for both the hash input and the row
    pub timestamp: DateTime<Utc>,
}

/// Ledger entry fields known before the row exists
///
/// The id is pre-generated by the writer so the hash covers the same id the
/// row is stored under.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// Pre-generated entry ID
    pub id: Uuid,
    /// Mirrors the owning transaction's type
    pub entry_type: TransactionType,
    /// Account this row belongs to
    pub account_id: Uuid,
    /// Points leaving the account
    pub debit: u64,
    /// Points entering the account
    pub credit: u64,
    /// Post-mutation balance of the account
    pub balance_after: u64,
    /// Owning transaction
    pub transaction_id: Uuid,
}

/// ISO-8601 with milliseconds and Z suffix, e.g. `2024-01-01T00:00:00.000Z`
pub fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Pipe-joined tuple hashed for one entry
///
/// `id|type|accountId|debit|credit|balanceAfter|transactionId|createdAt`
#[allow(clippy::too_many_arguments)]
pub fn entry_hash_input(
    id: Uuid,
    entry_type: TransactionType,
    account_id: Uuid,
    debit: u64,
    credit: u64,
    balance_after: u64,
    transaction_id: Uuid,
    created_at: &DateTime<Utc>,
) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        id,
        entry_type.code(),
        account_id,
        debit,
        credit,
        balance_after,
        transaction_id,
        iso_millis(created_at)
    )
}

fn entry_input(entry: &LedgerEntry) -> String {
    entry_hash_input(
        entry.id,
        entry.entry_type,
        entry.account_id,
        entry.debit,
        entry.credit,
        entry.balance_after,
        entry.transaction_id,
        &entry.created_at,
    )
}

/// Recompute the hash of a persisted entry from its stored fields
pub fn compute_entry_hash(entry: &LedgerEntry) -> String {
    hex_sha256(entry_input(entry).as_bytes())
}

/// Stamp a draft entry: capture one timestamp and hash the full tuple
pub fn compute_hash_for_new_entry(draft: &EntryDraft) -> StampedHash {
    let timestamp = Utc::now();
    let input = entry_hash_input(
        draft.id,
        draft.entry_type,
        draft.account_id,
        draft.debit,
        draft.credit,
        draft.balance_after,
        draft.transaction_id,
        &timestamp,
    );

    StampedHash {
        hash: hex_sha256(input.as_bytes()),
        timestamp,
    }
}

/// Recompute and compare an entry's hash
///
/// Returns false, not an error, when `hash` is absent (pre-hashing legacy
/// rows) or mismatched.
pub fn verify_entry_hash(entry: &LedgerEntry) -> bool {
    match &entry.hash {
        Some(stored) => *stored == compute_entry_hash(entry),
        None => false,
    }
}

/// Transaction audit hash over `timestamp|businessId|customerId|pointsAmount`
pub fn transaction_audit_hash(
    created_at: &DateTime<Utc>,
    business_id: Uuid,
    customer_id: Uuid,
    points_amount: u64,
) -> String {
    let input = format!(
        "{}|{}|{}|{}",
        iso_millis(created_at),
        business_id,
        customer_id,
        points_amount
    );
    hex_sha256(input.as_bytes())
}

/// Streaming fold over one UTC day of ledger entries
///
/// Entries must be absorbed in `(created_at asc, id asc)` order. Each entry
/// contributes its pipe-joined tuple; tuples are concatenated with no
/// delimiter between entries.
#[derive(Debug)]
pub struct DailyFold {
    hasher: Sha256,
    entry_count: u64,
    transaction_types: Vec<TransactionType>,
}

impl DailyFold {
    /// Start an empty fold
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            entry_count: 0,
            transaction_types: Vec::new(),
        }
    }

    /// Absorb the next entry in creation order
    pub fn absorb(&mut self, entry: &LedgerEntry) {
        self.hasher.update(entry_input(entry).as_bytes());
        self.entry_count += 1;

        if !self.transaction_types.contains(&entry.entry_type) {
            self.transaction_types.push(entry.entry_type);
        }
    }

    /// Number of entries absorbed so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Finish the fold into a sealed daily row
    pub fn seal(self, date: NaiveDate) -> DailyAuditHash {
        DailyAuditHash {
            date,
            hash: hex::encode(self.hasher.finalize()),
            entry_count: self.entry_count,
            transaction_types: self.transaction_types,
            created_at: Utc::now(),
        }
    }
}

impl Default for DailyFold {
    fn default() -> Self {
        Self::new()
    }
}
