//! One-time hash backfill for legacy ledger rows
//!
//! Rows written before per-entry hashing carry `hash = None` and fail
//! verification. The backfill recomputes each hash from the stored fields
//! and persists it. Per-row failures are counted and skipped so one bad row
//! never aborts the run.

use crate::{hash, Result, Storage};
use std::sync::Arc;

/// Outcome of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Rows found without a hash
    pub scanned: u64,
    /// Rows updated with a recomputed hash
    pub updated: u64,
    /// Rows that could not be updated
    pub failed: u64,
}

/// Hash every legacy row that still lacks one
pub fn backfill_entry_hashes(storage: &Arc<Storage>) -> Result<BackfillReport> {
    let legacy = storage.entries_missing_hash()?;
    let mut report = BackfillReport {
        scanned: legacy.len() as u64,
        ..Default::default()
    };

    for mut entry in legacy {
        entry.hash = Some(hash::compute_entry_hash(&entry));
        match storage.put_entry_hash(&entry) {
            Ok(()) => report.updated += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(entry_id = %entry.id, error = %e, "Backfill failed for entry");
            }
        }
    }

    tracing::info!(
        scanned = report.scanned,
        updated = report.updated,
        failed = report.failed,
        "Hash backfill finished"
    );

    Ok(report)
}
