//! Trailing-window economic metrics
//!
//! Computed from committed transactions only, so the numbers are exact: no
//! sampling, no estimation. The snapshot serializes to camelCase JSON and is
//! stored verbatim on recommendations and alerts.

use crate::Result;
use chrono::{DateTime, Duration, Utc};
use loyalty_ledger::{types::TransactionType, Storage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metrics over one trailing window of transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicMetrics {
    /// Window start (inclusive)
    pub window_start: DateTime<Utc>,

    /// Window end (exclusive)
    pub window_end: DateTime<Utc>,

    /// Points granted to customers in the window
    pub points_issued: u64,

    /// Points redeemed by customers in the window
    pub points_redeemed: u64,

    /// Committed transactions in the window
    pub transaction_count: u64,

    /// `points_redeemed / points_issued`, zero when nothing was issued
    pub redemption_rate: Decimal,
}

impl EconomicMetrics {
    /// Compute metrics for the trailing `window_days` ending at `now`
    pub fn compute(storage: &Arc<Storage>, now: DateTime<Utc>, window_days: i64) -> Result<Self> {
        let window_start = now - Duration::days(window_days);
        let txns = storage.transactions_in_window(&window_start, &now)?;

        let mut points_issued = 0u64;
        let mut points_redeemed = 0u64;
        for txn in &txns {
            match txn.txn_type {
                TransactionType::Earn => points_issued += txn.points_amount,
                TransactionType::Redeem => points_redeemed += txn.points_amount,
            }
        }

        let redemption_rate = if points_issued == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(points_redeemed) / Decimal::from(points_issued)
        };

        Ok(Self {
            window_start,
            window_end: now,
            points_issued,
            points_redeemed,
            transaction_count: txns.len() as u64,
            redemption_rate,
        })
    }
}
