//! Core types for the points ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (u64 points, Decimal for currency values)
//! - Reproducible hashing (fields stamped once, never recomputed)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed conversion rate: 1 point = 0.03 currency units (Bs)
pub const POINT_VALUE_BS: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// Redemption value may not exceed this share of the ticket total
pub const MAX_DISCOUNT_RATIO: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Account kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AccountKind {
    /// End customer earning and redeeming points
    Customer = 1,
    /// Business funding point issuance
    Business = 2,
}

/// Account holding a point balance
///
/// The balance is mutated only by the transaction engine, inside a single
/// storage write batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID
    pub id: Uuid,

    /// Customer or business
    pub kind: AccountKind,

    /// Display name
    pub name: String,

    /// Non-negative point balance
    pub points_balance: u64,
}

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TransactionType {
    /// Business grants points to a customer
    Earn = 1,
    /// Customer redeems points for a discount
    Redeem = 2,
}

impl TransactionType {
    /// Wire/hash representation
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Earn => "EARN",
            TransactionType::Redeem => "REDEEM",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transaction status
///
/// Rows are written only when the whole unit commits, so no in-flight
/// status is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TransactionStatus {
    /// Balance movement committed with both ledger rows
    Completed = 1,
}

/// Immutable balance-movement event
///
/// The single source of truth for one movement. `audit_hash` covers the
/// creation facts and is distinct from the per-entry ledger hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// EARN or REDEEM
    #[serde(rename = "type")]
    pub txn_type: TransactionType,

    /// Points moved (positive)
    pub points_amount: u64,

    /// Status
    pub status: TransactionStatus,

    /// SHA-256 over `timestamp|businessId|customerId|pointsAmount`
    pub audit_hash: String,

    /// Business side of the movement
    pub business_id: Uuid,

    /// Customer side of the movement
    pub customer_id: Uuid,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One debit or credit row tied to a transaction and an account
///
/// Exactly one of `debit`/`credit` is non-zero. `hash` is stamped at
/// creation from a pre-generated id and timestamp so it can be recomputed
/// later; `None` only on legacy rows awaiting backfill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID (UUIDv7, pre-generated before hashing)
    pub id: Uuid,

    /// Mirrors the owning transaction's type
    pub entry_type: TransactionType,

    /// Account this row belongs to
    pub account_id: Uuid,

    /// Points leaving the account
    pub debit: u64,

    /// Points entering the account
    pub credit: u64,

    /// Account balance after the mutation committed
    pub balance_after: u64,

    /// Owning transaction
    pub transaction_id: Uuid,

    /// Tamper-evident SHA-256, None for pre-hashing legacy rows
    pub hash: Option<String>,

    /// Creation timestamp (also the hash input timestamp)
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// True if funds left the account
    pub fn is_debit(&self) -> bool {
        self.debit > 0
    }

    /// Magnitude of the movement (one side is always zero)
    pub fn amount(&self) -> u64 {
        self.debit + self.credit
    }
}

/// One sealed digest per UTC calendar day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAuditHash {
    /// UTC day the seal covers
    pub date: NaiveDate,

    /// Fold of all entry tuples for the day, in creation order
    pub hash: String,

    /// Number of entries folded
    pub entry_count: u64,

    /// Transaction types seen, de-duplicated in first-occurrence order
    pub transaction_types: Vec<TransactionType>,

    /// Seal timestamp
    pub created_at: DateTime<Utc>,
}

/// Result of `earn_points`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnReceipt {
    /// Committed transaction ID
    pub transaction_id: Uuid,
    /// Points granted
    pub points_earned: u64,
    /// Customer balance after commit
    pub new_customer_balance: u64,
    /// Granting business name
    pub business_name: String,
}

/// Result of `redeem_points`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemReceipt {
    /// Committed transaction ID
    pub transaction_id: Uuid,
    /// Points redeemed
    pub points_redeemed: u64,
    /// Discount granted, in currency units
    pub discount_value_bs: Decimal,
    /// Customer balance after commit
    pub new_customer_balance: u64,
    /// Redeeming business name
    pub business_name: String,
}

/// Emission rate type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RateType {
    /// Base issuance multiplier
    Base = 1,
}

impl RateType {
    /// Wire representation
    pub fn code(&self) -> &'static str {
        match self {
            RateType::Base => "BASE",
        }
    }
}

/// Emission rate configuration, one row per rate type
///
/// Mutated only by applying an approved recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionRateConfig {
    /// Rate type
    pub rate_type: RateType,

    /// Decimal multiplier applied to point issuance
    pub emission_rate: Decimal,

    /// When the rate was last adjusted
    pub last_adjusted_at: Option<DateTime<Utc>>,

    /// Who approved the last adjustment
    pub last_adjusted_by: Option<String>,
}

impl EmissionRateConfig {
    /// Default BASE config (multiplier 1.0, never adjusted)
    pub fn default_base() -> Self {
        Self {
            rate_type: RateType::Base,
            emission_rate: Decimal::ONE,
            last_adjusted_at: None,
            last_adjusted_by: None,
        }
    }
}

/// Recommendation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum RecommendationStatus {
    /// Awaiting an admin decision
    Pending = 1,
    /// Approved and applied to the rate config
    Approved = 2,
    /// Rejected by an admin
    Rejected = 3,
    /// Acted on after the expiry deadline
    Expired = 4,
}

/// Emission-rate adjustment proposed by the control loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionRecommendation {
    /// Recommendation ID
    pub id: Uuid,

    /// Rate in force when the recommendation was created
    pub current_emission_rate: Decimal,

    /// Proposed new rate
    pub recommended_emission_rate: Decimal,

    /// Fractional cut applied to the current rate
    pub adjustment_percentage: Decimal,

    /// Human-readable justification
    pub reason: String,

    /// Trailing 30-day redemption rate at creation
    pub redemption_rate_30d: Decimal,

    /// JSON snapshot of the window metrics at creation
    pub metrics_snapshot: String,

    /// Lifecycle state
    pub status: RecommendationStatus,

    /// Deciding actor (set on approve and on reject)
    pub approved_by: Option<String>,

    /// Decision timestamp
    pub approved_at: Option<DateTime<Utc>>,

    /// When the rate config was updated
    pub applied_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Deadline after which the recommendation can no longer be applied
    pub expires_at: DateTime<Utc>,
}

impl EmissionRecommendation {
    /// True if the expiry deadline has passed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Economic alert type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AlertType {
    /// Outstanding points exceed the healthy share of all points issued
    ActivePointsRatioHigh = 1,
    /// Trailing redemption rate fell below the healthy floor
    RedemptionRateLow = 2,
}

impl AlertType {
    /// Wire/cache-key representation
    pub fn code(&self) -> &'static str {
        match self {
            AlertType::ActivePointsRatioHigh => "ACTIVE_POINTS_RATIO_HIGH",
            AlertType::RedemptionRateLow => "REDEMPTION_RATE_LOW",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AlertSeverity {
    /// Soft breach, worth watching
    Warning = 1,
    /// Hard breach, needs action
    Critical = 2,
}

/// Alert raised by the real-time monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicAlert {
    /// Alert ID
    pub id: Uuid,

    /// What threshold was breached
    pub alert_type: AlertType,

    /// Severity
    pub severity: AlertSeverity,

    /// Human-readable description
    pub message: String,

    /// JSON snapshot of the metrics at breach time
    pub metrics_snapshot: String,

    /// Acknowledged by an operator
    pub acknowledged: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_value_constants() {
        assert_eq!(POINT_VALUE_BS.to_string(), "0.03");
        assert_eq!(MAX_DISCOUNT_RATIO.to_string(), "0.30");
    }

    #[test]
    fn test_transaction_type_code() {
        assert_eq!(TransactionType::Earn.code(), "EARN");
        assert_eq!(TransactionType::Redeem.code(), "REDEEM");
    }

    #[test]
    fn test_entry_amount_and_side() {
        let entry = LedgerEntry {
            id: Uuid::now_v7(),
            entry_type: TransactionType::Earn,
            account_id: Uuid::new_v4(),
            debit: 150,
            credit: 0,
            balance_after: 50,
            transaction_id: Uuid::now_v7(),
            hash: None,
            created_at: Utc::now(),
        };
        assert!(entry.is_debit());
        assert_eq!(entry.amount(), 150);
    }

    #[test]
    fn test_transaction_serializes_camel_case() {
        let txn = Transaction {
            id: Uuid::now_v7(),
            txn_type: TransactionType::Earn,
            points_amount: 150,
            status: TransactionStatus::Completed,
            audit_hash: "ab".to_string(),
            business_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&txn).unwrap();
        assert_eq!(value["type"], "EARN");
        assert_eq!(value["pointsAmount"], 150);
        assert!(value["auditHash"].is_string());
    }

    #[test]
    fn test_recommendation_expiry() {
        let now = Utc::now();
        let rec = EmissionRecommendation {
            id: Uuid::now_v7(),
            current_emission_rate: Decimal::ONE,
            recommended_emission_rate: Decimal::new(9, 1),
            adjustment_percentage: Decimal::new(10, 2),
            reason: "low redemption".to_string(),
            redemption_rate_30d: Decimal::new(10, 2),
            metrics_snapshot: "{}".to_string(),
            status: RecommendationStatus::Pending,
            approved_by: None,
            approved_at: None,
            applied_at: None,
            created_at: now - chrono::Duration::days(8),
            expires_at: now - chrono::Duration::days(1),
        };

        assert!(rec.is_expired_at(now));
        assert!(!rec.is_expired_at(now - chrono::Duration::days(2)));
    }

    #[test]
    fn test_default_base_rate() {
        let config = EmissionRateConfig::default_base();
        assert_eq!(config.emission_rate, Decimal::ONE);
        assert!(config.last_adjusted_at.is_none());
    }
}
