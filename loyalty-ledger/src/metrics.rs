//! Prometheus metrics for the points ledger
//!
//! Counters live in an owned registry so multiple instances (tests, side
//! tools) never collide on registration.

use crate::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Ledger metrics
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    /// Committed transactions by type
    pub transactions_total: IntCounterVec,

    /// Rejected commands by error kind
    pub rejections_total: IntCounterVec,

    /// Points granted to customers
    pub points_issued_total: IntCounter,

    /// Points redeemed by customers
    pub points_redeemed_total: IntCounter,

    /// Daily audit hashes sealed
    pub daily_seals_total: IntCounter,

    /// Daily hash verifications that failed
    pub integrity_failures_total: IntCounter,

    /// End-to-end command latency (seconds)
    pub command_duration_seconds: Histogram,
}

impl Metrics {
    /// Create metrics registered into a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let transactions_total = IntCounterVec::new(
            Opts::new("loyalty_transactions_total", "Committed transactions by type"),
            &["type"],
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("loyalty_rejections_total", "Rejected commands by error kind"),
            &["kind"],
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let points_issued_total = IntCounter::new(
            "loyalty_points_issued_total",
            "Points granted to customers",
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let points_redeemed_total = IntCounter::new(
            "loyalty_points_redeemed_total",
            "Points redeemed by customers",
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let daily_seals_total = IntCounter::new(
            "loyalty_daily_seals_total",
            "Daily audit hashes sealed",
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let integrity_failures_total = IntCounter::new(
            "loyalty_integrity_failures_total",
            "Daily hash verifications that failed",
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        let command_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "loyalty_command_duration_seconds",
                "End-to-end command latency",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )
        .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        registry
            .register(Box::new(transactions_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(rejections_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(points_issued_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(points_redeemed_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(daily_seals_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(integrity_failures_total.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;
        registry
            .register(Box::new(command_duration_seconds.clone()))
            .map_err(|e| crate::Error::Config(format!("metrics: {}", e)))?;

        Ok(Self {
            registry,
            transactions_total,
            rejections_total,
            points_issued_total,
            points_redeemed_total,
            daily_seals_total,
            integrity_failures_total,
            command_duration_seconds,
        })
    }

    /// Registry for scrape endpoints
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a committed transaction
    pub fn record_transaction(&self, txn_type: crate::types::TransactionType, points: u64) {
        self.transactions_total
            .with_label_values(&[txn_type.code()])
            .inc();
        match txn_type {
            crate::types::TransactionType::Earn => self.points_issued_total.inc_by(points),
            crate::types::TransactionType::Redeem => self.points_redeemed_total.inc_by(points),
        }
    }

    /// Record a rejected command
    pub fn record_rejection(&self, kind: &str) {
        self.rejections_total.with_label_values(&[kind]).inc();
    }
}
