//! Public facade over the engine actor
//!
//! `PointsLedger` owns the storage handle, the actor handle, the metrics
//! registry, and the event bus. Balance-mutating calls go through the actor;
//! reads go straight to storage. Successful transactions are published on
//! `transaction.completed` after the commit; publish problems are logged and
//! never surfaced to the caller.

use crate::{
    actor::{spawn_engine_actor, EngineHandle},
    metrics::Metrics,
    types::{Account, AccountKind, EarnReceipt, LedgerEntry, RedeemReceipt, Transaction},
    Config, Error, Result, Storage,
};
use loyalty_events::{EventBus, Topic};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// The points ledger service
#[derive(Clone)]
pub struct PointsLedger {
    handle: EngineHandle,
    storage: Arc<Storage>,
    metrics: Arc<Metrics>,
    bus: EventBus,
}

impl PointsLedger {
    /// Open storage and spawn the engine actor
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(config)?);
        let handle = spawn_engine_actor(storage.clone(), config.engine.mailbox_capacity);
        let metrics = Arc::new(Metrics::new()?);

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            "Points ledger started"
        );

        Ok(Self {
            handle,
            storage,
            metrics,
            bus: EventBus::default(),
        })
    }

    /// Replace the event bus (shared with other services)
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    /// Create a customer or business account
    pub async fn create_account(
        &self,
        kind: AccountKind,
        name: impl Into<String>,
        initial_balance: u64,
    ) -> Result<Account> {
        self.handle
            .create_account(kind, name.into(), initial_balance)
            .await
    }

    /// Grant points to a customer for a purchase
    pub async fn earn_points(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        purchase_amount: Decimal,
    ) -> Result<EarnReceipt> {
        let timer = self.metrics.command_duration_seconds.start_timer();
        let result = self
            .handle
            .earn(customer_id, business_id, purchase_amount)
            .await;
        timer.observe_duration();

        match result {
            Ok((receipt, txn)) => {
                self.metrics.record_transaction(txn.txn_type, txn.points_amount);
                self.publish_completed(&txn);
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.record_rejection(rejection_kind(&e));
                Err(e)
            }
        }
    }

    /// Redeem customer points for a discount
    pub async fn redeem_points(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        points_to_redeem: u64,
        ticket_total: Decimal,
    ) -> Result<RedeemReceipt> {
        let timer = self.metrics.command_duration_seconds.start_timer();
        let result = self
            .handle
            .redeem(customer_id, business_id, points_to_redeem, ticket_total)
            .await;
        timer.observe_duration();

        match result {
            Ok((receipt, txn)) => {
                self.metrics.record_transaction(txn.txn_type, txn.points_amount);
                self.publish_completed(&txn);
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.record_rejection(rejection_kind(&e));
                Err(e)
            }
        }
    }

    fn publish_completed(&self, txn: &Transaction) {
        match serde_json::to_value(txn) {
            Ok(payload) => {
                self.bus.publish(Topic::TransactionCompleted, payload);
            }
            Err(e) => {
                tracing::warn!(
                    transaction_id = %txn.id,
                    error = %e,
                    "Could not serialize transaction for publish"
                );
            }
        }
    }

    /// Get account by id
    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        self.storage.get_account(id)
    }

    /// Get transaction by id
    pub fn get_transaction(&self, id: Uuid) -> Result<Transaction> {
        self.storage.get_transaction(id)
    }

    /// Both ledger rows of a transaction
    pub fn entries_for_transaction(&self, transaction_id: Uuid) -> Result<Vec<LedgerEntry>> {
        self.storage.entries_for_transaction(transaction_id)
    }

    /// Shared storage handle (audit, economy, backfill)
    pub fn storage(&self) -> Arc<Storage> {
        self.storage.clone()
    }

    /// Metrics handle
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Event bus handle
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    /// Stop the engine actor
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

fn rejection_kind(e: &Error) -> &'static str {
    match e {
        Error::Validation(_) => "validation",
        Error::NotFound(_) => "not_found",
        Error::InsufficientBalance(_) => "insufficient_balance",
        Error::RedemptionCapExceeded(_) => "redemption_cap",
        Error::InvalidState(_) => "invalid_state",
        Error::Expired(_) => "expired",
        Error::IntegrityViolation(_) => "integrity",
        Error::Storage(_) => "storage",
        Error::Serialization(_) => "serialization",
        Error::Concurrency(_) => "concurrency",
        Error::Config(_) => "config",
        Error::Io(_) => "io",
    }
}
