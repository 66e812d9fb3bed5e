//! Single-writer actor for balance mutations
//!
//! All commands that move points are processed by one task, one at a time.
//! Each command reads the balances its predecessors committed, so there is
//! no interleaving to defend against: validation, balance math, row
//! construction, and the atomic WriteBatch all happen inside a single actor
//! turn.
//!
//! Reads that need no isolation (transactions, entries, audit rows) go
//! straight to storage and never pass through the mailbox.

use crate::{
    hash::transaction_audit_hash,
    types::{
        Account, AccountKind, EarnReceipt, RedeemReceipt, Transaction, TransactionStatus,
        TransactionType, EmissionRateConfig, MAX_DISCOUNT_RATIO, POINT_VALUE_BS,
    },
    writer, Error, Result, Storage,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Command sent to the engine actor
pub enum EngineCommand {
    /// Create an account with a zero or seeded balance
    CreateAccount {
        /// Customer or business
        kind: AccountKind,
        /// Display name
        name: String,
        /// Starting balance (business float, zero for customers)
        initial_balance: u64,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Grant points for a purchase
    Earn {
        /// Customer receiving the points
        customer_id: Uuid,
        /// Business funding the grant
        business_id: Uuid,
        /// Purchase total in currency units
        purchase_amount: Decimal,
        /// Reply channel
        response: oneshot::Sender<Result<(EarnReceipt, Transaction)>>,
    },

    /// Redeem points for a discount
    Redeem {
        /// Customer spending the points
        customer_id: Uuid,
        /// Business receiving the points back
        business_id: Uuid,
        /// Points to redeem
        points_to_redeem: u64,
        /// Ticket total in currency units
        ticket_total: Decimal,
        /// Reply channel
        response: oneshot::Sender<Result<(RedeemReceipt, Transaction)>>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Actor that processes engine commands
pub struct EngineActor {
    storage: Arc<Storage>,
    mailbox: mpsc::Receiver<EngineCommand>,
}

impl EngineActor {
    /// Create new actor
    pub fn new(storage: Arc<Storage>, mailbox: mpsc::Receiver<EngineCommand>) -> Self {
        Self { storage, mailbox }
    }

    /// Run the actor loop until shutdown or mailbox close
    pub async fn run(mut self) {
        while let Some(cmd) = self.mailbox.recv().await {
            match cmd {
                EngineCommand::Shutdown => break,

                EngineCommand::CreateAccount {
                    kind,
                    name,
                    initial_balance,
                    response,
                } => {
                    let _ = response.send(self.create_account(kind, name, initial_balance));
                }

                EngineCommand::Earn {
                    customer_id,
                    business_id,
                    purchase_amount,
                    response,
                } => {
                    let result = self.earn(customer_id, business_id, purchase_amount);
                    if let Err(e) = &result {
                        if !e.is_business_rule() {
                            tracing::error!(error = %e, "Earn command failed");
                        }
                    }
                    let _ = response.send(result);
                }

                EngineCommand::Redeem {
                    customer_id,
                    business_id,
                    points_to_redeem,
                    ticket_total,
                    response,
                } => {
                    let result =
                        self.redeem(customer_id, business_id, points_to_redeem, ticket_total);
                    if let Err(e) = &result {
                        if !e.is_business_rule() {
                            tracing::error!(error = %e, "Redeem command failed");
                        }
                    }
                    let _ = response.send(result);
                }
            }
        }

        tracing::info!("Engine actor stopped");
    }

    fn create_account(&self, kind: AccountKind, name: String, initial_balance: u64) -> Result<Account> {
        if name.trim().is_empty() {
            return Err(Error::Validation("account name must not be empty".to_string()));
        }

        let account = Account {
            id: Uuid::new_v4(),
            kind,
            name,
            points_balance: initial_balance,
        };
        self.storage.put_account(&account)?;
        Ok(account)
    }

    fn base_emission_rate(&self) -> Result<Decimal> {
        Ok(self
            .storage
            .get_emission_config(crate::types::RateType::Base)?
            .unwrap_or_else(EmissionRateConfig::default_base)
            .emission_rate)
    }

    fn earn(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        purchase_amount: Decimal,
    ) -> Result<(EarnReceipt, Transaction)> {
        if purchase_amount <= Decimal::ZERO {
            return Err(Error::Validation(
                "purchase amount must be positive".to_string(),
            ));
        }

        let mut customer = self.storage.get_account(customer_id)?;
        let mut business = self.storage.get_account(business_id)?;

        let rate = self.base_emission_rate()?;
        let points = (purchase_amount * rate)
            .floor()
            .to_u64()
            .ok_or_else(|| Error::Validation("purchase amount out of range".to_string()))?;

        if points == 0 {
            return Err(Error::Validation(
                "purchase amount too small to earn points".to_string(),
            ));
        }

        if business.points_balance < points {
            return Err(Error::InsufficientBalance(format!(
                "business {} holds {} points, needs {}",
                business.id, business.points_balance, points
            )));
        }

        business.points_balance -= points;
        customer.points_balance += points;

        let txn = self.commit(TransactionType::Earn, &business, &customer, points)?;

        let receipt = EarnReceipt {
            transaction_id: txn.id,
            points_earned: points,
            new_customer_balance: customer.points_balance,
            business_name: business.name.clone(),
        };

        Ok((receipt, txn))
    }

    fn redeem(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        points_to_redeem: u64,
        ticket_total: Decimal,
    ) -> Result<(RedeemReceipt, Transaction)> {
        if points_to_redeem == 0 {
            return Err(Error::Validation(
                "points to redeem must be positive".to_string(),
            ));
        }
        if ticket_total <= Decimal::ZERO {
            return Err(Error::Validation("ticket total must be positive".to_string()));
        }

        let mut customer = self.storage.get_account(customer_id)?;

        if customer.points_balance < points_to_redeem {
            return Err(Error::InsufficientBalance(format!(
                "customer {} holds {} points, needs {}",
                customer.id, customer.points_balance, points_to_redeem
            )));
        }

        let mut business = self.storage.get_account(business_id)?;

        let discount_value = Decimal::from(points_to_redeem) * POINT_VALUE_BS;
        let max_discount = ticket_total * MAX_DISCOUNT_RATIO;
        if discount_value > max_discount {
            return Err(Error::RedemptionCapExceeded(format!(
                "discount {} Bs exceeds cap {} Bs for ticket {}",
                discount_value, max_discount, ticket_total
            )));
        }

        customer.points_balance -= points_to_redeem;
        business.points_balance += points_to_redeem;

        let txn = self.commit(TransactionType::Redeem, &business, &customer, points_to_redeem)?;

        let receipt = RedeemReceipt {
            transaction_id: txn.id,
            points_redeemed: points_to_redeem,
            discount_value_bs: discount_value,
            new_customer_balance: customer.points_balance,
            business_name: business.name.clone(),
        };

        Ok((receipt, txn))
    }

    /// Build the transaction row, the entry pair, and commit all of it in
    /// one WriteBatch. Accounts must already carry post-mutation balances.
    fn commit(
        &self,
        txn_type: TransactionType,
        business: &Account,
        customer: &Account,
        points: u64,
    ) -> Result<Transaction> {
        let created_at = chrono::Utc::now();
        let txn = Transaction {
            id: Uuid::now_v7(),
            txn_type,
            points_amount: points,
            status: TransactionStatus::Completed,
            audit_hash: transaction_audit_hash(&created_at, business.id, customer.id, points),
            business_id: business.id,
            customer_id: customer.id,
            created_at,
        };

        let (debited, credited) = writer::movement_sides(txn_type, business, customer);
        let pair = writer::build_entry_pair(&txn, debited, credited);

        self.storage
            .commit_transaction(&txn, [business, customer], pair.rows())?;

        Ok(txn)
    }
}

/// Handle for sending commands to the actor
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<EngineCommand>) -> Self {
        Self { sender }
    }

    /// Create an account
    pub async fn create_account(
        &self,
        kind: AccountKind,
        name: String,
        initial_balance: u64,
    ) -> Result<Account> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::CreateAccount {
                kind,
                name,
                initial_balance,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Engine mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Grant points for a purchase
    pub async fn earn(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        purchase_amount: Decimal,
    ) -> Result<(EarnReceipt, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Earn {
                customer_id,
                business_id,
                purchase_amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Engine mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Redeem points for a discount
    pub async fn redeem(
        &self,
        customer_id: Uuid,
        business_id: Uuid,
        points_to_redeem: u64,
        ticket_total: Decimal,
    ) -> Result<(RedeemReceipt, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::Redeem {
                customer_id,
                business_id,
                points_to_redeem,
                ticket_total,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Engine mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(EngineCommand::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Engine mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the engine actor
pub fn spawn_engine_actor(storage: Arc<Storage>, mailbox_capacity: usize) -> EngineHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = EngineActor::new(storage, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    EngineHandle::new(tx)
}
