//! Double-entry row construction
//!
//! Every transaction produces exactly two ledger rows of equal magnitude:
//! one debit against the account funds leave, one credit for the account
//! funds enter. Rows are hashed at construction from pre-generated ids so
//! the stored tuple is exactly what was hashed.

use crate::{
    hash::{compute_hash_for_new_entry, EntryDraft},
    types::{Account, LedgerEntry, Transaction, TransactionType},
};
use uuid::Uuid;

/// The two rows of one transaction
#[derive(Debug, Clone)]
pub struct EntryPair {
    /// Row for the account funds left
    pub debit: LedgerEntry,
    /// Row for the account funds entered
    pub credit: LedgerEntry,
}

impl EntryPair {
    /// Both rows, debit first
    pub fn rows(&self) -> [&LedgerEntry; 2] {
        [&self.debit, &self.credit]
    }
}

/// Build the paired rows for a committed-balance view of a transaction
///
/// `debited` and `credited` must already carry their post-mutation
/// balances; `balance_after` on each row is taken from them verbatim.
pub fn build_entry_pair(txn: &Transaction, debited: &Account, credited: &Account) -> EntryPair {
    EntryPair {
        debit: build_entry(txn, debited.id, txn.points_amount, 0, debited.points_balance),
        credit: build_entry(txn, credited.id, 0, txn.points_amount, credited.points_balance),
    }
}

fn build_entry(
    txn: &Transaction,
    account_id: Uuid,
    debit: u64,
    credit: u64,
    balance_after: u64,
) -> LedgerEntry {
    let draft = EntryDraft {
        id: Uuid::now_v7(),
        entry_type: txn.txn_type,
        account_id,
        debit,
        credit,
        balance_after,
        transaction_id: txn.id,
    };
    let stamped = compute_hash_for_new_entry(&draft);

    LedgerEntry {
        id: draft.id,
        entry_type: draft.entry_type,
        account_id: draft.account_id,
        debit: draft.debit,
        credit: draft.credit,
        balance_after: draft.balance_after,
        transaction_id: draft.transaction_id,
        hash: Some(stamped.hash),
        created_at: stamped.timestamp,
    }
}

/// Debit and credit sides of a transaction, in ledger terms
///
/// EARN moves points from the business to the customer; REDEEM moves them
/// back.
pub fn movement_sides<'a>(
    txn_type: TransactionType,
    business: &'a Account,
    customer: &'a Account,
) -> (&'a Account, &'a Account) {
    match txn_type {
        TransactionType::Earn => (business, customer),
        TransactionType::Redeem => (customer, business),
    }
}
