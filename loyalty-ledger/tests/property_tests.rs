//! Property-based tests for the points ledger
//!
//! Random EARN/REDEEM sequences against a real RocksDB instance, checking
//! the invariants that must hold for any interleaving: point conservation,
//! entry pairing, hash verification, and daily-seal determinism.

use chrono::Utc;
use loyalty_ledger::{
    audit::AuditService,
    hash,
    types::{AccountKind, TransactionType},
    Config, Error, PointsLedger,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const BUSINESS_FLOAT: u64 = 1_000_000;

#[derive(Debug, Clone)]
enum Op {
    Earn { purchase: u64 },
    Redeem { points: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..500).prop_map(|purchase| Op::Earn { purchase }),
        (1u64..500).prop_map(|points| Op::Redeem { points }),
    ]
}

fn open_ledger() -> (PointsLedger, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (PointsLedger::open(&config).unwrap(), temp_dir)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    /// Points are conserved: whatever sequence of operations runs, the sum
    /// of the business and customer balances never changes.
    #[test]
    fn prop_points_conserved(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let rt = runtime();
        rt.block_on(async {
            let (ledger, _temp) = open_ledger();
            let business = ledger
                .create_account(AccountKind::Business, "B", BUSINESS_FLOAT)
                .await
                .unwrap();
            let customer = ledger
                .create_account(AccountKind::Customer, "C", 0)
                .await
                .unwrap();

            for op in &ops {
                // Large ticket keeps the discount cap out of the way; the
                // only admissible rejections are balance rules.
                let result = match op {
                    Op::Earn { purchase } => ledger
                        .earn_points(customer.id, business.id, Decimal::from(*purchase))
                        .await
                        .map(|_| ()),
                    Op::Redeem { points } => ledger
                        .redeem_points(customer.id, business.id, *points, Decimal::from(1_000_000u64))
                        .await
                        .map(|_| ()),
                };

                if let Err(e) = result {
                    prop_assert!(
                        matches!(e, Error::InsufficientBalance(_)),
                        "unexpected rejection: {}",
                        e
                    );
                }

                let b = ledger.get_account(business.id).unwrap().points_balance;
                let c = ledger.get_account(customer.id).unwrap().points_balance;
                prop_assert_eq!(b + c, BUSINESS_FLOAT);
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Every committed transaction has exactly two entries of equal
    /// magnitude, one debit and one credit, and both hashes verify.
    #[test]
    fn prop_entries_paired_and_verifiable(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let rt = runtime();
        rt.block_on(async {
            let (ledger, _temp) = open_ledger();
            let business = ledger
                .create_account(AccountKind::Business, "B", BUSINESS_FLOAT)
                .await
                .unwrap();
            let customer = ledger
                .create_account(AccountKind::Customer, "C", 0)
                .await
                .unwrap();

            let mut committed = Vec::new();
            for op in &ops {
                let result = match op {
                    Op::Earn { purchase } => ledger
                        .earn_points(customer.id, business.id, Decimal::from(*purchase))
                        .await
                        .map(|r| r.transaction_id),
                    Op::Redeem { points } => ledger
                        .redeem_points(customer.id, business.id, *points, Decimal::from(1_000_000u64))
                        .await
                        .map(|r| r.transaction_id),
                };
                if let Ok(id) = result {
                    committed.push(id);
                }
            }

            for txn_id in committed {
                let txn = ledger.get_transaction(txn_id).unwrap();
                let entries = ledger.entries_for_transaction(txn_id).unwrap();

                prop_assert_eq!(entries.len(), 2);
                prop_assert_eq!(entries.iter().filter(|e| e.is_debit()).count(), 1);
                for entry in &entries {
                    prop_assert_eq!(entry.amount(), txn.points_amount);
                    prop_assert!(hash::verify_entry_hash(entry));
                }

                // Movement direction follows the transaction type
                let debit_entry = entries.iter().find(|e| e.is_debit()).unwrap();
                match txn.txn_type {
                    TransactionType::Earn => prop_assert_eq!(debit_entry.account_id, business.id),
                    TransactionType::Redeem => prop_assert_eq!(debit_entry.account_id, customer.id),
                }
            }

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Sealing a day is deterministic and idempotent, and the seal verifies
    /// as long as the rows stay untouched.
    #[test]
    fn prop_daily_seal_stable(ops in prop::collection::vec(op_strategy(), 1..15)) {
        let rt = runtime();
        rt.block_on(async {
            let (ledger, _temp) = open_ledger();
            let business = ledger
                .create_account(AccountKind::Business, "B", BUSINESS_FLOAT)
                .await
                .unwrap();
            let customer = ledger
                .create_account(AccountKind::Customer, "C", 0)
                .await
                .unwrap();

            for op in &ops {
                let _ = match op {
                    Op::Earn { purchase } => ledger
                        .earn_points(customer.id, business.id, Decimal::from(*purchase))
                        .await
                        .map(|_| ()),
                    Op::Redeem { points } => ledger
                        .redeem_points(customer.id, business.id, *points, Decimal::from(1_000_000u64))
                        .await
                        .map(|_| ()),
                };
            }

            let audit = AuditService::new(ledger.storage());
            let today = Utc::now().date_naive();

            let first = audit.generate_daily_hash(today).unwrap();
            let second = audit.generate_daily_hash(today).unwrap();
            prop_assert_eq!(&first.hash, &second.hash);
            prop_assert_eq!(first.entry_count, second.entry_count);

            let verification = audit.verify_daily_hash(today).unwrap();
            prop_assert!(verification.valid);
            prop_assert_eq!(verification.entry_count, first.entry_count);

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Entry hashes are a pure function of the tuple: same fields, same
    /// hash; any changed field, different hash.
    #[test]
    fn prop_entry_hash_sensitivity(
        debit in 0u64..10_000,
        balance in 0u64..10_000,
        bump in 1u64..100,
    ) {
        let entry = loyalty_ledger::LedgerEntry {
            id: uuid::Uuid::now_v7(),
            entry_type: TransactionType::Redeem,
            account_id: uuid::Uuid::new_v4(),
            debit,
            credit: 0,
            balance_after: balance,
            transaction_id: uuid::Uuid::now_v7(),
            hash: None,
            created_at: Utc::now(),
        };

        let h1 = hash::compute_entry_hash(&entry);
        prop_assert_eq!(&h1, &hash::compute_entry_hash(&entry));

        let mut changed = entry.clone();
        changed.debit += bump;
        prop_assert_ne!(&h1, &hash::compute_entry_hash(&changed));

        let mut changed = entry;
        changed.balance_after += bump;
        prop_assert_ne!(&h1, &hash::compute_entry_hash(&changed));
    }
}
