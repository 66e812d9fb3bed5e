//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account rows (key: account id)
//! - `transactions` - Immutable transaction rows (key: transaction id)
//! - `txn_by_time` - Time index (key: be-nanos || transaction id)
//! - `ledger` - Append-only ledger entries (key: entry id)
//! - `ledger_by_time` - Time index for the daily fold (key: be-nanos || entry id)
//! - `ledger_by_txn` - Pairing index (key: transaction id || entry id)
//! - `daily_hashes` - Sealed per-day digests (key: YYYY-MM-DD)
//! - `emission_config` - One row per rate type
//! - `recommendations` - Emission-rate recommendations (key: id)
//! - `alerts` - Economic alerts (key: id)
//!
//! Each logical transaction commits through one `WriteBatch`, so balances,
//! the transaction row, both ledger rows, and all indices land atomically.

use crate::{
    error::{Error, Result},
    types::{
        Account, DailyAuditHash, EconomicAlert, EmissionRateConfig, EmissionRecommendation,
        LedgerEntry, RateType, Transaction,
    },
    Config,
};
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_TRANSACTIONS: &str = "transactions";
const CF_TXN_BY_TIME: &str = "txn_by_time";
const CF_LEDGER: &str = "ledger";
const CF_LEDGER_BY_TIME: &str = "ledger_by_time";
const CF_LEDGER_BY_TXN: &str = "ledger_by_txn";
const CF_DAILY_HASHES: &str = "daily_hashes";
const CF_EMISSION_CONFIG: &str = "emission_config";
const CF_RECOMMENDATIONS: &str = "recommendations";
const CF_ALERTS: &str = "alerts";

const ALL_CFS: &[&str] = &[
    CF_ACCOUNTS,
    CF_TRANSACTIONS,
    CF_TXN_BY_TIME,
    CF_LEDGER,
    CF_LEDGER_BY_TIME,
    CF_LEDGER_BY_TXN,
    CF_DAILY_HASHES,
    CF_EMISSION_CONFIG,
    CF_RECOMMENDATIONS,
    CF_ALERTS,
];

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,

    /// Serializes the daily-seal check-then-create across every service
    /// holding this storage. RocksDB allows only one open handle per path,
    /// so this lock covers the whole process.
    seal_lock: Mutex<()>,
}

impl Storage {
    /// Open or create the database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Self::cf_options(name)))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB with {} column families", ALL_CFS.len());

        Ok(Self {
            db: Arc::new(db),
            seal_lock: Mutex::new(()),
        })
    }

    /// Daily-seal lock, shared by all audit services over this storage
    pub(crate) fn seal_lock(&self) -> &Mutex<()> {
        &self.seal_lock
    }

    fn cf_options(name: &str) -> Options {
        let mut opts = Options::default();
        match name {
            // Append-only bulk data compresses well
            CF_TRANSACTIONS | CF_LEDGER | CF_DAILY_HASHES => {
                opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
            }
            // Hot read paths favor speed
            _ => {
                opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
            }
        }
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Index key helpers

    fn time_index_key(ts: &DateTime<Utc>, id: Uuid) -> Vec<u8> {
        let nanos = ts.timestamp_nanos_opt().unwrap_or(0) as u64;
        let mut key = nanos.to_be_bytes().to_vec();
        key.extend_from_slice(id.as_bytes());
        key
    }

    fn time_bound_key(ts: &DateTime<Utc>) -> [u8; 8] {
        (ts.timestamp_nanos_opt().unwrap_or(0) as u64).to_be_bytes()
    }

    fn join_index_key(parent: Uuid, child: Uuid) -> Vec<u8> {
        let mut key = parent.as_bytes().to_vec();
        key.extend_from_slice(child.as_bytes());
        key
    }

    fn id_from_time_index(key: &[u8]) -> Option<Uuid> {
        if key.len() >= 24 {
            let bytes: [u8; 16] = key[8..24].try_into().ok()?;
            Some(Uuid::from_bytes(bytes))
        } else {
            None
        }
    }

    fn daily_hash_key(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    // Account operations

    /// Insert or update an account row
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.id.as_bytes(), bincode::serialize(account)?)?;
        Ok(())
    }

    /// Get account by id
    pub fn get_account(&self, id: Uuid) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("account {}", id)))?;
        Ok(bincode::deserialize(&value)?)
    }

    // Transaction commit (the atomic unit)

    /// Commit one logical transaction: both mutated accounts, the
    /// transaction row, both ledger entries, and all indices in a single
    /// WriteBatch. Either everything lands or nothing does.
    pub fn commit_transaction(
        &self,
        txn: &Transaction,
        accounts: [&Account; 2],
        entries: [&LedgerEntry; 2],
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        for account in accounts {
            batch.put_cf(cf_accounts, account.id.as_bytes(), bincode::serialize(account)?);
        }

        let cf_txns = self.cf_handle(CF_TRANSACTIONS)?;
        batch.put_cf(cf_txns, txn.id.as_bytes(), bincode::serialize(txn)?);

        let cf_txn_time = self.cf_handle(CF_TXN_BY_TIME)?;
        batch.put_cf(cf_txn_time, Self::time_index_key(&txn.created_at, txn.id), []);

        let cf_ledger = self.cf_handle(CF_LEDGER)?;
        let cf_ledger_time = self.cf_handle(CF_LEDGER_BY_TIME)?;
        let cf_ledger_txn = self.cf_handle(CF_LEDGER_BY_TXN)?;
        for entry in entries {
            batch.put_cf(cf_ledger, entry.id.as_bytes(), bincode::serialize(entry)?);
            batch.put_cf(cf_ledger_time, Self::time_index_key(&entry.created_at, entry.id), []);
            batch.put_cf(cf_ledger_txn, Self::join_index_key(entry.transaction_id, entry.id), []);
        }

        self.db.write(batch)?;

        tracing::debug!(
            transaction_id = %txn.id,
            txn_type = %txn.txn_type,
            points = txn.points_amount,
            "Transaction committed"
        );

        Ok(())
    }

    /// Get transaction by id
    pub fn get_transaction(&self, id: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Transactions in `[from, to)` ordered by creation time
    pub fn transactions_in_window(
        &self,
        from: &DateTime<Utc>,
        to_exclusive: &DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let cf_index = self.cf_handle(CF_TXN_BY_TIME)?;
        let start = Self::time_bound_key(from);
        let end = Self::time_bound_key(to_exclusive);

        let iter = self
            .db
            .iterator_cf(cf_index, IteratorMode::From(&start, Direction::Forward));

        let mut txns = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if key.as_ref() >= end.as_slice() {
                break;
            }
            if let Some(id) = Self::id_from_time_index(&key) {
                txns.push(self.get_transaction(id)?);
            }
        }

        Ok(txns)
    }

    // Ledger entry operations

    /// Get ledger entry by id
    pub fn get_entry(&self, id: Uuid) -> Result<LedgerEntry> {
        let cf = self.cf_handle(CF_LEDGER)?;
        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("ledger entry {}", id)))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Both entries of a transaction, via the pairing index
    pub fn entries_for_transaction(&self, transaction_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let cf_index = self.cf_handle(CF_LEDGER_BY_TXN)?;
        let prefix = transaction_id.as_bytes();

        let iter = self.db.prefix_iterator_cf(cf_index, prefix);

        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if key.len() >= 32 {
                let bytes: [u8; 16] = key[16..32]
                    .try_into()
                    .map_err(|_| Error::Storage("malformed pairing index key".to_string()))?;
                entries.push(self.get_entry(Uuid::from_bytes(bytes))?);
            }
        }

        Ok(entries)
    }

    /// Ledger entries in `[from, to)` ordered `(created_at asc, id asc)`
    ///
    /// This is the ordering the daily fold depends on: entry-creation
    /// order, never hash order.
    pub fn entries_in_window(
        &self,
        from: &DateTime<Utc>,
        to_exclusive: &DateTime<Utc>,
    ) -> Result<Vec<LedgerEntry>> {
        let cf_index = self.cf_handle(CF_LEDGER_BY_TIME)?;
        let start = Self::time_bound_key(from);
        let end = Self::time_bound_key(to_exclusive);

        let iter = self
            .db
            .iterator_cf(cf_index, IteratorMode::From(&start, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if key.as_ref() >= end.as_slice() {
                break;
            }
            if let Some(id) = Self::id_from_time_index(&key) {
                entries.push(self.get_entry(id)?);
            }
        }

        Ok(entries)
    }

    /// Write a ledger entry row directly, bypassing the engine
    ///
    /// Backfill and recovery tooling only. The ledger is append-only for
    /// every other path.
    pub fn put_ledger_entry_raw(&self, entry: &LedgerEntry) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_ledger = self.cf_handle(CF_LEDGER)?;
        batch.put_cf(cf_ledger, entry.id.as_bytes(), bincode::serialize(entry)?);

        let cf_time = self.cf_handle(CF_LEDGER_BY_TIME)?;
        batch.put_cf(cf_time, Self::time_index_key(&entry.created_at, entry.id), []);

        let cf_txn = self.cf_handle(CF_LEDGER_BY_TXN)?;
        batch.put_cf(cf_txn, Self::join_index_key(entry.transaction_id, entry.id), []);

        self.db.write(batch)?;
        Ok(())
    }

    /// All entries still missing a hash (legacy pre-hashing rows)
    pub fn entries_missing_hash(&self) -> Result<Vec<LedgerEntry>> {
        let cf = self.cf_handle(CF_LEDGER)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut entries = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let entry: LedgerEntry = bincode::deserialize(&value)?;
            if entry.hash.is_none() {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Persist a backfilled hash on a legacy row
    ///
    /// The only permitted ledger mutation; refuses rows without a hash set.
    pub fn put_entry_hash(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.hash.is_none() {
            return Err(Error::Validation(
                "backfill write requires a computed hash".to_string(),
            ));
        }
        let cf = self.cf_handle(CF_LEDGER)?;
        self.db
            .put_cf(cf, entry.id.as_bytes(), bincode::serialize(entry)?)?;
        Ok(())
    }

    // Daily audit hashes

    /// Persist a sealed daily hash
    pub fn put_daily_hash(&self, daily: &DailyAuditHash) -> Result<()> {
        let cf = self.cf_handle(CF_DAILY_HASHES)?;
        self.db
            .put_cf(cf, Self::daily_hash_key(daily.date), bincode::serialize(daily)?)?;

        tracing::info!(
            date = %daily.date,
            entry_count = daily.entry_count,
            "Daily audit hash sealed"
        );

        Ok(())
    }

    /// Get the sealed hash for a day, if any
    pub fn get_daily_hash(&self, date: NaiveDate) -> Result<Option<DailyAuditHash>> {
        let cf = self.cf_handle(CF_DAILY_HASHES)?;
        match self.db.get_cf(cf, Self::daily_hash_key(date))? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Sealed daily hashes, newest first
    pub fn all_daily_hashes(&self, limit: usize) -> Result<Vec<DailyAuditHash>> {
        let cf = self.cf_handle(CF_DAILY_HASHES)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::End);

        let mut hashes = Vec::new();
        for item in iter.take(limit) {
            let (_, value) = item?;
            hashes.push(bincode::deserialize(&value)?);
        }

        Ok(hashes)
    }

    // Emission rate config and recommendations

    /// Get the config row for a rate type
    pub fn get_emission_config(&self, rate_type: RateType) -> Result<Option<EmissionRateConfig>> {
        let cf = self.cf_handle(CF_EMISSION_CONFIG)?;
        match self.db.get_cf(cf, [rate_type as u8])? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Insert or update a rate config row
    pub fn put_emission_config(&self, config: &EmissionRateConfig) -> Result<()> {
        let cf = self.cf_handle(CF_EMISSION_CONFIG)?;
        self.db
            .put_cf(cf, [config.rate_type as u8], bincode::serialize(config)?)?;
        Ok(())
    }

    /// Insert or update a recommendation
    pub fn put_recommendation(&self, rec: &EmissionRecommendation) -> Result<()> {
        let cf = self.cf_handle(CF_RECOMMENDATIONS)?;
        self.db
            .put_cf(cf, rec.id.as_bytes(), bincode::serialize(rec)?)?;
        Ok(())
    }

    /// Get recommendation by id
    pub fn get_recommendation(&self, id: Uuid) -> Result<Option<EmissionRecommendation>> {
        let cf = self.cf_handle(CF_RECOMMENDATIONS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// All recommendations, unordered
    pub fn list_recommendations(&self) -> Result<Vec<EmissionRecommendation>> {
        let cf = self.cf_handle(CF_RECOMMENDATIONS)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut recs = Vec::new();
        for item in iter {
            let (_, value) = item?;
            recs.push(bincode::deserialize(&value)?);
        }

        Ok(recs)
    }

    /// Apply an approved adjustment: rate config update and recommendation
    /// transition in one WriteBatch
    pub fn apply_rate_adjustment(
        &self,
        config: &EmissionRateConfig,
        rec: &EmissionRecommendation,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_config = self.cf_handle(CF_EMISSION_CONFIG)?;
        batch.put_cf(cf_config, [config.rate_type as u8], bincode::serialize(config)?);

        let cf_recs = self.cf_handle(CF_RECOMMENDATIONS)?;
        batch.put_cf(cf_recs, rec.id.as_bytes(), bincode::serialize(rec)?);

        self.db.write(batch)?;

        tracing::info!(
            recommendation_id = %rec.id,
            new_rate = %config.emission_rate,
            "Emission rate adjusted"
        );

        Ok(())
    }

    // Alerts

    /// Persist an economic alert
    pub fn put_alert(&self, alert: &EconomicAlert) -> Result<()> {
        let cf = self.cf_handle(CF_ALERTS)?;
        self.db
            .put_cf(cf, alert.id.as_bytes(), bincode::serialize(alert)?)?;
        Ok(())
    }

    /// Stored alerts, unordered, up to `limit`
    pub fn list_alerts(&self, limit: usize) -> Result<Vec<EconomicAlert>> {
        let cf = self.cf_handle(CF_ALERTS)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut alerts = Vec::new();
        for item in iter.take(limit) {
            let (_, value) = item?;
            alerts.push(bincode::deserialize(&value)?);
        }

        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountKind, TransactionStatus, TransactionType};
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_account(kind: AccountKind, balance: u64) -> Account {
        Account {
            id: Uuid::new_v4(),
            kind,
            name: "Test".to_string(),
            points_balance: balance,
        }
    }

    fn test_commit(storage: &Storage, business: &Account, customer: &Account, points: u64) -> Transaction {
        let created_at = Utc::now();
        let txn = Transaction {
            id: Uuid::now_v7(),
            txn_type: TransactionType::Earn,
            points_amount: points,
            status: TransactionStatus::Completed,
            audit_hash: crate::hash::transaction_audit_hash(
                &created_at,
                business.id,
                customer.id,
                points,
            ),
            business_id: business.id,
            customer_id: customer.id,
            created_at,
        };

        let debit = LedgerEntry {
            id: Uuid::now_v7(),
            entry_type: TransactionType::Earn,
            account_id: business.id,
            debit: points,
            credit: 0,
            balance_after: business.points_balance,
            transaction_id: txn.id,
            hash: Some("h1".to_string()),
            created_at,
        };
        let credit = LedgerEntry {
            id: Uuid::now_v7(),
            entry_type: TransactionType::Earn,
            account_id: customer.id,
            debit: 0,
            credit: points,
            balance_after: customer.points_balance,
            transaction_id: txn.id,
            hash: Some("h2".to_string()),
            created_at,
        };

        storage
            .commit_transaction(&txn, [business, customer], [&debit, &credit])
            .unwrap();
        txn
    }

    #[test]
    fn test_account_roundtrip() {
        let (storage, _temp) = test_storage();
        let account = test_account(AccountKind::Business, 200);

        storage.put_account(&account).unwrap();
        let retrieved = storage.get_account(account.id).unwrap();
        assert_eq!(retrieved.points_balance, 200);
    }

    #[test]
    fn test_missing_account_is_not_found() {
        let (storage, _temp) = test_storage();
        let result = storage.get_account(Uuid::new_v4());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_commit_writes_everything() {
        let (storage, _temp) = test_storage();
        let business = test_account(AccountKind::Business, 50);
        let customer = test_account(AccountKind::Customer, 150);

        let txn = test_commit(&storage, &business, &customer, 150);

        assert_eq!(storage.get_account(business.id).unwrap().points_balance, 50);
        assert_eq!(storage.get_transaction(txn.id).unwrap().points_amount, 150);

        let entries = storage.entries_for_transaction(txn.id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().filter(|e| e.is_debit()).count(), 1);
    }

    #[test]
    fn test_window_scan_ordering() {
        let (storage, _temp) = test_storage();
        let business = test_account(AccountKind::Business, 1000);
        let customer = test_account(AccountKind::Customer, 0);

        for points in [10, 20, 30] {
            test_commit(&storage, &business, &customer, points);
        }

        let now = Utc::now();
        let entries = storage
            .entries_in_window(&(now - Duration::hours(1)), &(now + Duration::hours(1)))
            .unwrap();
        assert_eq!(entries.len(), 6);

        // Creation order preserved
        for pair in entries.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }

        let txns = storage
            .transactions_in_window(&(now - Duration::hours(1)), &(now + Duration::hours(1)))
            .unwrap();
        assert_eq!(txns.len(), 3);
    }

    #[test]
    fn test_window_scan_excludes_outside() {
        let (storage, _temp) = test_storage();
        let business = test_account(AccountKind::Business, 1000);
        let customer = test_account(AccountKind::Customer, 0);
        test_commit(&storage, &business, &customer, 10);

        let now = Utc::now();
        let entries = storage
            .entries_in_window(&(now + Duration::hours(1)), &(now + Duration::hours(2)))
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_daily_hash_roundtrip() {
        let (storage, _temp) = test_storage();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        assert!(storage.get_daily_hash(date).unwrap().is_none());

        let daily = DailyAuditHash {
            date,
            hash: "abcd".to_string(),
            entry_count: 4,
            transaction_types: vec![TransactionType::Earn],
            created_at: Utc::now(),
        };
        storage.put_daily_hash(&daily).unwrap();

        let stored = storage.get_daily_hash(date).unwrap().unwrap();
        assert_eq!(stored.hash, "abcd");
        assert_eq!(stored.entry_count, 4);
    }

    #[test]
    fn test_all_daily_hashes_newest_first() {
        let (storage, _temp) = test_storage();

        for day in 1..=3 {
            storage
                .put_daily_hash(&DailyAuditHash {
                    date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                    hash: format!("h{}", day),
                    entry_count: day as u64,
                    transaction_types: vec![],
                    created_at: Utc::now(),
                })
                .unwrap();
        }

        let hashes = storage.all_daily_hashes(2).unwrap();
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0].hash, "h3");
        assert_eq!(hashes[1].hash, "h2");
    }

    #[test]
    fn test_emission_config_roundtrip() {
        let (storage, _temp) = test_storage();

        assert!(storage.get_emission_config(RateType::Base).unwrap().is_none());

        let config = EmissionRateConfig::default_base();
        storage.put_emission_config(&config).unwrap();

        let stored = storage.get_emission_config(RateType::Base).unwrap().unwrap();
        assert_eq!(stored.emission_rate, rust_decimal::Decimal::ONE);
    }

    #[test]
    fn test_backfill_write_requires_hash() {
        let (storage, _temp) = test_storage();
        let entry = LedgerEntry {
            id: Uuid::now_v7(),
            entry_type: TransactionType::Earn,
            account_id: Uuid::new_v4(),
            debit: 0,
            credit: 10,
            balance_after: 10,
            transaction_id: Uuid::now_v7(),
            hash: None,
            created_at: Utc::now(),
        };

        let result = storage.put_entry_hash(&entry);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_entries_missing_hash() {
        let (storage, _temp) = test_storage();

        let mut legacy = LedgerEntry {
            id: Uuid::now_v7(),
            entry_type: TransactionType::Earn,
            account_id: Uuid::new_v4(),
            debit: 0,
            credit: 10,
            balance_after: 10,
            transaction_id: Uuid::now_v7(),
            hash: None,
            created_at: Utc::now(),
        };
        storage.put_ledger_entry_raw(&legacy).unwrap();

        let missing = storage.entries_missing_hash().unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, legacy.id);

        legacy.hash = Some(crate::hash::compute_entry_hash(&legacy));
        storage.put_entry_hash(&legacy).unwrap();
        assert!(storage.entries_missing_hash().unwrap().is_empty());
    }
}
