//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `raw_tx` - Raw ledger transactions (key: hash, value: JSON)
//! - `memos` - Derived memo rows (key: hash, value: bincode)
//! - `indices` - Secondary indices for fast lookups (data in keys)
//!
//! # Index key layout
//!
//! - `acct|{account}|{rev_ts}{hash}` - account scans, datetime-descending
//! - `dest|{destination}|{rev_ts}{hash}` - destination scans, descending
//! - `type|{memo_type}|{hash}` - memo-type prefix filtering
//! - `time|{rev_ts}{hash}` - global recent-first scans
//!
//! `rev_ts` is `u64::MAX - close_time_nanos` big-endian, so forward prefix
//! iteration yields non-increasing datetime.
//!
//! A logical write (raw row + memo row + index delta) commits as a single
//! `WriteBatch`; no reader can observe a raw transaction without its memo
//! consequence. Writes to the same hash serialize on a per-row mutex, writes
//! to distinct hashes proceed concurrently.

use crate::{
    error::{Error, Result},
    types::{Memo, RawTransaction, TxHash},
    Config,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_RAW_TX: &str = "raw_tx";
const CF_MEMOS: &str = "memos";
const CF_INDICES: &str = "indices";

/// Index key namespaces
const IDX_ACCOUNT: &[u8] = b"acct|";
const IDX_DESTINATION: &[u8] = b"dest|";
const IDX_MEMO_TYPE: &[u8] = b"type|";
const IDX_DATETIME: &[u8] = b"time|";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,

    /// Per-hash write locks; same-hash writes serialize, distinct hashes
    /// proceed concurrently
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Storage {
    /// Open or create database (idempotent, safe to invoke repeatedly)
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RAW_TX, Self::cf_options_raw_tx()),
            ColumnFamilyDescriptor::new(CF_MEMOS, Self::cf_options_memos()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            write_locks: DashMap::new(),
        })
    }

    // Column family options

    fn cf_options_raw_tx() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_memos() -> Options {
        let mut opts = Options::default();
        // Memos are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        // Indices benefit from bloom filters
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn row_lock(&self, hash: &TxHash) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(hash.as_str().to_string())
            .or_default()
            .clone()
    }

    // Write path

    /// Insert or fully replace a raw transaction together with its derived
    /// memo row (atomic)
    ///
    /// The caller supplies the already-derived memo; `None` means the
    /// transaction carries no memo entries. Any stale memo row and its index
    /// entries from a previous version of the same hash are removed in the
    /// same batch.
    pub fn upsert_transaction(&self, tx: &RawTransaction, memo: Option<&Memo>) -> Result<()> {
        let lock = self.row_lock(&tx.hash);
        let _guard = lock.lock();

        let old_memo = self.get_memo_opt(&tx.hash)?;

        let mut batch = WriteBatch::default();

        // 1. Raw transaction row
        let cf_raw = self.cf_handle(CF_RAW_TX)?;
        let raw_value = serde_json::to_vec(tx)?;
        batch.put_cf(cf_raw, tx.hash.as_str().as_bytes(), &raw_value);

        // 2. Stale index entries (and memo row, when the new document no
        //    longer qualifies)
        let cf_memos = self.cf_handle(CF_MEMOS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        if let Some(ref old) = old_memo {
            for key in Self::memo_index_keys(old) {
                batch.delete_cf(cf_indices, &key);
            }
            if memo.is_none() {
                batch.delete_cf(cf_memos, tx.hash.as_str().as_bytes());
            }
        }

        // 3. New memo row and index entries
        if let Some(memo) = memo {
            let memo_value = bincode::serialize(memo)?;
            batch.put_cf(cf_memos, tx.hash.as_str().as_bytes(), &memo_value);

            for key in Self::memo_index_keys(memo) {
                batch.put_cf(cf_indices, &key, b"");
            }
        }

        self.db.write(batch)?;

        tracing::debug!(
            hash = %tx.hash,
            has_memo = memo.is_some(),
            validated = tx.validated,
            "Transaction stored"
        );

        Ok(())
    }

    /// Delete a raw transaction, cascading to its memo row and index
    /// entries (atomic)
    pub fn delete_transaction(&self, hash: &TxHash) -> Result<()> {
        let lock = self.row_lock(hash);
        let _guard = lock.lock();

        let old_memo = self.get_memo_opt(hash)?;

        let mut batch = WriteBatch::default();

        let cf_raw = self.cf_handle(CF_RAW_TX)?;
        batch.delete_cf(cf_raw, hash.as_str().as_bytes());

        let cf_memos = self.cf_handle(CF_MEMOS)?;
        batch.delete_cf(cf_memos, hash.as_str().as_bytes());

        if let Some(ref old) = old_memo {
            let cf_indices = self.cf_handle(CF_INDICES)?;
            for key in Self::memo_index_keys(old) {
                batch.delete_cf(cf_indices, &key);
            }
        }

        self.db.write(batch)?;

        tracing::debug!(hash = %hash, "Transaction deleted");

        Ok(())
    }

    // Point reads

    /// Get raw transaction by hash
    pub fn get_transaction(&self, hash: &TxHash) -> Result<RawTransaction> {
        self.get_transaction_opt(hash)?
            .ok_or_else(|| Error::TransactionNotFound(hash.to_string()))
    }

    /// Get raw transaction by hash, if present
    pub fn get_transaction_opt(&self, hash: &TxHash) -> Result<Option<RawTransaction>> {
        let cf = self.cf_handle(CF_RAW_TX)?;

        match self.db.get_cf(cf, hash.as_str().as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Get derived memo by hash
    pub fn get_memo(&self, hash: &TxHash) -> Result<Memo> {
        self.get_memo_opt(hash)?
            .ok_or_else(|| Error::MemoNotFound(hash.to_string()))
    }

    /// Get derived memo by hash, if present
    pub fn get_memo_opt(&self, hash: &TxHash) -> Result<Option<Memo>> {
        let cf = self.cf_handle(CF_MEMOS)?;

        match self.db.get_cf(cf, hash.as_str().as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Index scans

    /// Get memos sent by an account, datetime-descending
    pub fn memos_for_account(&self, account: &str) -> Result<Vec<Memo>> {
        let mut prefix = IDX_ACCOUNT.to_vec();
        prefix.extend_from_slice(account.as_bytes());
        prefix.push(b'|');

        self.scan_timestamped_index(&prefix, None)
    }

    /// Get memos destined for an account, datetime-descending
    pub fn memos_for_destination(&self, destination: &str) -> Result<Vec<Memo>> {
        let mut prefix = IDX_DESTINATION.to_vec();
        prefix.extend_from_slice(destination.as_bytes());
        prefix.push(b'|');

        self.scan_timestamped_index(&prefix, None)
    }

    /// Get the most recent memos across all accounts, datetime-descending
    pub fn recent_memos(&self, limit: usize) -> Result<Vec<Memo>> {
        self.scan_timestamped_index(IDX_DATETIME, Some(limit))
    }

    /// Get memos whose memo type starts with the given prefix
    ///
    /// Index order is by memo type, not datetime; callers order the result.
    pub fn memos_by_type_prefix(&self, memo_type_prefix: &str) -> Result<Vec<Memo>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut prefix = IDX_MEMO_TYPE.to_vec();
        prefix.extend_from_slice(memo_type_prefix.as_bytes());

        let mut memos = Vec::new();
        for item in self.db.prefix_iterator_cf(cf_indices, &prefix) {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }

            // The memo type may itself contain the separator; the hash is
            // the segment after the last one.
            let split = key
                .iter()
                .rposition(|b| *b == b'|')
                .ok_or_else(|| Error::Storage("Malformed memo type index key".to_string()))?;
            let hash = Self::hash_from_key_bytes(&key[split + 1..])?;
            memos.push(self.get_memo(&hash)?);
        }

        Ok(memos)
    }

    /// Scan an index whose keys embed `rev_ts || hash` after the prefix
    fn scan_timestamped_index(&self, prefix: &[u8], limit: Option<usize>) -> Result<Vec<Memo>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let mut memos = Vec::new();
        for item in self.db.prefix_iterator_cf(cf_indices, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            if limit.is_some_and(|limit| memos.len() >= limit) {
                break;
            }

            if key.len() < prefix.len() + 8 {
                return Err(Error::Storage("Malformed index key".to_string()));
            }
            let hash = Self::hash_from_key_bytes(&key[prefix.len() + 8..])?;
            memos.push(self.get_memo(&hash)?);
        }

        Ok(memos)
    }

    /// All raw transactions (for the query-time cross-check path)
    pub fn scan_transactions(&self) -> Result<Vec<RawTransaction>> {
        let cf = self.cf_handle(CF_RAW_TX)?;

        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            transactions.push(serde_json::from_slice(&value)?);
        }

        Ok(transactions)
    }

    // Index key helpers

    fn reverse_timestamp(datetime: &DateTime<Utc>) -> [u8; 8] {
        let nanos = datetime.timestamp_nanos_opt().unwrap_or(0).max(0) as u64;
        (u64::MAX - nanos).to_be_bytes()
    }

    fn memo_index_keys(memo: &Memo) -> Vec<Vec<u8>> {
        let rev_ts = Self::reverse_timestamp(&memo.datetime);
        let hash = memo.hash.as_str().as_bytes();

        let mut account_key = IDX_ACCOUNT.to_vec();
        account_key.extend_from_slice(memo.account.as_str().as_bytes());
        account_key.push(b'|');
        account_key.extend_from_slice(&rev_ts);
        account_key.extend_from_slice(hash);

        let mut type_key = IDX_MEMO_TYPE.to_vec();
        type_key.extend_from_slice(memo.memo_type.as_bytes());
        type_key.push(b'|');
        type_key.extend_from_slice(hash);

        let mut time_key = IDX_DATETIME.to_vec();
        time_key.extend_from_slice(&rev_ts);
        time_key.extend_from_slice(hash);

        let mut keys = vec![account_key, type_key, time_key];

        if let Some(ref destination) = memo.destination {
            let mut dest_key = IDX_DESTINATION.to_vec();
            dest_key.extend_from_slice(destination.as_str().as_bytes());
            dest_key.push(b'|');
            dest_key.extend_from_slice(&rev_ts);
            dest_key.extend_from_slice(hash);
            keys.push(dest_key);
        }

        keys
    }

    fn hash_from_key_bytes(bytes: &[u8]) -> Result<TxHash> {
        let hash = std::str::from_utf8(bytes)
            .map_err(|_| Error::Storage("Non-UTF-8 hash in index key".to_string()))?;
        Ok(TxHash::new(hash))
    }

    // Statistics

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        let cf_raw = self.cf_handle(CF_RAW_TX)?;
        let cf_memos = self.cf_handle(CF_MEMOS)?;

        Ok(StorageStats {
            total_transactions: self.approximate_count(cf_raw)?,
            total_memos: self.approximate_count(cf_memos)?,
        })
    }

    fn approximate_count(&self, cf: &ColumnFamily) -> Result<u64> {
        // RocksDB property for approximate count
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Raw transaction rows (approximate)
    pub total_transactions: u64,
    /// Derived memo rows (approximate)
    pub total_memos: u64,
}
