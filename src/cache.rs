//! Cache facade
//!
//! Ties storage, materialization, and query classification into the
//! high-level API: the upstream sync collaborator writes raw transactions
//! through [`TxMemoCache::store_transaction`], and consumers read directional
//! history through the query operations.
//!
//! Materialization runs inside the write path, before the storage batch is
//! built: a derivation failure aborts the originating write entirely, and no
//! reader can observe a raw transaction without its memo consequence.
//!
//! # Example
//!
//! ```no_run
//! use tx_memo_cache::{Config, TxMemoCache};
//!
//! fn main() -> tx_memo_cache::Result<()> {
//!     let cache = TxMemoCache::open(Config::default())?;
//!
//!     // Store a synced transaction
//!     // let tx = RawTransaction::from_json(wire_json)?;
//!     // cache.store_transaction(&tx)?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    materializer::Materializer,
    metrics::Metrics,
    query::{
        HandshakeRow, MemoHistoryFilter, MemoHistoryRow, PaymentRow, HANDSHAKE_MARKER,
    },
    storage::{Storage, StorageStats},
    types::{AccountAddress, Memo, RawTransaction, TxHash},
    Config, Result,
};
use std::collections::HashSet;

/// Payment transaction type tag in the ledger wire format
const PAYMENT_TX_TYPE: &str = "Payment";

/// Queryable cache of memo-carrying ledger transactions
pub struct TxMemoCache {
    /// Storage backend
    storage: Storage,

    /// Memo derivation pipeline
    materializer: Materializer,

    /// Prometheus metrics
    metrics: Metrics,
}

impl TxMemoCache {
    /// Open the cache with configuration (idempotent bootstrap)
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(&config)?;
        let materializer = Materializer::new(config.tracked_currency.clone());

        Ok(Self {
            storage,
            materializer,
            metrics: Metrics::default(),
        })
    }

    /// Replace the materializer (custom tracked asset or memo decoder)
    pub fn with_materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = materializer;
        self
    }

    // Write path

    /// Insert or fully replace a raw transaction
    ///
    /// Derives the memo row and commits it atomically with the raw write.
    /// A derivation failure (non-numeric amount or fee) aborts the write
    /// with no state change.
    pub fn store_transaction(&self, tx: &RawTransaction) -> Result<()> {
        let memo = match self.materializer.derive(tx) {
            Ok(memo) => memo,
            Err(err) => {
                self.metrics.record_write_failure();
                tracing::error!(hash = %tx.hash, error = %err, "Write aborted");
                return Err(err);
            }
        };

        self.storage.upsert_transaction(tx, memo.as_ref())?;
        self.metrics.record_store(memo.is_some());

        Ok(())
    }

    /// Delete a raw transaction, cascading to its derived memo row
    pub fn delete_transaction(&self, hash: &TxHash) -> Result<()> {
        self.storage.delete_transaction(hash)?;
        self.metrics.record_delete();

        Ok(())
    }

    // Point reads

    /// Get a raw transaction by hash
    pub fn get_transaction(&self, hash: &TxHash) -> Result<RawTransaction> {
        self.storage.get_transaction(hash)
    }

    /// Get a derived memo by hash, if present
    pub fn get_memo(&self, hash: &TxHash) -> Result<Option<Memo>> {
        self.storage.get_memo_opt(hash)
    }

    // Query operations

    /// Account memo history relative to a viewpoint account
    ///
    /// Returns every memo the viewpoint sent or received, classified with
    /// direction, signed tracked-asset amount, and counterparty, ordered by
    /// datetime descending.
    pub fn account_memo_history(
        &self,
        viewpoint: &AccountAddress,
        filter: &MemoHistoryFilter,
    ) -> Result<Vec<MemoHistoryRow>> {
        let _timer = self.metrics.query_duration.start_timer();

        let sent = self.storage.memos_for_account(viewpoint.as_str())?;
        let received = self.storage.memos_for_destination(viewpoint.as_str())?;

        // Self-payments appear on both sides of the union
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(sent.len() + received.len());

        for memo in sent.into_iter().chain(received) {
            if !seen.insert(memo.hash.clone()) {
                continue;
            }
            if filter.pft_only && memo.pft_amount.is_zero() {
                continue;
            }
            if let Some(ref prefix) = filter.memo_type_prefix {
                if !memo.memo_type.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            rows.push(MemoHistoryRow::classify(memo, viewpoint));
        }

        rows.sort_by(|a, b| {
            b.memo
                .datetime
                .cmp(&a.memo.datetime)
                .then_with(|| a.memo.hash.cmp(&b.memo.hash))
        });

        Ok(rows)
    }

    /// Validated payment history computed directly from the raw store
    ///
    /// Cross-check path, independent of the derived memo rows: scans raw
    /// transactions for validated payments touching the viewpoint, ordered
    /// by datetime descending.
    pub fn account_payments(&self, viewpoint: &AccountAddress) -> Result<Vec<PaymentRow>> {
        let _timer = self.metrics.query_duration.start_timer();

        let mut rows: Vec<PaymentRow> = self
            .storage
            .scan_transactions()?
            .into_iter()
            .filter(|tx| tx.tx.transaction_type == PAYMENT_TX_TYPE && tx.validated)
            .filter(|tx| {
                &tx.tx.account == viewpoint || tx.tx.destination.as_ref() == Some(viewpoint)
            })
            .map(|tx| PaymentRow::classify(tx, viewpoint))
            .collect();

        rows.sort_by(|a, b| {
            b.transaction
                .close_time
                .cmp(&a.transaction.close_time)
                .then_with(|| a.transaction.hash.cmp(&b.transaction.hash))
        });

        Ok(rows)
    }

    /// Handshake negotiation memos between two accounts
    ///
    /// Returns memos flowing either way between `local` and `remote` whose
    /// memo type contains the handshake marker, with direction relative to
    /// `local`. Symmetric: swapping the arguments returns the same rows.
    pub fn handshake_history(
        &self,
        local: &AccountAddress,
        remote: &AccountAddress,
    ) -> Result<Vec<HandshakeRow>> {
        let _timer = self.metrics.query_duration.start_timer();

        let outgoing = self.storage.memos_for_account(local.as_str())?;
        let incoming = self.storage.memos_for_account(remote.as_str())?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();

        for memo in outgoing.into_iter().chain(incoming) {
            let pair_matches = (&memo.account == local
                && memo.destination.as_ref() == Some(remote))
                || (&memo.account == remote && memo.destination.as_ref() == Some(local));

            if !pair_matches || !memo.memo_type.contains(HANDSHAKE_MARKER) {
                continue;
            }
            if !seen.insert(memo.hash.clone()) {
                continue;
            }
            rows.push(HandshakeRow::classify(memo, local));
        }

        rows.sort_by(|a, b| {
            b.memo
                .datetime
                .cmp(&a.memo.datetime)
                .then_with(|| a.memo.hash.cmp(&b.memo.hash))
        });

        Ok(rows)
    }

    /// The most recent memos across all accounts, datetime-descending
    pub fn recent_memos(&self, limit: usize) -> Result<Vec<Memo>> {
        let _timer = self.metrics.query_duration.start_timer();
        self.storage.recent_memos(limit)
    }

    /// Memos whose memo type starts with the given prefix
    pub fn memos_by_type_prefix(&self, prefix: &str) -> Result<Vec<Memo>> {
        let _timer = self.metrics.query_duration.start_timer();

        let mut memos = self.storage.memos_by_type_prefix(prefix)?;
        memos.sort_by(|a, b| b.datetime.cmp(&a.datetime).then_with(|| a.hash.cmp(&b.hash)));

        Ok(memos)
    }

    /// Approximate row counts
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.get_stats()
    }

    /// Metrics collector (for scrape endpoints)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Close the cache (graceful shutdown)
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }
}
