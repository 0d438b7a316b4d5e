//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the cache.
//!
//! # Metrics
//!
//! - `txcache_transactions_stored_total` - Raw transaction writes
//! - `txcache_memos_materialized_total` - Derived memo rows written
//! - `txcache_memos_skipped_total` - Writes with no memo list (valid no-op)
//! - `txcache_transactions_deleted_total` - Cascade deletions
//! - `txcache_write_failures_total` - Writes aborted by the materializer
//! - `txcache_query_duration_seconds` - Histogram of query latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Raw transaction writes
    pub transactions_stored: IntCounter,

    /// Derived memo rows written
    pub memos_materialized: IntCounter,

    /// Writes that carried no memo list
    pub memos_skipped: IntCounter,

    /// Cascade deletions
    pub transactions_deleted: IntCounter,

    /// Writes aborted by derivation failures
    pub write_failures: IntCounter,

    /// Query latency histogram
    pub query_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_stored = IntCounter::with_opts(Opts::new(
            "txcache_transactions_stored_total",
            "Raw transaction writes",
        ))?;
        registry.register(Box::new(transactions_stored.clone()))?;

        let memos_materialized = IntCounter::with_opts(Opts::new(
            "txcache_memos_materialized_total",
            "Derived memo rows written",
        ))?;
        registry.register(Box::new(memos_materialized.clone()))?;

        let memos_skipped = IntCounter::with_opts(Opts::new(
            "txcache_memos_skipped_total",
            "Writes with no memo list",
        ))?;
        registry.register(Box::new(memos_skipped.clone()))?;

        let transactions_deleted = IntCounter::with_opts(Opts::new(
            "txcache_transactions_deleted_total",
            "Cascade deletions",
        ))?;
        registry.register(Box::new(transactions_deleted.clone()))?;

        let write_failures = IntCounter::with_opts(Opts::new(
            "txcache_write_failures_total",
            "Writes aborted by the materializer",
        ))?;
        registry.register(Box::new(write_failures.clone()))?;

        let query_duration = Histogram::with_opts(
            HistogramOpts::new(
                "txcache_query_duration_seconds",
                "Histogram of query latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(query_duration.clone()))?;

        Ok(Self {
            transactions_stored,
            memos_materialized,
            memos_skipped,
            transactions_deleted,
            write_failures,
            query_duration,
            registry,
        })
    }

    /// Record a raw write with its materialization outcome
    pub fn record_store(&self, materialized: bool) {
        self.transactions_stored.inc();
        if materialized {
            self.memos_materialized.inc();
        } else {
            self.memos_skipped.inc();
        }
    }

    /// Record a cascade deletion
    pub fn record_delete(&self) {
        self.transactions_deleted.inc();
    }

    /// Record a write aborted by derivation failure
    pub fn record_write_failure(&self) {
        self.write_failures.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
