//! Transaction Memo Cache
//!
//! A locally derived, queryable view of memo-carrying ledger transactions,
//! built over an append/update cache of raw transaction records.
//!
//! # Architecture
//!
//! - **Reactive materialization**: every raw write derives its structured
//!   memo row inside the same atomic batch
//! - **Fail-closed money handling**: non-numeric amounts or fees abort the
//!   originating write; text decoding failures fall back to empty strings
//! - **Typed ingestion**: raw documents parse into typed records up front,
//!   so missing fields are explicit options
//! - **Viewpoint queries**: direction, counterparty, and signed amounts are
//!   computed at query time relative to a caller-supplied account

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod cache;
pub mod config;
pub mod error;
pub mod hex_memo;
pub mod materializer;
pub mod metrics;
pub mod query;
pub mod storage;
pub mod types;

// Re-exports
pub use cache::TxMemoCache;
pub use config::{Config, RocksDbConfig};
pub use error::{Error, Result};
pub use materializer::Materializer;
pub use metrics::Metrics;
pub use query::{
    Direction, HandshakeRow, MemoHistoryFilter, MemoHistoryRow, PaymentRow, HANDSHAKE_MARKER,
};
pub use storage::{Storage, StorageStats};
pub use types::{
    AccountAddress, DeliveredAmount, Memo, MemoEntry, MemoWrapper, RawTransaction,
    TransactionMeta, TxDocument, TxHash,
};
