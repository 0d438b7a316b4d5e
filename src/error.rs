//! Error types for the transaction memo cache

use thiserror::Error;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cache errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error (derived memo rows)
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON error (raw transaction documents)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delivered amount failed numeric coercion (fatal for the write)
    #[error("Non-numeric delivered amount {value:?} in transaction {hash}")]
    NonNumericAmount {
        /// Hash of the offending transaction
        hash: String,
        /// The value text that failed to parse
        value: String,
    },

    /// Fee failed numeric coercion (fatal for the write)
    #[error("Non-numeric fee {value:?} in transaction {hash}")]
    NonNumericFee {
        /// Hash of the offending transaction
        hash: String,
        /// The fee text that failed to parse
        value: String,
    },

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Memo not found
    #[error("Memo not found: {0}")]
    MemoNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
