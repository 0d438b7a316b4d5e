//! Core types for the transaction memo cache
//!
//! Raw ledger transactions are parsed into typed records at ingestion, so
//! missing document fields surface as explicit `Option`s rather than
//! null-propagating path lookups. Monetary values use `Decimal` throughout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger transaction hash (globally unique, stable across updates)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    /// Create new transaction hash
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger account address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// Create new account address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw ledger transaction as written by the upstream sync collaborator
///
/// Field names follow the ledger wire format, so a full record deserializes
/// directly from the JSON the sync layer receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Transaction hash (primary key)
    pub hash: TxHash,

    /// Ledger index the transaction was included in
    pub ledger_index: u64,

    /// Ledger close time
    #[serde(rename = "close_time_iso")]
    pub close_time: DateTime<Utc>,

    /// Transaction metadata document
    pub meta: TransactionMeta,

    /// Transaction document
    #[serde(rename = "tx_json")]
    pub tx: TxDocument,

    /// Whether the transaction is validated by the ledger
    #[serde(default)]
    pub validated: bool,
}

impl RawTransaction {
    /// Parse a full transaction record from ledger wire JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Transaction metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    /// Amount actually delivered, if any
    #[serde(default)]
    pub delivered_amount: Option<DeliveredAmount>,

    /// Ledger engine result code (e.g. `tesSUCCESS`)
    #[serde(rename = "TransactionResult", default)]
    pub transaction_result: String,
}

/// Delivered amount: either an issued asset object or native-asset drops text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliveredAmount {
    /// Issued asset with currency code and decimal value text
    Issued {
        /// Currency code
        currency: String,
        /// Issuing account, if present
        #[serde(default)]
        issuer: Option<String>,
        /// Amount value text
        value: String,
    },

    /// Native asset amount in drops
    Xrp(String),
}

/// Transaction document (the signed transaction body)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxDocument {
    /// Sender account
    #[serde(rename = "Account")]
    pub account: AccountAddress,

    /// Destination account (absent for non-payment transaction types)
    #[serde(rename = "Destination", default)]
    pub destination: Option<AccountAddress>,

    /// Fee in smallest units (drops), as text
    #[serde(rename = "Fee", default)]
    pub fee: Option<String>,

    /// Transaction type (e.g. `Payment`)
    #[serde(rename = "TransactionType", default)]
    pub transaction_type: String,

    /// Memo entries, if the transaction carries any
    #[serde(rename = "Memos", default)]
    pub memos: Option<Vec<MemoWrapper>>,
}

/// Wire-level wrapper around a memo entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoWrapper {
    /// The wrapped memo entry
    #[serde(rename = "Memo", default)]
    pub memo: MemoEntry,
}

/// A single memo entry with hex-encoded sub-fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoEntry {
    /// Hex-encoded memo format
    #[serde(rename = "MemoFormat", default)]
    pub memo_format: Option<String>,

    /// Hex-encoded memo type
    #[serde(rename = "MemoType", default)]
    pub memo_type: Option<String>,

    /// Hex-encoded memo data
    #[serde(rename = "MemoData", default)]
    pub memo_data: Option<String>,
}

/// Derived memo row, materialized from a raw transaction's first memo entry
///
/// Owned exclusively by its [`RawTransaction`]: created or fully replaced on
/// every qualifying raw write, removed only via cascade from raw deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    /// Transaction hash (primary key, foreign key to the raw row)
    pub hash: TxHash,

    /// Sender account
    pub account: AccountAddress,

    /// Destination account
    pub destination: Option<AccountAddress>,

    /// Tracked-asset amount delivered (0 if another currency or absent)
    pub pft_amount: Decimal,

    /// Fee in base units, converted from drops
    pub xrp_fee: Decimal,

    /// Decoded memo format text
    pub memo_format: String,

    /// Decoded memo type text
    pub memo_type: String,

    /// Decoded memo data text
    pub memo_data: String,

    /// Ledger close time of the transaction
    pub datetime: DateTime<Utc>,

    /// Ledger engine result code
    pub transaction_result: String,
}
