//! Memo materialization pipeline
//!
//! Derives a structured [`Memo`] row from a raw transaction document. The
//! cache facade runs this on every raw insert and update, before the storage
//! batch is built, so a derivation failure aborts the originating write with
//! no state change. Insert and update share this single code path.

use crate::{
    hex_memo::{self, MemoDecoder},
    types::{DeliveredAmount, Memo, RawTransaction},
    Error, Result,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Drops per base unit of the native asset
const DROPS_PER_XRP: i64 = 1_000_000;

/// Derives memo rows from raw transactions
///
/// Holds the tracked asset code and an injected hex decoder so the pipeline
/// is independently testable.
#[derive(Debug, Clone)]
pub struct Materializer {
    /// Currency code whose delivered amounts are extracted
    tracked_currency: String,

    /// Memo text decoder
    decoder: MemoDecoder,
}

impl Materializer {
    /// Create a materializer for the given tracked asset code
    pub fn new(tracked_currency: impl Into<String>) -> Self {
        Self {
            tracked_currency: tracked_currency.into(),
            decoder: hex_memo::decode,
        }
    }

    /// Replace the memo text decoder
    pub fn with_decoder(mut self, decoder: MemoDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Derive the memo row for a raw transaction
    ///
    /// Returns `Ok(None)` when the transaction document carries no memo
    /// entries (a valid no-op, not an error). Only the first entry is
    /// consulted; additional entries are ignored.
    ///
    /// Text fields fail closed to `""`, but monetary fields do not: a
    /// delivered amount or fee that fails numeric coercion is fatal for the
    /// write.
    pub fn derive(&self, tx: &RawTransaction) -> Result<Option<Memo>> {
        let Some(entry) = tx.tx.memos.as_ref().and_then(|memos| memos.first()) else {
            return Ok(None);
        };
        let entry = &entry.memo;

        // Delivered amount counts only when it is an issued asset in the
        // tracked currency; anything else (native drops, other currencies,
        // absent) is zero without being parsed.
        let pft_amount = match &tx.meta.delivered_amount {
            Some(DeliveredAmount::Issued {
                currency, value, ..
            }) if currency == &self.tracked_currency => {
                Decimal::from_str(value).map_err(|_| Error::NonNumericAmount {
                    hash: tx.hash.to_string(),
                    value: value.clone(),
                })?
            }
            _ => Decimal::ZERO,
        };

        let fee_text = tx.tx.fee.as_deref().unwrap_or("0");
        let fee_drops = Decimal::from_str(fee_text).map_err(|_| Error::NonNumericFee {
            hash: tx.hash.to_string(),
            value: fee_text.to_string(),
        })?;
        let xrp_fee = fee_drops / Decimal::from(DROPS_PER_XRP);

        Ok(Some(Memo {
            hash: tx.hash.clone(),
            account: tx.tx.account.clone(),
            destination: tx.tx.destination.clone(),
            pft_amount,
            xrp_fee,
            memo_format: (self.decoder)(entry.memo_format.as_deref()),
            memo_type: (self.decoder)(entry.memo_type.as_deref()),
            memo_data: (self.decoder)(entry.memo_data.as_deref()),
            datetime: tx.close_time,
            transaction_result: tx.meta.transaction_result.clone(),
        }))
    }
}
