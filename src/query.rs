//! Read-side classification logic
//!
//! Direction, counterparty, and signed amount are computed relative to a
//! caller-supplied viewpoint account at query time; nothing here is stored.

use crate::types::{AccountAddress, Memo, RawTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Memo type marker identifying handshake negotiation memos
pub const HANDSHAKE_MARKER: &str = "HANDSHAKE";

/// Payment direction relative to a viewpoint account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Value flowing toward the viewpoint account
    Incoming,
    /// Value flowing away from the viewpoint account
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Incoming => write!(f, "INCOMING"),
            Direction::Outgoing => write!(f, "OUTGOING"),
        }
    }
}

/// Classify direction relative to a viewpoint
///
/// INCOMING iff the destination equals the viewpoint; the destination match
/// wins for self-payments where sender and destination are both the
/// viewpoint.
pub fn direction_for(
    destination: Option<&AccountAddress>,
    viewpoint: &AccountAddress,
) -> Direction {
    if destination == Some(viewpoint) {
        Direction::Incoming
    } else {
        Direction::Outgoing
    }
}

/// Signed amount: positive when incoming, negative when outgoing
pub fn directional_amount(direction: Direction, amount: Decimal) -> Decimal {
    match direction {
        Direction::Incoming => amount,
        Direction::Outgoing => -amount,
    }
}

/// Counterparty of a transfer as seen from the viewpoint
pub fn counterparty(
    account: &AccountAddress,
    destination: Option<&AccountAddress>,
    viewpoint: &AccountAddress,
) -> Option<AccountAddress> {
    if account == viewpoint {
        destination.cloned()
    } else {
        Some(account.clone())
    }
}

/// Filters for account memo history
#[derive(Debug, Clone, Default)]
pub struct MemoHistoryFilter {
    /// Only return rows that actually delivered the tracked asset
    pub pft_only: bool,

    /// Restrict to memo types starting with this prefix
    pub memo_type_prefix: Option<String>,
}

/// A memo row classified relative to a viewpoint account
#[derive(Debug, Clone, PartialEq)]
pub struct MemoHistoryRow {
    /// The derived memo
    pub memo: Memo,

    /// Direction relative to the viewpoint
    pub direction: Direction,

    /// Signed tracked-asset amount
    pub directional_pft_amount: Decimal,

    /// The other party of the transfer
    pub counterparty: Option<AccountAddress>,
}

impl MemoHistoryRow {
    /// Classify a memo relative to a viewpoint account
    pub fn classify(memo: Memo, viewpoint: &AccountAddress) -> Self {
        let direction = direction_for(memo.destination.as_ref(), viewpoint);
        let directional_pft_amount = directional_amount(direction, memo.pft_amount);
        let counterparty = counterparty(&memo.account, memo.destination.as_ref(), viewpoint);

        Self {
            memo,
            direction,
            directional_pft_amount,
            counterparty,
        }
    }
}

/// A raw payment transaction classified relative to a viewpoint account
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    /// The raw transaction
    pub transaction: RawTransaction,

    /// Direction relative to the viewpoint
    pub direction: Direction,

    /// The other party of the payment
    pub counterparty: Option<AccountAddress>,
}

impl PaymentRow {
    /// Classify a raw payment relative to a viewpoint account
    pub fn classify(transaction: RawTransaction, viewpoint: &AccountAddress) -> Self {
        let direction = direction_for(transaction.tx.destination.as_ref(), viewpoint);
        let counterparty = counterparty(
            &transaction.tx.account,
            transaction.tx.destination.as_ref(),
            viewpoint,
        );

        Self {
            transaction,
            direction,
            counterparty,
        }
    }
}

/// A handshake memo classified relative to the local side of a channel
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeRow {
    /// The derived memo
    pub memo: Memo,

    /// Direction relative to the local account
    pub direction: Direction,
}

impl HandshakeRow {
    /// Classify a handshake memo: OUTGOING iff the local account sent it
    pub fn classify(memo: Memo, local: &AccountAddress) -> Self {
        let direction = if &memo.account == local {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        Self { memo, direction }
    }
}
