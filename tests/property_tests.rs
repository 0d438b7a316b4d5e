//! Property-based tests for cache invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Direction: INCOMING iff destination == viewpoint
//! - Signed amount: directional amount == ±pft_amount by direction
//! - Idempotence: re-materializing the same transaction is byte-identical
//! - Ordering: query results are non-increasing in datetime
//! - Fee conversion: drops text → base units / 1,000,000
//! - Hex decoding: round-trips UTF-8, fails closed otherwise

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tx_memo_cache::{
    hex_memo, AccountAddress, Config, DeliveredAmount, Direction, MemoEntry, MemoHistoryFilter,
    MemoWrapper, RawTransaction, TransactionMeta, TxDocument, TxHash, TxMemoCache,
};

/// Strategy for generating account addresses from a small overlapping pool
fn account_strategy() -> impl Strategy<Value = AccountAddress> {
    prop_oneof![
        Just(AccountAddress::new("rAlpha")),
        Just(AccountAddress::new("rBeta")),
        Just(AccountAddress::new("rGamma")),
    ]
}

/// Strategy for generating tracked-asset amounts (two decimal places)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for generating ledger close times
fn close_time_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (1_500_000_000i64..1_900_000_000i64)
        .prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

/// Strategy for one transaction's variable parts
fn tx_parts_strategy() -> impl Strategy<
    Value = (
        AccountAddress,
        AccountAddress,
        Decimal,
        DateTime<Utc>,
        u64,
    ),
> {
    (
        account_strategy(),
        account_strategy(),
        amount_strategy(),
        close_time_strategy(),
        1u64..1_000_000u64,
    )
}

fn build_tx(
    hash: &str,
    account: AccountAddress,
    destination: AccountAddress,
    amount: Decimal,
    close_time: DateTime<Utc>,
    fee_drops: u64,
    memo_type: &str,
) -> RawTransaction {
    RawTransaction {
        hash: TxHash::new(hash),
        ledger_index: 1,
        close_time,
        meta: TransactionMeta {
            delivered_amount: Some(DeliveredAmount::Issued {
                currency: "PFT".to_string(),
                issuer: None,
                value: amount.to_string(),
            }),
            transaction_result: "tesSUCCESS".to_string(),
        },
        tx: TxDocument {
            account,
            destination: Some(destination),
            fee: Some(fee_drops.to_string()),
            transaction_type: "Payment".to_string(),
            memos: Some(vec![MemoWrapper {
                memo: MemoEntry {
                    memo_format: None,
                    memo_type: Some(hex::encode(memo_type)),
                    memo_data: Some(hex::encode("payload")),
                },
            }]),
        },
        validated: true,
    }
}

/// Create test cache with temp directory
fn create_test_cache() -> (TxMemoCache, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (TxMemoCache::open(config).unwrap(), temp_dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: hex decoding round-trips any UTF-8 text
    #[test]
    fn prop_hex_decode_round_trip(text in "\\PC{0,64}") {
        let encoded = hex::encode(text.as_bytes());
        prop_assert_eq!(hex_memo::decode(Some(&encoded)), text);
    }

    /// Property: the decoder is total — arbitrary input never errors, and
    /// odd-length input always fails closed to ""
    #[test]
    fn prop_hex_decode_total(text in "\\PC{0,64}") {
        let decoded = hex_memo::decode(Some(&text));

        let stripped = text
            .strip_prefix("\\x")
            .or_else(|| text.strip_prefix("0x"))
            .unwrap_or(&text);
        if stripped.len() % 2 == 1 {
            prop_assert_eq!(decoded, "");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: fee conversion is exactly drops / 1,000,000
    #[test]
    fn prop_fee_conversion(fee_drops in 0u64..10_000_000_000u64) {
        let (cache, _temp) = create_test_cache();

        let tx = build_tx(
            "H1",
            AccountAddress::new("rAlpha"),
            AccountAddress::new("rBeta"),
            Decimal::from(1),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            fee_drops,
            "TASK",
        );
        cache.store_transaction(&tx).unwrap();

        let memo = cache.get_memo(&tx.hash).unwrap().unwrap();
        let expected = Decimal::from(fee_drops) / Decimal::from(1_000_000);
        prop_assert_eq!(memo.xrp_fee, expected);
    }

    /// Property: re-materializing an identical transaction is byte-identical
    #[test]
    fn prop_rematerialization_idempotent(
        (account, destination, amount, close_time, fee) in tx_parts_strategy()
    ) {
        let (cache, _temp) = create_test_cache();

        let tx = build_tx("H1", account, destination, amount, close_time, fee, "TASK");

        cache.store_transaction(&tx).unwrap();
        let first = bincode::serialize(&cache.get_memo(&tx.hash).unwrap().unwrap()).unwrap();

        cache.store_transaction(&tx).unwrap();
        let second = bincode::serialize(&cache.get_memo(&tx.hash).unwrap().unwrap()).unwrap();

        prop_assert_eq!(first, second);
    }

    /// Property: direction and signed amount laws hold for every returned row
    #[test]
    fn prop_direction_and_signed_amount_laws(
        txs in prop::collection::vec(tx_parts_strategy(), 1..12)
    ) {
        let (cache, _temp) = create_test_cache();

        for (i, (account, destination, amount, close_time, fee)) in txs.into_iter().enumerate() {
            let tx = build_tx(
                &format!("H{}", i),
                account,
                destination,
                amount,
                close_time,
                fee,
                "TASK",
            );
            cache.store_transaction(&tx).unwrap();
        }

        let viewpoint = AccountAddress::new("rAlpha");
        let rows = cache
            .account_memo_history(&viewpoint, &MemoHistoryFilter::default())
            .unwrap();

        for row in &rows {
            let incoming = row.memo.destination.as_ref() == Some(&viewpoint);
            prop_assert_eq!(row.direction == Direction::Incoming, incoming);

            let expected = if incoming {
                row.memo.pft_amount
            } else {
                -row.memo.pft_amount
            };
            prop_assert_eq!(row.directional_pft_amount, expected);
        }
    }

    /// Property: history results are non-increasing in datetime
    #[test]
    fn prop_history_ordering(
        txs in prop::collection::vec(tx_parts_strategy(), 1..12)
    ) {
        let (cache, _temp) = create_test_cache();

        for (i, (account, destination, amount, close_time, fee)) in txs.into_iter().enumerate() {
            let tx = build_tx(
                &format!("H{}", i),
                account,
                destination,
                amount,
                close_time,
                fee,
                "TASK",
            );
            cache.store_transaction(&tx).unwrap();
        }

        for viewpoint in ["rAlpha", "rBeta", "rGamma"] {
            let viewpoint = AccountAddress::new(viewpoint);

            let rows = cache
                .account_memo_history(&viewpoint, &MemoHistoryFilter::default())
                .unwrap();
            for pair in rows.windows(2) {
                prop_assert!(pair[0].memo.datetime >= pair[1].memo.datetime);
            }

            let payments = cache.account_payments(&viewpoint).unwrap();
            for pair in payments.windows(2) {
                prop_assert!(pair[0].transaction.close_time >= pair[1].transaction.close_time);
            }
        }
    }

    /// Property: handshake detection is symmetric in its arguments
    #[test]
    fn prop_handshake_symmetry(
        txs in prop::collection::vec(
            (tx_parts_strategy(), prop::bool::ANY),
            1..10,
        )
    ) {
        let (cache, _temp) = create_test_cache();

        for (i, ((account, destination, amount, close_time, fee), is_handshake)) in
            txs.into_iter().enumerate()
        {
            let memo_type = if is_handshake { "XHANDSHAKE1" } else { "TASK" };
            let tx = build_tx(
                &format!("H{}", i),
                account,
                destination,
                amount,
                close_time,
                fee,
                memo_type,
            );
            cache.store_transaction(&tx).unwrap();
        }

        let a = AccountAddress::new("rAlpha");
        let b = AccountAddress::new("rBeta");

        let from_a = cache.handshake_history(&a, &b).unwrap();
        let from_b = cache.handshake_history(&b, &a).unwrap();

        let hashes_a: Vec<&str> = from_a.iter().map(|r| r.memo.hash.as_str()).collect();
        let hashes_b: Vec<&str> = from_b.iter().map(|r| r.memo.hash.as_str()).collect();
        prop_assert_eq!(hashes_a, hashes_b);

        for row in &from_a {
            prop_assert!(row.memo.memo_type.contains("HANDSHAKE"));
            let expected = if row.memo.account == a {
                Direction::Outgoing
            } else {
                Direction::Incoming
            };
            prop_assert_eq!(row.direction, expected);
        }
    }

    /// Property: a transaction without memos never has a derived row, and
    /// deleting any transaction cascades
    #[test]
    fn prop_memo_lifecycle(
        (account, destination, amount, close_time, fee) in tx_parts_strategy(),
        with_memo in prop::bool::ANY,
    ) {
        let (cache, _temp) = create_test_cache();

        let mut tx = build_tx("H1", account, destination, amount, close_time, fee, "TASK");
        if !with_memo {
            tx.tx.memos = None;
        }

        cache.store_transaction(&tx).unwrap();
        prop_assert_eq!(cache.get_memo(&tx.hash).unwrap().is_some(), with_memo);

        cache.delete_transaction(&tx.hash).unwrap();
        prop_assert!(cache.get_transaction(&tx.hash).is_err());
        prop_assert!(cache.get_memo(&tx.hash).unwrap().is_none());
    }
}
