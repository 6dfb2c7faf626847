//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify the core guarantees:
//! - Hash determinism: the block hash depends only on the pre-image
//! - Id determinism: equal (payload, instant) inputs yield equal ids
//! - Chain invariants survive every sequence of legal appends
//! - Longest-chain replacement is all-or-nothing
//! - Persistence round-trips equal the in-memory sequence
//! - Peer names outside the safe alphabet are rejected

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use signet_core::block::Block;
use signet_core::chain::Chain;
use signet_core::storage::BlockStore;
use signet_core::types::{
    generate_id, is_valid_node_name, BlockPayload, TransactionData,
};

/// Strategy for peer names drawn from the safe alphabet
fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}"
}

/// Strategy for arbitrary transactions
fn transaction_strategy() -> impl Strategy<Value = TransactionData> {
    (
        name_strategy(),
        name_strategy(),
        any::<i64>(),
        "[ -~]{0,32}",
    )
        .prop_map(|(from, to, amount, title)| TransactionData {
            from,
            to,
            amount,
            title,
        })
}

/// Append `txs` to a fresh chain as alternating signed blocks
fn build_chain(txs: &[TransactionData]) -> Chain {
    let chain = Chain::new();
    for tx in txs {
        let block = Block::with_transaction(
            (chain.last_index() + 1) as u64,
            chain.last_hash(),
            tx,
            "from-sig".to_string(),
            "to-sig".to_string(),
        )
        .unwrap();
        chain.append(block).unwrap();
    }
    chain
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_block_hash_deterministic(tx in transaction_strategy()) {
        let payload =
            BlockPayload::transaction(&tx, "sig-a".to_string(), "sig-b".to_string()).unwrap();
        let block = Block::new(1, "prev".to_string(), payload).unwrap();

        prop_assert_eq!(block.compute_hash().unwrap(), block.header.hash.clone());
        prop_assert!(block.validate().is_ok());

        // hex-lowercase, 64 chars
        prop_assert_eq!(block.header.hash.len(), 64);
        prop_assert!(block.header.hash.chars().all(|c| c.is_ascii_hexdigit()
            && !c.is_ascii_uppercase()));
    }

    #[test]
    fn prop_hash_changes_with_any_preimage_field(tx in transaction_strategy()) {
        let payload =
            BlockPayload::transaction(&tx, "sig-a".to_string(), String::new()).unwrap();
        let block = Block::new(1, "prev".to_string(), payload.clone()).unwrap();

        let mut other_index = block.clone();
        other_index.header.index = 2;
        prop_assert_ne!(block.compute_hash().unwrap(), other_index.compute_hash().unwrap());

        let mut other_prev = block.clone();
        other_prev.header.prev_hash = "other".to_string();
        prop_assert_ne!(block.compute_hash().unwrap(), other_prev.compute_hash().unwrap());

        let mut other_sig = block.clone();
        other_sig.payload =
            BlockPayload::transaction(&tx, "sig-a".to_string(), "sig-b".to_string()).unwrap();
        prop_assert_ne!(block.compute_hash().unwrap(), other_sig.compute_hash().unwrap());
    }

    #[test]
    fn prop_id_deterministic(tx in transaction_strategy(), secs in 0i64..4_000_000_000, nanos in 0u32..1_000_000_000) {
        let at = Utc.timestamp_opt(secs, nanos).unwrap();
        let payload =
            BlockPayload::transaction(&tx, "sig".to_string(), String::new()).unwrap();

        let id = generate_id(&payload, at);
        prop_assert_eq!(id.clone(), generate_id(&payload, at));
        prop_assert_eq!(id.len(), 64);

        let shifted = at + chrono::Duration::nanoseconds(1);
        prop_assert_ne!(id, generate_id(&payload, shifted));
    }

    #[test]
    fn prop_chain_invariants_after_appends(txs in prop::collection::vec(transaction_strategy(), 0..8)) {
        let chain = build_chain(&txs);

        prop_assert!(chain.validate().is_ok());
        prop_assert_eq!(chain.len(), txs.len() + 1);
        prop_assert_eq!(chain.last_index(), txs.len() as i64);

        // indices are positions, linkage holds, hashes are unique
        let blocks = chain.blocks();
        for (i, block) in blocks.iter().enumerate() {
            prop_assert_eq!(block.header.index as usize, i);
            if i > 0 {
                prop_assert_eq!(&block.header.prev_hash, &blocks[i - 1].header.hash);
            }
            prop_assert!(chain.has(&block.header.hash));
        }
    }

    #[test]
    fn prop_replace_is_all_or_nothing(
        ours_txs in prop::collection::vec(transaction_strategy(), 0..4),
        theirs_txs in prop::collection::vec(transaction_strategy(), 0..6),
    ) {
        let ours = build_chain(&ours_txs);
        let theirs = build_chain(&theirs_txs);

        let before_len = ours.len();
        let before_hash = ours.last_hash();

        let result = ours.replace(theirs.blocks());
        if theirs.len() > before_len {
            prop_assert!(result.is_ok());
            prop_assert_eq!(ours.len(), theirs.len());
            prop_assert_eq!(ours.last_hash(), theirs.last_hash());
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(ours.len(), before_len);
            prop_assert_eq!(ours.last_hash(), before_hash);
        }
        prop_assert!(ours.validate().is_ok());
    }

    #[test]
    fn prop_block_log_roundtrip(txs in prop::collection::vec(transaction_strategy(), 0..6)) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path().join("block.jsonl"));

        let chain = build_chain(&txs);
        for block in chain.blocks() {
            store.append(&block).unwrap();
        }

        let loaded = store.load_all().unwrap();
        let in_memory = chain.blocks();
        prop_assert_eq!(loaded.len(), in_memory.len());
        for (a, b) in loaded.iter().zip(in_memory.iter()) {
            prop_assert_eq!(&a.header, &b.header);
            prop_assert!(a.validate().is_ok());
        }

        // a rebuilt chain over the loaded blocks is the same chain
        let rebuilt = Chain::from_blocks(loaded).unwrap();
        prop_assert!(rebuilt.validate().is_ok());
        prop_assert_eq!(rebuilt.last_hash(), chain.last_hash());
    }

    #[test]
    fn prop_safe_names_accepted(name in "[A-Za-z0-9_-]{1,32}") {
        prop_assert!(is_valid_node_name(&name));
    }

    #[test]
    fn prop_unsafe_names_rejected(name in "[ -~]{1,32}") {
        let safe = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        prop_assert_eq!(is_valid_node_name(&name), safe);
    }
}

#[test]
fn duplicate_append_leaves_chain_unchanged() {
    let chain = build_chain(&[TransactionData {
        from: "alice".to_string(),
        to: "bob".to_string(),
        amount: 1,
        title: "t".to_string(),
    }]);

    let tip = chain.tail().unwrap();
    assert!(chain.append(tip).is_err());
    assert_eq!(chain.len(), 2);
    chain.validate().unwrap();
}

#[test]
fn longest_chain_convergence() {
    // B extends A's exact history; after replacement A equals B
    let shared = [TransactionData {
        from: "alice".to_string(),
        to: "bob".to_string(),
        amount: 10,
        title: "shared".to_string(),
    }];
    let a = build_chain(&shared);
    let b = Chain::from_blocks(a.blocks()).unwrap();

    let extension = Block::with_transaction(
        (b.last_index() + 1) as u64,
        b.last_hash(),
        &TransactionData {
            from: "bob".to_string(),
            to: "alice".to_string(),
            amount: 20,
            title: "extension".to_string(),
        },
        "from-sig".to_string(),
        "to-sig".to_string(),
    )
    .unwrap();
    b.append(extension).unwrap();

    a.replace(b.blocks()).unwrap();
    assert_eq!(a.len(), b.len());
    assert_eq!(a.last_hash(), b.last_hash());
    a.validate().unwrap();
}
