//! Block model: header, payload wrapper, canonical hashing
//!
//! A block's hash covers `index || rfc3339(created_at) || prev_hash ||
//! payload-JSON`: signatures included. The signing pre-image (see
//! [`crate::types::TransactionData::signing_bytes`]) excludes them, which is
//! what lets the counter-party add a second signature to an already-signed
//! proposal without breaking it.

use crate::crypto::sha256_hex;
use crate::types::{AddNodeData, BlockPayload, TransactionData};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// `prev_hash` of the genesis block
pub const GENESIS_PREV_HASH: &str = "0";

/// Wire/epoch value of the genesis `created_at` (0001-01-01T00:00:00Z)
pub const GENESIS_UNIX_SECS: i64 = -62_135_596_800;

const GENESIS_NODE_NAME: &str = "genesis";
const GENESIS_NICK_NAME: &str = "Signet Network";

static GENESIS: Lazy<Block> = Lazy::new(|| {
    let payload = BlockPayload::add_node(&AddNodeData {
        public_key: String::new(),
        node_name: GENESIS_NODE_NAME.to_string(),
        nick_name: GENESIS_NICK_NAME.to_string(),
        address: String::new(),
    })
    .expect("genesis payload is a fixed constant");

    let created_at = DateTime::from_timestamp(GENESIS_UNIX_SECS, 0)
        .expect("genesis instant is a fixed constant");

    let mut block = Block {
        header: BlockHeader {
            index: 0,
            created_at,
            prev_hash: GENESIS_PREV_HASH.to_string(),
            hash: String::new(),
        },
        payload,
    };
    block.header.hash = block
        .compute_hash()
        .expect("genesis payload is a fixed constant");
    block
});

/// Position and linkage of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Zero-based position in the chain, strictly monotonic by 1
    pub index: u64,
    /// UTC creation instant, whole seconds
    pub created_at: DateTime<Utc>,
    /// `hash` of the previous block, `"0"` for genesis
    pub prev_hash: String,
    /// SHA-256 hex of the block's hashing pre-image
    pub hash: String,
}

/// An immutable record of one payload at one chain position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Header with linkage and hash
    pub header: BlockHeader,
    /// Typed, signed payload
    pub payload: BlockPayload,
}

impl Block {
    /// Create a block at `index` linked to `prev_hash`, stamped now
    pub fn new(index: u64, prev_hash: String, payload: BlockPayload) -> Result<Self> {
        let now = Utc::now();
        // whole seconds: the hash pre-image and the wire format are both
        // second-precision, so sub-second digits must never exist on disk
        let created_at = now.with_nanosecond(0).unwrap_or(now);

        let mut block = Block {
            header: BlockHeader {
                index,
                created_at,
                prev_hash,
                hash: String::new(),
            },
            payload,
        };
        block.header.hash = block.compute_hash()?;
        Ok(block)
    }

    /// Create a transaction block with both signatures set
    pub fn with_transaction(
        index: u64,
        prev_hash: String,
        tx: &TransactionData,
        from_signature: String,
        to_signature: String,
    ) -> Result<Self> {
        let payload = BlockPayload::transaction(tx, from_signature, to_signature)?;
        Self::new(index, prev_hash, payload)
    }

    /// Create an add_node block
    pub fn with_add_node(index: u64, prev_hash: String, data: &AddNodeData) -> Result<Self> {
        Self::new(index, prev_hash, BlockPayload::add_node(data)?)
    }

    /// The network-constant genesis block, identical bytes on every node
    pub fn genesis() -> Self {
        GENESIS.clone()
    }

    /// Hash of the network-constant genesis block
    pub fn genesis_hash() -> &'static str {
        &GENESIS.header.hash
    }

    /// Recompute the block hash from the canonical pre-image
    pub fn compute_hash(&self) -> Result<String> {
        let payload_json = serde_json::to_string(&self.payload)?;
        let preimage = format!(
            "{}{}{}{}",
            self.header.index,
            self.header
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            self.header.prev_hash,
            payload_json
        );
        Ok(sha256_hex(preimage.as_bytes()))
    }

    /// Check that the stored hash matches the recomputed pre-image
    pub fn validate(&self) -> Result<()> {
        let computed = self.compute_hash()?;
        if computed != self.header.hash {
            return Err(Error::InvalidBlock(format!(
                "hash mismatch: expected {}, got {}",
                computed, self.header.hash
            )));
        }
        Ok(())
    }

    /// Whether this block sits at the genesis position
    pub fn is_genesis(&self) -> bool {
        self.header.index == 0 && self.header.prev_hash == GENESIS_PREV_HASH
    }

    /// Decode the transaction payload
    pub fn transaction_data(&self) -> Result<TransactionData> {
        self.payload.transaction_data()
    }

    /// Decode the add_node payload
    pub fn add_node_data(&self) -> Result<AddNodeData> {
        self.payload.add_node_data()
    }
}
