//! Core value types for the ledger
//!
//! Field order on the serde structs is load-bearing: the signing pre-image
//! and the block-hash pre-image are both built from compact JSON of these
//! types, and every node must produce identical bytes for identical values.

use crate::crypto::sha256_hex;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;

static NODE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z0-9_-]+$").expect("node name regex"));

/// Whether a node name is safe as a network identifier and as a filename
pub fn is_valid_node_name(name: &str) -> bool {
    NODE_NAME_RE.is_match(name)
}

/// One IOU entry: `from` owes `to` an amount under a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    /// Proposing peer (the lender)
    pub from: String,
    /// Counter-party peer (the borrower)
    pub to: String,
    /// Amount in an opaque unit; conventionally non-negative
    pub amount: i64,
    /// Human-readable reason
    pub title: String,
}

impl TransactionData {
    /// Canonical signing pre-image: compact JSON of the transaction alone.
    ///
    /// Both the proposer and the counter-party sign these exact bytes, so a
    /// second signature can be added without invalidating the first.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Peer registration data, also the genesis payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNodeData {
    /// Hex-encoded Ed25519 public key
    pub public_key: String,
    /// Network-unique peer identifier
    pub node_name: String,
    /// Display name
    pub nick_name: String,
    /// `host` or `host:port`
    pub address: String,
}

/// Kind of payload a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// A two-signature IOU entry
    Transaction,
    /// A peer joining the directory
    AddNode,
}

impl BlockType {
    /// Wire spelling of the type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Transaction => "transaction",
            BlockType::AddNode => "add_node",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged payload of a block
///
/// `data` holds the canonical JSON of the variant byte-for-byte; it is kept
/// raw so hashing and signature checks see exactly what the producer wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Payload variant tag
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Canonical JSON of the variant
    pub data: Box<RawValue>,
    /// Base64 Ed25519 signature by `from` (empty for add_node)
    pub from_signature: String,
    /// Base64 Ed25519 signature by `to` (empty for add_node and proposals)
    pub to_signature: String,
}

impl BlockPayload {
    /// Build a transaction payload
    pub fn transaction(
        tx: &TransactionData,
        from_signature: String,
        to_signature: String,
    ) -> Result<Self> {
        Ok(Self {
            kind: BlockType::Transaction,
            data: serde_json::value::to_raw_value(tx)?,
            from_signature,
            to_signature,
        })
    }

    /// Build an add_node payload; registrations carry no signatures
    pub fn add_node(data: &AddNodeData) -> Result<Self> {
        Ok(Self {
            kind: BlockType::AddNode,
            data: serde_json::value::to_raw_value(data)?,
            from_signature: String::new(),
            to_signature: String::new(),
        })
    }

    /// Decode the transaction variant
    pub fn transaction_data(&self) -> Result<TransactionData> {
        if self.kind != BlockType::Transaction {
            return Err(Error::InvalidBlock(format!(
                "payload type is not transaction: {}",
                self.kind
            )));
        }
        Ok(serde_json::from_str(self.data.get())?)
    }

    /// Decode the add_node variant
    pub fn add_node_data(&self) -> Result<AddNodeData> {
        if self.kind != BlockType::AddNode {
            return Err(Error::InvalidBlock(format!(
                "payload type is not add_node: {}",
                self.kind
            )));
        }
        Ok(serde_json::from_str(self.data.get())?)
    }
}

/// A signed proposal waiting for the counter-party's approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// SHA-256 id derived from creation time and payload
    pub id: String,
    /// Proposal creation instant
    pub created_at: DateTime<Utc>,
    /// Transaction payload with `from_signature` set and `to_signature` empty
    pub payload: BlockPayload,
}

impl PendingTransaction {
    /// Create a pending transaction stamped with the current time
    pub fn new(id: String, payload: BlockPayload) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            payload,
        }
    }

    /// Decode the wrapped transaction
    pub fn transaction_data(&self) -> Result<TransactionData> {
        self.payload.transaction_data()
    }
}

/// Derive the pending-transaction id from creation time and payload.
///
/// Pure: equal inputs yield equal ids. A same-id re-add replaces the
/// existing pool entry.
pub fn generate_id(payload: &BlockPayload, at: DateTime<Utc>) -> String {
    let nanos = at.timestamp_nanos_opt().unwrap_or(0);
    let preimage = format!("{}{}{}", nanos, payload.kind, payload.data.get());
    sha256_hex(preimage.as_bytes())
}

/// A known peer: identity, address, and verification key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Network-unique identifier, safe as a filename
    pub name: String,
    /// Display name
    pub nick_name: String,
    /// `host` or `host:port`
    pub address: String,
    /// Hex-encoded Ed25519 public key
    pub public_key: String,
}
