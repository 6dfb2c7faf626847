//! Wire-shape types for the HTTP interfaces
//!
//! On the wire `created_at` is unix seconds and the payload carries the
//! typed variant object; internally `created_at` is a UTC instant and the
//! payload data is canonical JSON bytes. Conversions here rebuild those
//! canonical bytes, so a block re-encoded from the wire hashes identically
//! on every node.

use crate::block::{Block, BlockHeader};
use crate::types::{AddNodeData, BlockPayload, BlockType, PendingTransaction, TransactionData};
use crate::{Error, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Block header as served and gossiped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBlockHeader {
    /// Chain position
    pub index: u64,
    /// Unix seconds, UTC
    pub created_at: i64,
    /// Previous block hash
    pub prev_hash: String,
    /// This block's hash
    pub hash: String,
}

/// Block payload as served and gossiped; exactly one variant is present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBlockPayload {
    /// Payload variant tag
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Transaction variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionData>,
    /// AddNode variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_node: Option<AddNodeData>,
    /// Base64 signature by `from`
    pub from_signature: String,
    /// Base64 signature by `to`
    pub to_signature: String,
}

/// Block as served and gossiped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBlock {
    /// Header with unix-seconds timestamp
    pub header: WireBlockHeader,
    /// Typed payload
    pub payload: WireBlockPayload,
}

impl WireBlock {
    /// Encode a core block for the wire
    pub fn from_block(block: &Block) -> Result<Self> {
        let mut payload = WireBlockPayload {
            kind: block.payload.kind,
            transaction: None,
            add_node: None,
            from_signature: block.payload.from_signature.clone(),
            to_signature: block.payload.to_signature.clone(),
        };
        match block.payload.kind {
            BlockType::Transaction => payload.transaction = Some(block.transaction_data()?),
            BlockType::AddNode => payload.add_node = Some(block.add_node_data()?),
        }

        Ok(Self {
            header: WireBlockHeader {
                index: block.header.index,
                created_at: block.header.created_at.timestamp(),
                prev_hash: block.header.prev_hash.clone(),
                hash: block.header.hash.clone(),
            },
            payload,
        })
    }

    /// Decode into a core block, rebuilding the canonical payload bytes
    pub fn into_block(self) -> Result<Block> {
        let payload = match (self.payload.kind, self.payload.transaction, self.payload.add_node) {
            (BlockType::Transaction, Some(tx), _) => BlockPayload::transaction(
                &tx,
                self.payload.from_signature,
                self.payload.to_signature,
            )?,
            (BlockType::AddNode, _, Some(data)) => {
                let mut payload = BlockPayload::add_node(&data)?;
                payload.from_signature = self.payload.from_signature;
                payload.to_signature = self.payload.to_signature;
                payload
            }
            (kind, _, _) => {
                return Err(Error::InvalidBlock(format!(
                    "payload data missing for type {}",
                    kind
                )))
            }
        };

        let created_at = DateTime::from_timestamp(self.header.created_at, 0).ok_or_else(|| {
            Error::InvalidBlock(format!(
                "created_at out of range: {}",
                self.header.created_at
            ))
        })?;

        Ok(Block {
            header: BlockHeader {
                index: self.header.index,
                created_at,
                prev_hash: self.header.prev_hash,
                hash: self.header.hash,
            },
            payload,
        })
    }
}

/// Pending-pool entry as served by `GET /transaction/pending`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePendingTransaction {
    /// The proposed IOU
    pub transaction: TransactionData,
    /// Base64 signature by the proposer
    pub from_sig: String,
    /// Pool id used by approve/reject
    pub id: String,
}

impl WirePendingTransaction {
    /// Encode a pool entry; fails when the payload is not a transaction
    pub fn from_pending(pt: &PendingTransaction) -> Result<Self> {
        Ok(Self {
            transaction: pt.transaction_data()?,
            from_sig: pt.payload.from_signature.clone(),
            id: pt.id.clone(),
        })
    }
}

/// Body POSTed to a counter-party when forwarding a proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireProposal {
    /// Proposing peer
    pub from: String,
    /// Counter-party peer
    pub to: String,
    /// Amount in the ledger's opaque unit
    pub amount: i64,
    /// Human-readable reason
    pub title: String,
    /// Proposer's signature over the signing pre-image
    pub from_signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block::with_transaction(
            1,
            Block::genesis_hash().to_string(),
            &TransactionData {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: 1000,
                title: "lunch".to_string(),
            },
            "from-sig".to_string(),
            "to-sig".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_wire_roundtrip_preserves_hash() {
        let block = sample_block();
        let wire = WireBlock::from_block(&block).unwrap();
        assert_eq!(wire.header.created_at, block.header.created_at.timestamp());
        assert_eq!(wire.payload.transaction.as_ref().unwrap().amount, 1000);

        let back = wire.into_block().unwrap();
        assert_eq!(back.header.hash, block.header.hash);
        back.validate().unwrap();
    }

    #[test]
    fn test_wire_roundtrip_genesis() {
        let wire = WireBlock::from_block(&Block::genesis()).unwrap();
        let json = serde_json::to_string(&wire).unwrap();
        // exactly one variant on the wire
        assert!(json.contains("\"add_node\""));
        assert!(!json.contains("\"transaction\""));

        let parsed: WireBlock = serde_json::from_str(&json).unwrap();
        let back = parsed.into_block().unwrap();
        assert_eq!(back.header.hash, Block::genesis_hash());
        back.validate().unwrap();
    }

    #[test]
    fn test_wire_missing_variant_rejected() {
        let mut wire = WireBlock::from_block(&sample_block()).unwrap();
        wire.payload.transaction = None;
        assert!(wire.into_block().is_err());
    }

    #[test]
    fn test_wire_tampered_amount_breaks_hash() {
        let mut wire = WireBlock::from_block(&sample_block()).unwrap();
        wire.payload.transaction.as_mut().unwrap().amount = 9_999;

        let back = wire.into_block().unwrap();
        assert!(back.validate().is_err());
    }

    #[test]
    fn test_wire_pending() {
        let tx = TransactionData {
            from: "alice".to_string(),
            to: "bob".to_string(),
            amount: 5,
            title: "tea".to_string(),
        };
        let payload =
            BlockPayload::transaction(&tx, "from-sig".to_string(), String::new()).unwrap();
        let pt = PendingTransaction::new("id-1".to_string(), payload);

        let wire = WirePendingTransaction::from_pending(&pt).unwrap();
        assert_eq!(wire.id, "id-1");
        assert_eq!(wire.from_sig, "from-sig");
        assert_eq!(wire.transaction, tx);
    }
}
