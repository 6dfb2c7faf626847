//! Signet Ledger Core
//!
//! Private append-only IOU ledger shared by a fixed set of mutually-known
//! peers. Entries are confirmed by two Ed25519 signatures (proposer and
//! counter-party), committed as hash-chained blocks, replicated by HTTP
//! gossip, and reconciled by the longest-chain rule.
//!
//! # Architecture
//!
//! - **Two-level hashing**: the block hash covers the payload including its
//!   signatures; the signing pre-image covers the transaction alone
//! - **Single orchestrator**: all mutation flows through [`Node`]
//! - **Append-only log**: one JSON block per line, atomically rewritten only
//!   on longest-chain adoption
//! - **Best-effort gossip**: send failures are logged; `sync()` restores
//!   consistency

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod block;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod gossip;
pub mod node;
pub mod pending;
pub mod storage;
pub mod types;
pub mod wire;

// Re-exports
pub use block::Block;
pub use chain::Chain;
pub use config::Config;
pub use crypto::KeyPair;
pub use error::{Error, Result};
pub use node::Node;
pub use pending::PendingPool;
pub use types::{
    AddNodeData, BlockPayload, BlockType, Peer, PendingTransaction, TransactionData,
};
pub use wire::{WireBlock, WirePendingTransaction, WireProposal};
