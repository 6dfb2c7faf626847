//! Ledger orchestrator
//!
//! Composes the chain, pending pool, stores, key pair, and gossip client
//! into the propose / approve / reject / receive / register / sync protocol.
//! External interfaces call these operations; inbound gossip re-enters
//! through [`Node::receive_block`].
//!
//! Persistence policy: a failed block-log append aborts the operation; a
//! failed pending-snapshot write is logged and ignored, the in-memory pool
//! stays authoritative.

use crate::block::Block;
use crate::chain::Chain;
use crate::config::Config;
use crate::crypto::{public_key_from_hex, verify_base64, KeyPair};
use crate::gossip::GossipClient;
use crate::pending::PendingPool;
use crate::storage::{BlockStore, PeerStore, PendingStore};
use crate::types::{
    generate_id, is_valid_node_name, AddNodeData, BlockType, BlockPayload, Peer,
    PendingTransaction, TransactionData,
};
use crate::wire::{WireBlock, WirePendingTransaction, WireProposal};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A running ledger node: all mutation flows through this type
#[derive(Debug)]
pub struct Node {
    config: Config,
    chain: Chain,
    pending: PendingPool,
    block_store: BlockStore,
    pending_store: PendingStore,
    peer_store: PeerStore,
    keypair: KeyPair,
    gossip: Arc<GossipClient>,
}

impl Node {
    /// Load a node from its root directory.
    ///
    /// Reads the private key, rebuilds the chain from the block log (falling
    /// back to a fresh genesis chain when the log is empty), and restores the
    /// pending pool from its snapshot.
    pub fn open(config: Config) -> Result<Self> {
        let keypair = KeyPair::load(config.priv_key_path())?;

        let block_store = BlockStore::new(config.block_file_path());
        let pending_store = PendingStore::new(config.pending_file_path());
        let peer_store = PeerStore::new(config.nodes_dir());

        let blocks = block_store.load_all()?;
        let chain = if blocks.is_empty() {
            Chain::new()
        } else {
            Chain::from_blocks(blocks)?
        };

        let pending = PendingPool::new();
        match pending_store.load() {
            Ok(items) => {
                for item in items {
                    pending.add(item);
                }
            }
            Err(e) => warn!("failed to load pending transactions: {}", e),
        }

        info!(
            "node {} loaded: {} blocks, {} pending",
            config.node_name,
            chain.len(),
            pending.len()
        );

        Ok(Self {
            config,
            chain,
            pending,
            block_store,
            pending_store,
            peer_store,
            keypair,
            gossip: Arc::new(GossipClient::new()),
        })
    }

    /// This node's network name
    pub fn node_name(&self) -> &str {
        &self.config.node_name
    }

    /// This node's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// This node's public key, hex-encoded
    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    /// Read access to the chain
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Wire-encoded snapshot of the full chain
    pub fn chain_snapshot(&self) -> Result<Vec<WireBlock>> {
        self.chain.blocks().iter().map(WireBlock::from_block).collect()
    }

    /// Propose a transaction.
    ///
    /// With an empty `from_signature` the local key signs the pre-image (a
    /// local proposal); a non-empty signature is kept as supplied (a proposal
    /// forwarded by its proposer). When `to` is a different peer the proposal
    /// is forwarded to it asynchronously, best-effort.
    pub async fn propose_transaction(
        &self,
        data: TransactionData,
        from_signature: String,
    ) -> Result<PendingTransaction> {
        let from_signature = if from_signature.is_empty() {
            self.keypair.sign_base64(&data.signing_bytes()?)
        } else {
            from_signature
        };

        let payload = BlockPayload::transaction(&data, from_signature, String::new())?;
        let id = generate_id(&payload, Utc::now());
        let pending_tx = PendingTransaction::new(id, payload);

        self.pending.add(pending_tx.clone());
        self.persist_pending();

        if data.to != self.config.node_name {
            match self.peer_store.load_all() {
                Ok(peers) => {
                    if let Some(peer) = peers.get(&data.to) {
                        self.forward_proposal(peer, &pending_tx)?;
                    }
                }
                Err(e) => warn!("failed to load peers for proposal forwarding: {}", e),
            }
        }

        info!(
            "proposed transaction {}: {} -> {} ({})",
            pending_tx.id, data.from, data.to, data.amount
        );
        Ok(pending_tx)
    }

    /// Approve a pending transaction: countersign, commit, broadcast
    pub async fn approve_transaction(&self, id: &str) -> Result<Block> {
        let pending_tx = self
            .pending
            .get(id)
            .ok_or_else(|| Error::PendingNotFound(id.to_string()))?;

        let tx = pending_tx.transaction_data()?;
        let to_signature = self.keypair.sign_base64(&tx.signing_bytes()?);

        let tail = self.chain.tail().ok_or_else(|| {
            Error::InvalidChain("cannot approve on an empty chain".to_string())
        })?;
        let block = Block::with_transaction(
            tail.header.index + 1,
            tail.header.hash,
            &tx,
            pending_tx.payload.from_signature.clone(),
            to_signature,
        )?;

        self.chain.append(block.clone())?;
        self.block_store.append(&block)?;

        self.pending.remove(id);
        self.persist_pending();

        info!(
            "approved transaction {} as block {} ({})",
            id, block.header.index, block.header.hash
        );
        self.dispatch_broadcast(&block)?;
        Ok(block)
    }

    /// Reject a pending transaction: silent drop, no chain footprint
    pub fn reject_transaction(&self, id: &str) -> Result<()> {
        if !self.pending.has(id) {
            return Err(Error::PendingNotFound(id.to_string()));
        }
        self.pending.remove(id);
        self.persist_pending();
        info!("rejected transaction {}", id);
        Ok(())
    }

    /// Process a block arriving from a peer.
    ///
    /// Validates the hash and both signatures, then either appends and
    /// re-gossips (tail extension), requests a sync (block from the future),
    /// ignores a duplicate, or rejects a stale/conflicting block.
    pub fn receive_block(&self, wire: WireBlock) -> Result<()> {
        let block = wire.into_block()?;
        block.validate()?;
        self.verify_block_signatures(&block)?;

        let last_hash = self.chain.last_hash();
        let last_index = self.chain.last_index();

        if block.header.prev_hash == last_hash {
            self.chain.append(block.clone())?;
            self.block_store.append(&block)?;
            // peers the sender missed hear about it from us
            self.dispatch_broadcast(&block)?;
            info!("received block {} ({})", block.header.index, block.header.hash);
            return Ok(());
        }

        if block.header.index as i64 > last_index {
            return Err(Error::SyncNeeded {
                remote: block.header.index,
                local: last_index,
            });
        }

        if self.chain.has(&block.header.hash) {
            // idempotent delivery
            return Ok(());
        }

        Err(Error::InvalidBlock(format!(
            "block index {} is behind or conflicting with local chain tip {}",
            block.header.index, last_index
        )))
    }

    /// Register a peer: commit an add_node block, persist the record, gossip
    pub fn register_node(
        &self,
        node_name: &str,
        nick_name: &str,
        address: &str,
        public_key: &str,
    ) -> Result<Block> {
        if !is_valid_node_name(node_name) {
            return Err(Error::InvalidNodeName(node_name.to_string()));
        }

        let data = AddNodeData {
            public_key: public_key.to_string(),
            node_name: node_name.to_string(),
            nick_name: nick_name.to_string(),
            address: address.to_string(),
        };

        let tail = self.chain.tail().ok_or_else(|| {
            Error::InvalidChain("cannot register on an empty chain".to_string())
        })?;
        let block = Block::with_add_node(tail.header.index + 1, tail.header.hash, &data)?;

        self.chain.append(block.clone())?;
        self.block_store.append(&block)?;

        let peer = Peer {
            name: data.node_name,
            nick_name: data.nick_name,
            address: data.address,
            public_key: data.public_key,
        };
        if let Err(e) = self.peer_store.save(&peer) {
            warn!("failed to save peer record for {}: {}", peer.name, e);
        }

        info!("registered peer {} as block {}", peer.name, block.header.index);
        self.dispatch_broadcast(&block)?;
        Ok(block)
    }

    /// Pull every peer's chain and adopt the strictly longest valid one.
    ///
    /// Unreachable or undecodable peers are skipped with a warning. On
    /// adoption the block log is rewritten atomically.
    pub async fn sync_chain(&self) -> Result<()> {
        let peers = self.peer_store.load_all()?;

        let mut longest: Option<Vec<Block>> = None;
        let mut max_len = self.chain.len();

        for (name, peer) in &peers {
            if name == &self.config.node_name {
                continue;
            }

            let wire_blocks = match self.gossip.fetch_chain(&peer.address).await {
                Ok(blocks) => blocks,
                Err(e) => {
                    warn!("failed to fetch chain from {} ({}): {}", name, peer.address, e);
                    continue;
                }
            };

            let blocks: Result<Vec<Block>> =
                wire_blocks.into_iter().map(WireBlock::into_block).collect();
            let blocks = match blocks {
                Ok(blocks) => blocks,
                Err(e) => {
                    warn!("failed to decode chain from {}: {}", name, e);
                    continue;
                }
            };

            if blocks.len() > max_len {
                max_len = blocks.len();
                longest = Some(blocks);
            }
        }

        if let Some(blocks) = longest {
            let adopted = blocks.len();
            self.chain.replace(blocks)?;
            self.block_store.replace_all(&self.chain.blocks())?;
            info!("chain synced: {} blocks", adopted);
        }

        Ok(())
    }

    /// Pending transactions sorted by creation time, wire-encoded
    pub fn list_pending(&self) -> Vec<WirePendingTransaction> {
        let mut items = self.pending.list();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        items
            .iter()
            .filter_map(|pt| WirePendingTransaction::from_pending(pt).ok())
            .collect()
    }

    /// One pending transaction by id, wire-encoded
    pub fn get_pending(&self, id: &str) -> Option<WirePendingTransaction> {
        let pt = self.pending.get(id)?;
        WirePendingTransaction::from_pending(&pt).ok()
    }

    /// The peer directory as currently on disk
    pub fn peers(&self) -> HashMap<String, Peer> {
        match self.peer_store.load_all() {
            Ok(peers) => peers,
            Err(e) => {
                warn!("failed to load peers: {}", e);
                HashMap::new()
            }
        }
    }

    /// Verify both transaction signatures against the peer directory.
    ///
    /// add_node blocks carry no signatures by design and pass unchecked.
    fn verify_block_signatures(&self, block: &Block) -> Result<()> {
        if block.payload.kind != BlockType::Transaction {
            return Ok(());
        }

        let tx = block.transaction_data()?;
        let signing_bytes = tx.signing_bytes()?;
        let peers = self.peer_store.load_all()?;

        if block.payload.from_signature.is_empty() {
            return Err(Error::Signature("missing from signature".to_string()));
        }
        let from_peer = peers
            .get(&tx.from)
            .ok_or_else(|| Error::UnknownPeer(tx.from.clone()))?;
        let from_key = public_key_from_hex(&from_peer.public_key)
            .map_err(|e| Error::Signature(format!("bad public key for {}: {}", tx.from, e)))?;
        if !verify_base64(&from_key, &signing_bytes, &block.payload.from_signature) {
            return Err(Error::Signature(format!("invalid from signature by {}", tx.from)));
        }

        if block.payload.to_signature.is_empty() {
            return Err(Error::Signature("missing to signature".to_string()));
        }
        let to_peer = peers
            .get(&tx.to)
            .ok_or_else(|| Error::UnknownPeer(tx.to.clone()))?;
        let to_key = public_key_from_hex(&to_peer.public_key)
            .map_err(|e| Error::Signature(format!("bad public key for {}: {}", tx.to, e)))?;
        if !verify_base64(&to_key, &signing_bytes, &block.payload.to_signature) {
            return Err(Error::Signature(format!("invalid to signature by {}", tx.to)));
        }

        Ok(())
    }

    /// Snapshot the pool to disk; failures are logged, not surfaced
    fn persist_pending(&self) {
        let items = self.pending.list();
        if let Err(e) = self.pending_store.save(&items) {
            warn!("failed to save pending transactions: {}", e);
        }
    }

    /// Fan a committed block out to all peers on a background task
    fn dispatch_broadcast(&self, block: &Block) -> Result<()> {
        let wire = WireBlock::from_block(block)?;
        let gossip = self.gossip.clone();
        let peers = self.peers();
        let self_name = self.config.node_name.clone();

        tokio::spawn(async move {
            gossip.broadcast_block(&wire, &peers, &self_name).await;
        });
        Ok(())
    }

    /// Forward a freshly created proposal to its counter-party, best-effort
    fn forward_proposal(&self, peer: &Peer, pending_tx: &PendingTransaction) -> Result<()> {
        let tx = pending_tx.transaction_data()?;
        let proposal = WireProposal {
            from: tx.from,
            to: tx.to,
            amount: tx.amount,
            title: tx.title,
            from_signature: pending_tx.payload.from_signature.clone(),
        };

        let gossip = self.gossip.clone();
        let address = peer.address.clone();
        let peer_name = peer.name.clone();
        tokio::spawn(async move {
            match gossip.forward_proposal(&address, &proposal).await {
                Ok(()) => info!("proposal forwarded to {} ({})", peer_name, address),
                Err(e) => warn!("failed to forward proposal to {} ({}): {}", peer_name, address, e),
            }
        });
        Ok(())
    }
}
