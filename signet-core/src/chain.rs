//! In-memory chain container
//!
//! Single-writer/many-reader container for the ordered block list. The hash
//! set is a denormalized accelerator rebuilt from the block list on load.

use crate::block::Block;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashSet;

/// The ordered sequence of blocks starting at genesis
#[derive(Debug)]
pub struct Chain {
    inner: RwLock<ChainInner>,
}

#[derive(Debug)]
struct ChainInner {
    blocks: Vec<Block>,
    hashes: HashSet<String>,
}

impl Chain {
    /// Create a chain holding only the genesis block
    pub fn new() -> Self {
        let genesis = Block::genesis();
        let mut hashes = HashSet::new();
        hashes.insert(genesis.header.hash.clone());
        Self {
            inner: RwLock::new(ChainInner {
                blocks: vec![genesis],
                hashes,
            }),
        }
    }

    /// Rebuild a chain from persisted blocks, as-is.
    ///
    /// No fresh genesis is generated; the stored first block must already be
    /// at the genesis position.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(Error::InvalidChain("no blocks".to_string()));
        }
        if !blocks[0].is_genesis() {
            return Err(Error::InvalidChain(
                "first block is not a genesis block".to_string(),
            ));
        }

        let hashes = blocks.iter().map(|b| b.header.hash.clone()).collect();
        Ok(Self {
            inner: RwLock::new(ChainInner { blocks, hashes }),
        })
    }

    /// Append a block to the tail.
    ///
    /// The block must validate, link to the current tail hash, carry the next
    /// index, and bring a hash the chain has not seen. Atomic on success.
    pub fn append(&self, block: Block) -> Result<()> {
        block.validate()?;

        let mut inner = self.inner.write();

        if let Some(tail) = inner.blocks.last() {
            if block.header.prev_hash != tail.header.hash {
                return Err(Error::InvalidBlock(format!(
                    "prev_hash mismatch: expected {}, got {}",
                    tail.header.hash, block.header.prev_hash
                )));
            }
            if block.header.index != tail.header.index + 1 {
                return Err(Error::InvalidBlock(format!(
                    "index mismatch: expected {}, got {}",
                    tail.header.index + 1,
                    block.header.index
                )));
            }
        }

        if inner.hashes.contains(&block.header.hash) {
            return Err(Error::InvalidBlock(format!(
                "duplicate block: {}",
                block.header.hash
            )));
        }

        inner.hashes.insert(block.header.hash.clone());
        inner.blocks.push(block);
        Ok(())
    }

    /// Replace the whole chain under the longest-chain rule.
    ///
    /// Accepts only a strictly longer candidate that starts at the fixed
    /// genesis, where every block validates, linkage is consistent, and all
    /// hashes are unique. Rejects wholesale otherwise.
    pub fn replace(&self, blocks: Vec<Block>) -> Result<()> {
        let mut inner = self.inner.write();

        if blocks.is_empty() {
            return Err(Error::InvalidChain("new chain is empty".to_string()));
        }
        if blocks.len() <= inner.blocks.len() {
            return Err(Error::InvalidChain(format!(
                "new chain is not longer: new length {}, current length {}",
                blocks.len(),
                inner.blocks.len()
            )));
        }
        // chain roots must be the shared constant, not merely genesis-shaped
        if blocks[0].header.hash != Block::genesis_hash() {
            return Err(Error::InvalidChain(
                "new chain does not start with the network genesis block".to_string(),
            ));
        }

        let mut hashes = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            block
                .validate()
                .map_err(|e| Error::InvalidChain(format!("new chain contains invalid block: {}", e)))?;
            if !hashes.insert(block.header.hash.clone()) {
                return Err(Error::InvalidChain(format!(
                    "new chain contains duplicate block: {}",
                    block.header.hash
                )));
            }
        }

        for pair in blocks.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);
            if current.header.prev_hash != prev.header.hash {
                return Err(Error::InvalidChain(format!(
                    "new chain has a broken link at index {}",
                    current.header.index
                )));
            }
            if current.header.index != prev.header.index + 1 {
                return Err(Error::InvalidChain(format!(
                    "new chain has an invalid index at {}",
                    current.header.index
                )));
            }
        }

        inner.blocks = blocks;
        inner.hashes = hashes;
        Ok(())
    }

    /// Snapshot of all blocks in order
    pub fn blocks(&self) -> Vec<Block> {
        self.inner.read().blocks.clone()
    }

    /// The tail block, if any
    pub fn tail(&self) -> Option<Block> {
        self.inner.read().blocks.last().cloned()
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.inner.read().blocks.len()
    }

    /// Whether the chain holds no blocks
    pub fn is_empty(&self) -> bool {
        self.inner.read().blocks.is_empty()
    }

    /// Hash of the tail block, empty string when the chain is empty
    pub fn last_hash(&self) -> String {
        self.inner
            .read()
            .blocks
            .last()
            .map(|b| b.header.hash.clone())
            .unwrap_or_default()
    }

    /// Index of the tail block, -1 when the chain is empty
    pub fn last_index(&self) -> i64 {
        self.inner
            .read()
            .blocks
            .last()
            .map(|b| b.header.index as i64)
            .unwrap_or(-1)
    }

    /// Whether a block with the given hash is present
    pub fn has(&self, hash: &str) -> bool {
        self.inner.read().hashes.contains(hash)
    }

    /// Block at position `index`
    pub fn by_index(&self, index: usize) -> Option<Block> {
        self.inner.read().blocks.get(index).cloned()
    }

    /// Block with the given hash
    pub fn by_hash(&self, hash: &str) -> Option<Block> {
        self.inner
            .read()
            .blocks
            .iter()
            .find(|b| b.header.hash == hash)
            .cloned()
    }

    /// Re-run every chain invariant over the full block list
    pub fn validate(&self) -> Result<()> {
        let inner = self.inner.read();

        if inner.blocks.is_empty() {
            return Err(Error::InvalidChain("empty chain".to_string()));
        }
        if !inner.blocks[0].is_genesis() {
            return Err(Error::InvalidChain(
                "first block is not a valid genesis block".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(inner.blocks.len());
        for block in &inner.blocks {
            if !seen.insert(block.header.hash.as_str()) {
                return Err(Error::InvalidChain(format!(
                    "duplicate hash in chain: {}",
                    block.header.hash
                )));
            }
        }

        for (i, pair) in inner.blocks.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            current.validate().map_err(|e| {
                Error::InvalidChain(format!("block at index {} failed validation: {}", i + 1, e))
            })?;
            if current.header.prev_hash != prev.header.hash {
                return Err(Error::InvalidChain(format!(
                    "block at index {} has invalid prev_hash: expected {}, got {}",
                    i + 1,
                    prev.header.hash,
                    current.header.prev_hash
                )));
            }
            if current.header.index != prev.header.index + 1 {
                return Err(Error::InvalidChain(format!(
                    "block at index {} has invalid index: expected {}, got {}",
                    i + 1,
                    prev.header.index + 1,
                    current.header.index
                )));
            }
        }

        Ok(())
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
