//! File-backed persistence
//!
//! Three stores under one root directory:
//!
//! - [`BlockStore`]: append-only log, one JSON block per line
//! - [`PendingStore`]: full-file JSON array snapshot of the pending pool
//! - [`PeerStore`]: one `Key = value` record per peer under `nodes/`
//!
//! All writers run under the orchestrator; `replace_all` is the only
//! multi-block write and goes through a temp file plus atomic rename.

use crate::block::Block;
use crate::config::parse_kv;
use crate::types::{is_valid_node_name, Peer, PendingTransaction};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Append-only block log (`block.jsonl`)
#[derive(Debug)]
pub struct BlockStore {
    path: PathBuf,
}

impl BlockStore {
    /// Store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every block in file order. A missing file yields an empty list.
    pub fn load_all(&self) -> Result<Vec<Block>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut blocks = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let block: Block = serde_json::from_str(line).map_err(|e| {
                Error::InvalidChain(format!(
                    "failed to parse block at line {}: {}",
                    line_no + 1,
                    e
                ))
            })?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    /// Append one block as a single JSON line
    pub fn append(&self, block: &Block) -> Result<()> {
        let mut line = serde_json::to_string(block)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Rewrite the whole log atomically (tmp file, fsync, rename)
    pub fn replace_all(&self, blocks: &[Block]) -> Result<()> {
        let tmp_path = self.path.with_extension("jsonl.tmp");

        let mut file = File::create(&tmp_path)?;
        for block in blocks {
            let line = serde_json::to_string(block)?;
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
        }
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Full-file snapshot of the pending pool (`pending_transaction.json`)
#[derive(Debug)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    /// Store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the snapshot. A missing file yields an empty list.
    pub fn load(&self) -> Result<Vec<PendingTransaction>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Rewrite the snapshot in full
    pub fn save(&self, items: &[PendingTransaction]) -> Result<()> {
        let mut content = serde_json::to_string_pretty(items)?;
        content.push('\n');
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Peer directory on disk: one record file per peer under `nodes/`
#[derive(Debug)]
pub struct PeerStore {
    dir: PathBuf,
}

impl PeerStore {
    /// Store backed by the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, name: &str) -> Result<PathBuf> {
        // the peer name becomes a filename; reject anything that could
        // escape the nodes/ directory
        if !is_valid_node_name(name) {
            return Err(Error::InvalidNodeName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Write one peer record
    pub fn save(&self, peer: &Peer) -> Result<()> {
        let path = self.record_path(&peer.name)?;
        fs::create_dir_all(&self.dir)?;

        let content = format!(
            "NickName = {}\nAddress = {}\nEd25519PublicKey = {}\n",
            peer.nick_name, peer.address, peer.public_key
        );
        fs::write(path, content)?;
        Ok(())
    }

    /// Read the record for one peer
    pub fn load(&self, name: &str) -> Result<Peer> {
        let path = self.record_path(name)?;
        let content = fs::read_to_string(path)?;
        let values = parse_kv(&content)?;

        Ok(Peer {
            name: name.to_string(),
            nick_name: values.get("NickName").cloned().unwrap_or_default(),
            address: values.get("Address").cloned().unwrap_or_default(),
            public_key: values.get("Ed25519PublicKey").cloned().unwrap_or_default(),
        })
    }

    /// Read every peer record in the directory.
    ///
    /// A missing directory yields an empty map; unreadable entries are
    /// skipped with a warning.
    pub fn load_all(&self) -> Result<HashMap<String, Peer>> {
        if !self.dir.exists() {
            return Ok(HashMap::new());
        }

        let mut peers = HashMap::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match self.load(&name) {
                Ok(peer) => {
                    peers.insert(name, peer);
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable peer record {}: {}", name, e);
                }
            }
        }
        Ok(peers)
    }

    /// Remove one peer record; missing records are not an error
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.record_path(name)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a record exists for the given name
    pub fn exists(&self, name: &str) -> bool {
        match self.record_path(name) {
            Ok(path) => path.exists(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{generate_id, BlockPayload, TransactionData};
    use chrono::Utc;

    fn tx_block(index: u64, prev_hash: String, amount: i64) -> Block {
        Block::with_transaction(
            index,
            prev_hash,
            &TransactionData {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount,
                title: "test".to_string(),
            },
            "from-sig".to_string(),
            "to-sig".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_block_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path().join("block.jsonl"));

        assert!(store.load_all().unwrap().is_empty());

        let genesis = Block::genesis();
        let second = tx_block(1, genesis.header.hash.clone(), 100);
        store.append(&genesis).unwrap();
        store.append(&second).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].header.hash, genesis.header.hash);
        assert_eq!(loaded[1].header.hash, second.header.hash);
        loaded[1].validate().unwrap();
    }

    #[test]
    fn test_block_store_rejects_corrupt_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let store = BlockStore::new(path);
        assert!(store.load_all().is_err());
    }

    #[test]
    fn test_block_store_replace_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlockStore::new(dir.path().join("block.jsonl"));

        let genesis = Block::genesis();
        store.append(&genesis).unwrap();
        store.append(&tx_block(1, genesis.header.hash.clone(), 1)).unwrap();

        let replacement = vec![
            genesis.clone(),
            tx_block(1, genesis.header.hash.clone(), 10),
            // note: linkage is the chain's concern, the store writes as told
        ];
        store.replace_all(&replacement).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded[1].transaction_data().unwrap().amount,
            10
        );
        assert!(!dir.path().join("block.jsonl.tmp").exists());
    }

    #[test]
    fn test_pending_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path().join("pending_transaction.json"));

        assert!(store.load().unwrap().is_empty());

        let payload = BlockPayload::transaction(
            &TransactionData {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: 42,
                title: "coffee".to_string(),
            },
            "from-sig".to_string(),
            String::new(),
        )
        .unwrap();
        let pt = PendingTransaction::new(generate_id(&payload, Utc::now()), payload);

        store.save(&[pt.clone()]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, pt.id);
        assert_eq!(loaded[0].transaction_data().unwrap().amount, 42);

        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_peer_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PeerStore::new(dir.path().join("nodes"));

        assert!(store.load_all().unwrap().is_empty());
        assert!(!store.exists("alice"));

        let peer = Peer {
            name: "alice".to_string(),
            nick_name: "Alice".to_string(),
            address: "10.0.0.1:8080".to_string(),
            public_key: "ab".repeat(32),
        };
        store.save(&peer).unwrap();

        assert!(store.exists("alice"));
        assert_eq!(store.load("alice").unwrap(), peer);

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["alice"], peer);

        store.delete("alice").unwrap();
        assert!(!store.exists("alice"));
        store.delete("alice").unwrap(); // idempotent
    }

    #[test]
    fn test_peer_store_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = PeerStore::new(dir.path().join("nodes"));

        for name in ["../evil", "a/b", "a\\b", "..", ".", ""] {
            let peer = Peer {
                name: name.to_string(),
                nick_name: "x".to_string(),
                address: "h".to_string(),
                public_key: String::new(),
            };
            assert!(store.save(&peer).is_err(), "accepted {:?}", name);
            assert!(store.load(name).is_err());
            assert!(!store.exists(name));
        }
    }
}
