//! Error types for the ledger core

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Block failed structural validation (hash mismatch, broken linkage, duplicate)
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// Chain-level validation failed (bad genesis, inconsistent replacement)
    #[error("invalid chain: {0}")]
    InvalidChain(String),

    /// Signature missing, signer unknown, or Ed25519 verification failed
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// No pending transaction with the given id
    #[error("pending transaction not found: {0}")]
    PendingNotFound(String),

    /// Peer name absent from the peer directory
    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    /// Received block is ahead of the local tail; a chain sync is required
    #[error("block index {remote} is ahead of local chain tip {local}, sync needed")]
    SyncNeeded {
        /// Index carried by the received block
        remote: u64,
        /// Local tail index (-1 for an empty chain)
        local: i64,
    },

    /// Node name is unusable as a peer identifier / filename
    #[error("invalid node name: {0}")]
    InvalidNodeName(String),

    /// Key material could not be loaded or has the wrong size
    #[error("key error: {0}")]
    Key(String),

    /// Configuration file could not be parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File I/O failure in one of the stores
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer unreachable or answered with a non-success status
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
