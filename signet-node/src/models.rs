//! Request bodies accepted by the HTTP shell

use serde::{Deserialize, Serialize};

/// Body of `POST /transaction/propose`
///
/// `from_signature` is empty for a user-initiated proposal (the node signs
/// locally) and set when a peer forwards an already-signed proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRequest {
    /// Proposing peer
    pub from: String,
    /// Counter-party peer
    pub to: String,
    /// Amount in the ledger's opaque unit
    pub amount: i64,
    /// Human-readable reason
    pub title: String,
    /// Base64 signature over the signing pre-image, or empty
    #[serde(default)]
    pub from_signature: String,
}

/// Body of `POST /transaction/approve` and `POST /transaction/reject`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingIdRequest {
    /// Pending-pool id
    pub id: String,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Network-unique peer identifier
    pub node_name: String,
    /// Display name
    pub nick_name: String,
    /// `host` or `host:port`
    pub address: String,
    /// Hex-encoded Ed25519 public key
    pub public_key: String,
}
