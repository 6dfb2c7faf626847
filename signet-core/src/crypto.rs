//! Cryptographic operations for the ledger
//!
//! This module provides:
//! - SHA-256 hashing to lowercase hex
//! - Ed25519 key pair generation, signing, and verification
//! - Private key persistence (PEM-like envelope or raw base64)

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Ed25519 public key size in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Ed25519 private key size in bytes (seed + public half)
pub const PRIVATE_KEY_SIZE: usize = 64;

const PEM_HEADER: &str = "-----BEGIN ED25519 PRIVATE KEY-----";
const PEM_FOOTER: &str = "-----END ED25519 PRIVATE KEY-----";

/// Hash arbitrary bytes with SHA-256 and return lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Ed25519 key pair for signing
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
        Self { signing_key }
    }

    /// Create from a 32-byte seed (deterministic)
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Create from the 64-byte keypair encoding (seed || public key)
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PRIVATE_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::Key(format!("invalid private key size: {}", bytes.len())))?;
        let signing_key = SigningKey::from_keypair_bytes(&bytes)
            .map_err(|e| Error::Key(format!("malformed key pair: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Public half of the key pair
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as lowercase hex (the peer-directory encoding)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message and return the base64-encoded signature
    pub fn sign_base64(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        BASE64.encode(signature.to_bytes())
    }

    /// Write the private key to `path` as a PEM-like envelope
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let encoded = BASE64.encode(self.signing_key.to_keypair_bytes());
        let mut out = String::with_capacity(encoded.len() + 80);
        out.push_str(PEM_HEADER);
        out.push('\n');
        for chunk in encoded.as_bytes().chunks(64) {
            // chunks of valid base64 are ASCII, so this cannot fail
            out.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
            out.push('\n');
        }
        out.push_str(PEM_FOOTER);
        out.push('\n');
        fs::write(path, out)?;
        Ok(())
    }

    /// Load a private key from `path`
    ///
    /// Accepts the PEM-like envelope written by [`KeyPair::save`] or a bare
    /// base64 string. Rejects keys that are not exactly 64 bytes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let body = if content.contains(PEM_HEADER) {
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with("-----"))
                .collect::<String>()
        } else {
            content.split_whitespace().collect::<String>()
        };

        let bytes = BASE64
            .decode(body.as_bytes())
            .map_err(|e| Error::Key(format!("failed to decode base64 private key: {}", e)))?;
        Self::from_keypair_bytes(&bytes)
    }
}

/// Decode a hex-encoded Ed25519 public key
pub fn public_key_from_hex(s: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(s).map_err(|e| Error::Key(format!("invalid hex public key: {}", e)))?;
    let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| Error::Key(format!("invalid public key size: {}", v.len())))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| Error::Key(format!("invalid public key: {}", e)))
}

/// Verify a base64-encoded signature over `message`
///
/// Never fails: any decode or verification error yields `false`.
pub fn verify_base64(public_key: &VerifyingKey, message: &[u8], signature_base64: &str) -> bool {
    let bytes = match BASE64.decode(signature_base64) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let signature = match Signature::from_slice(&bytes) {
        Ok(s) => s,
        Err(_) => return false,
    };
    public_key.verify(message, &signature).is_ok()
}
