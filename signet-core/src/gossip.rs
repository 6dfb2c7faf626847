//! Gossip client: block fan-out, proposal forwarding, chain fetch
//!
//! Delivery is best-effort. Send failures are logged and dropped; a peer
//! that misses a broadcast catches up through `sync()`. The broadcast lock
//! keeps two concurrent fan-out cycles from interleaving, which bounds the
//! inbound POST concurrency one sender can impose on a peer.

use crate::config::normalize_address;
use crate::types::Peer;
use crate::wire::{WireBlock, WireProposal};
use crate::{Error, Result};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Overall timeout applied to every outbound request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by all gossip operations
#[derive(Debug)]
pub struct GossipClient {
    client: reqwest::Client,
    broadcast_lock: Mutex<()>,
}

impl GossipClient {
    /// Build the client with the fixed request timeout
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            broadcast_lock: Mutex::new(()),
        }
    }

    /// Send a committed block to every peer except self, in parallel.
    ///
    /// Holds the broadcast lock for the duration of the fan-out cycle. All
    /// errors are logged and swallowed.
    pub async fn broadcast_block(
        &self,
        block: &WireBlock,
        peers: &HashMap<String, Peer>,
        self_name: &str,
    ) {
        let _cycle = self.broadcast_lock.lock().await;

        let sends = peers
            .iter()
            .filter(|(name, _)| name.as_str() != self_name)
            .map(|(name, peer)| {
                let address = peer.address.clone();
                async move {
                    match self.send_block(&address, block).await {
                        Ok(()) => debug!("sent block {} to {}", block.header.index, name),
                        Err(e) => {
                            warn!("failed to send block to {} ({}): {}", name, address, e)
                        }
                    }
                }
            });

        join_all(sends).await;
    }

    /// POST a block to one peer
    pub async fn send_block(&self, address: &str, block: &WireBlock) -> Result<()> {
        let url = format!("http://{}/block", normalize_address(address));
        let response = self.client.post(&url).json(block).send().await?;
        check_status(url, response).await?;
        Ok(())
    }

    /// POST a proposal to the counter-party's propose endpoint
    pub async fn forward_proposal(&self, address: &str, proposal: &WireProposal) -> Result<()> {
        let url = format!(
            "http://{}/transaction/propose",
            normalize_address(address)
        );
        let response = self.client.post(&url).json(proposal).send().await?;
        check_status(url, response).await?;
        Ok(())
    }

    /// GET a peer's full chain
    pub async fn fetch_chain(&self, address: &str) -> Result<Vec<WireBlock>> {
        let url = format!("http://{}/chain", normalize_address(address));
        let response = self.client.get(&url).send().await?;
        let response = check_status(url, response).await?;
        Ok(response.json().await?)
    }
}

impl Default for GossipClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check_status(url: String, response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Transport(format!(
            "unexpected status {} from {}: {}",
            status, url, body
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, address: &str) -> Peer {
        Peer {
            name: name.to_string(),
            nick_name: name.to_string(),
            address: address.to_string(),
            public_key: String::new(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_skips_self_and_survives_dead_peers() {
        let client = GossipClient::new();
        let block = WireBlock::from_block(&crate::block::Block::genesis()).unwrap();

        // nothing is listening on these addresses; the fan-out must still
        // complete without surfacing an error
        let mut peers = HashMap::new();
        peers.insert("self".to_string(), peer("self", "127.0.0.1:1"));
        peers.insert("other".to_string(), peer("other", "127.0.0.1:1"));

        client.broadcast_block(&block, &peers, "self").await;
    }

    #[tokio::test]
    async fn test_fetch_chain_unreachable_is_transport_error() {
        let client = GossipClient::new();
        let err = client.fetch_chain("127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
