use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;

use crate::blockchain::{Block, ChainSnapshot, Ledger};
use crate::error::PeerError;

/// Where peer chains come from.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, PeerError>;
}

/// Fetches `GET http://{peer}/chain` with a bounded timeout.
pub struct HttpChainSource {
    client: reqwest::Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, PeerError> {
        let url = format!("http://{peer}/chain");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Status(status.as_u16()));
        }
        Ok(response.json::<ChainSnapshot>().await?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsensusOutcome {
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/// Longest-valid-chain resolution against every registered peer.
pub struct ConsensusResolver {
    source: Box<dyn ChainSource>,
}

impl ConsensusResolver {
    pub fn new(source: impl ChainSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Query all `peers` concurrently and adopt the longest valid chain that
    /// is strictly longer than the local one.
    ///
    /// The verdict is taken only after every fetch has finished. Unreachable
    /// or misbehaving peers are skipped, so this never fails.
    pub async fn resolve(
        &self,
        ledger: &Mutex<Ledger>,
        peers: &BTreeSet<String>,
    ) -> ConsensusOutcome {
        let local_length = ledger.lock().expect("mutex poisoned").len();

        let fetches = peers.iter().map(|peer| async move {
            let result = self.source.fetch_chain(peer).await.and_then(check_length);
            (peer, result)
        });
        let responses = join_all(fetches).await;

        let mut max_length = local_length;
        let mut best: Option<Vec<Block>> = None;
        for (peer, result) in responses {
            match result {
                Ok(snapshot) if snapshot.length <= max_length => {
                    debug!(
                        "consensus - peer {peer} has {} block(s), not longer than {max_length}",
                        snapshot.length
                    );
                }
                Ok(snapshot) if !Ledger::is_rooted_at_genesis(&snapshot.chain) => {
                    warn!(
                        "consensus - peer {peer} offered a chain without a genesis root; ignored"
                    );
                }
                Ok(snapshot) if Ledger::is_chain_valid(&snapshot.chain) => {
                    debug!("consensus - peer {peer} offers a valid chain of {}", snapshot.length);
                    max_length = snapshot.length;
                    best = Some(snapshot.chain);
                }
                Ok(snapshot) => {
                    warn!(
                        "consensus - peer {peer} offered an invalid chain of {} block(s); ignored",
                        snapshot.length
                    );
                }
                Err(err) => warn!("consensus - skipping peer {peer}: {err}"),
            }
        }

        let mut ledger = ledger.lock().expect("mutex poisoned");
        let replaced = match best {
            Some(chain) if chain.len() > ledger.len() => {
                info!(
                    "consensus - replaced local chain ({} -> {} blocks)",
                    ledger.len(),
                    chain.len()
                );
                ledger.replace_chain(chain);
                true
            }
            Some(chain) => {
                info!(
                    "consensus - local chain grew to {} during resolution; kept it over {} peer blocks",
                    ledger.len(),
                    chain.len()
                );
                false
            }
            None => {
                info!(
                    "consensus - local chain of {} is authoritative ({} peer(s) asked)",
                    ledger.len(),
                    peers.len()
                );
                false
            }
        };

        ConsensusOutcome {
            replaced,
            chain: ledger.chain().to_vec(),
        }
    }
}

/// A peer's reported length must match the blocks it actually sent.
fn check_length(snapshot: ChainSnapshot) -> Result<ChainSnapshot, PeerError> {
    if snapshot.length != snapshot.chain.len() {
        return Err(PeerError::Malformed(format!(
            "reported length {} but sent {} block(s)",
            snapshot.length,
            snapshot.chain.len()
        )));
    }
    Ok(snapshot)
}
