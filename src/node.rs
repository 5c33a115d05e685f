use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Deserialize;

use crate::blockchain::{Block, ChainSnapshot, Ledger, pow};
use crate::config::Config;
use crate::error::{NodeError, ValidationError};
use crate::network::{ConsensusOutcome, ConsensusResolver, PeerRegistry};
use crate::transaction::Transaction;

/// Transaction submission as received from a client. Every field is
/// optional here so that absence can be reported instead of failing to parse.
#[derive(Debug, Default, Deserialize)]
pub struct NewTransaction {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<i64>,
}

impl NewTransaction {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push("sender");
        }
        if self.recipient.is_none() {
            missing.push("recipient");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        missing
    }
}

/// One node's shared state: ledger, peers and mining settings.
///
/// Handlers get it by shared reference. The ledger mutex is held only for
/// short reads and commits, never while mining.
pub struct Node {
    ledger: Mutex<Ledger>,
    peers: RwLock<PeerRegistry>,
    mining: Mutex<()>,
    cancel_mining: AtomicBool,
    resolver: ConsensusResolver,
    node_id: String,
    reward_sender: String,
    mining_reward: i64,
    mining_timeout: Option<Duration>,
}

impl Node {
    pub fn new(config: &Config, resolver: ConsensusResolver) -> Self {
        Self {
            ledger: Mutex::new(Ledger::new()),
            peers: RwLock::new(PeerRegistry::new()),
            mining: Mutex::new(()),
            cancel_mining: AtomicBool::new(false),
            resolver,
            node_id: config.node_id.clone(),
            reward_sender: config.reward_sender.clone(),
            mining_reward: config.mining_reward,
            mining_timeout: config.mining_timeout,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().expect("mutex poisoned")
    }

    /// Mine a proof on top of the current tip, credit the reward and commit.
    ///
    /// Blocking and CPU-bound. Concurrent calls are serialized; if the tip
    /// changes while searching (a consensus replacement), the search restarts
    /// against the new tip.
    pub fn mine_next_block(&self) -> Result<Block, NodeError> {
        let _mining = self.mining.lock().expect("mutex poisoned");
        let deadline = self.mining_timeout.map(|t| Instant::now() + t);
        let started = Instant::now();

        loop {
            let (tip_index, tip_proof, tip_hash) = {
                let ledger = self.ledger();
                let last = ledger.last_block()?;
                (last.index, last.proof, last.hash())
            };

            let proof = pow::mine_with(tip_proof, &self.cancel_mining, deadline)?;

            let mut ledger = self.ledger();
            let last = ledger.last_block()?;
            if last.index != tip_index || last.hash() != tip_hash {
                debug!("MINER - tip moved from #{tip_index} while mining; retrying");
                continue;
            }

            ledger.new_transaction(
                self.reward_sender.as_str(),
                self.node_id.as_str(),
                self.mining_reward,
            )?;
            let block = ledger.new_block(proof, Some(tip_hash))?;
            info!(
                "MINER - sealed block #{} (proof={}, txs={}, {} ms)",
                block.index,
                block.proof,
                block.transactions.len(),
                started.elapsed().as_millis()
            );
            return Ok(block);
        }
    }

    /// Validate presence of every field, then queue the transaction.
    /// Returns the index of the block expected to include it.
    pub fn submit_transaction(&self, request: NewTransaction) -> Result<u64, NodeError> {
        let missing = request.missing_fields();
        let (Some(sender), Some(recipient), Some(amount)) =
            (request.sender, request.recipient, request.amount)
        else {
            warn!("transaction rejected: missing {}", missing.join(", "));
            return Err(ValidationError::MissingFields(missing).into());
        };

        let index = self.ledger().new_transaction(sender, recipient, amount)?;
        debug!("transaction queued for block #{index}");
        Ok(index)
    }

    pub fn chain(&self) -> ChainSnapshot {
        self.ledger().snapshot()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.ledger().pending_transactions().to_vec()
    }

    /// Whether the local chain passes validation, with its length.
    pub fn validate_local_chain(&self) -> (bool, usize) {
        let ledger = self.ledger();
        (Ledger::is_chain_valid(ledger.chain()), ledger.len())
    }

    /// Register every address or none of them. Returns all known peers.
    pub fn register_peers(
        &self,
        nodes: Option<Vec<String>>,
    ) -> Result<BTreeSet<String>, NodeError> {
        let nodes = nodes.ok_or(ValidationError::MissingNodes)?;
        let mut peers = self.peers.write().expect("rwlock poisoned");
        let locations = peers.register_all(&nodes)?;
        info!("registered {} peer(s); {} known", locations.len(), peers.len());
        Ok(peers.members().clone())
    }

    pub fn peers(&self) -> BTreeSet<String> {
        self.peers.read().expect("rwlock poisoned").members().clone()
    }

    /// Run one longest-valid-chain resolution against all known peers.
    pub async fn resolve_consensus(&self) -> ConsensusOutcome {
        let peers = self.peers();
        self.resolver.resolve(&self.ledger, &peers).await
    }

    /// Abort any search in progress and refuse new ones.
    pub fn cancel_mining(&self) {
        self.cancel_mining.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::blockchain::ledger::testing::mined_ledger;
    use crate::error::MiningError;
    use crate::network::consensus::testing::FakePeers;

    fn test_config() -> Config {
        Config {
            node_id: "node-under-test".into(),
            ..Config::default()
        }
    }

    fn test_node() -> Node {
        Node::new(&test_config(), ConsensusResolver::new(FakePeers::default()))
    }

    fn tx(sender: Option<&str>, recipient: Option<&str>, amount: Option<i64>) -> NewTransaction {
        NewTransaction {
            sender: sender.map(String::from),
            recipient: recipient.map(String::from),
            amount,
        }
    }

    #[test]
    fn mining_credits_reward_and_links_to_tip() {
        let node = test_node();
        node.submit_transaction(tx(Some("alice"), Some("bob"), Some(5)))
            .unwrap();
        let genesis = node.chain().chain[0].clone();

        let block = node.mine_next_block().unwrap();

        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis.hash());
        assert!(pow::valid_proof(genesis.proof, block.proof));
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("alice", "bob", 5));
        assert_eq!(
            block.transactions[1],
            Transaction::new("0", "node-under-test", 1)
        );
        assert!(node.pending_transactions().is_empty());
        assert_eq!(node.validate_local_chain(), (true, 2));
    }

    #[test]
    fn concurrent_mines_each_extend_the_chain() {
        let node = Arc::new(test_node());
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let node = Arc::clone(&node);
                thread::spawn(move || node.mine_next_block().unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(node.validate_local_chain(), (true, 3));
    }

    #[test]
    fn cancelled_node_refuses_to_mine() {
        let node = test_node();
        node.cancel_mining();
        assert!(matches!(
            node.mine_next_block(),
            Err(NodeError::Mining(MiningError::Cancelled))
        ));
        assert_eq!(node.chain().length, 1);
    }

    #[test]
    fn zero_timeout_gives_up() {
        let config = Config {
            mining_timeout: Some(Duration::ZERO),
            ..test_config()
        };
        let node = Node::new(&config, ConsensusResolver::new(FakePeers::default()));
        assert!(matches!(
            node.mine_next_block(),
            Err(NodeError::Mining(MiningError::TimedOut))
        ));
    }

    #[test]
    fn submit_reports_next_block_index() {
        let node = test_node();
        let index = node
            .submit_transaction(tx(Some("a"), Some("b"), Some(3)))
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(node.pending_transactions().len(), 1);
    }

    #[test]
    fn submit_without_amount_is_rejected_and_pool_unchanged() {
        let node = test_node();
        node.submit_transaction(tx(Some("a"), Some("b"), Some(1)))
            .unwrap();
        let before = node.pending_transactions();

        let err = node
            .submit_transaction(tx(Some("a"), Some("b"), None))
            .unwrap_err();

        assert!(matches!(
            err,
            NodeError::Validation(ValidationError::MissingFields(ref f)) if f == &vec!["amount"]
        ));
        assert_eq!(node.pending_transactions(), before);
    }

    #[test]
    fn submit_lists_every_missing_field() {
        let node = test_node();
        let err = node.submit_transaction(NewTransaction::default()).unwrap_err();
        assert_eq!(err.to_string(), "missing fields: sender, recipient, amount");
    }

    #[test]
    fn register_requires_node_list() {
        let node = test_node();
        assert!(matches!(
            node.register_peers(None),
            Err(NodeError::Validation(ValidationError::MissingNodes))
        ));
    }

    #[test]
    fn register_is_all_or_nothing() {
        let node = test_node();
        let result = node.register_peers(Some(vec![
            "http://127.0.0.1:5001".into(),
            "http://".into(),
        ]));
        assert!(result.is_err());
        assert!(node.peers().is_empty());

        let registered = node
            .register_peers(Some(vec![
                "http://127.0.0.1:5001".into(),
                "127.0.0.1:5001".into(),
                "http://127.0.0.1:5002/".into(),
            ]))
            .unwrap();
        assert_eq!(registered.len(), 2);
    }

    #[actix_web::test]
    async fn resolve_adopts_longer_peer_chain() {
        let remote = mined_ledger(3).snapshot();
        let peer = FakePeers::default().with("peer:5000", Some(remote.clone()));
        let node = Node::new(&test_config(), ConsensusResolver::new(peer));
        node.register_peers(Some(vec!["http://peer:5000".into()]))
            .unwrap();

        let outcome = node.resolve_consensus().await;

        assert!(outcome.replaced);
        assert_eq!(node.chain(), remote);
    }

    #[actix_web::test]
    async fn resolve_without_peers_keeps_chain() {
        let node = test_node();
        let outcome = node.resolve_consensus().await;
        assert!(!outcome.replaced);
        assert_eq!(outcome.chain.len(), 1);
    }
}
