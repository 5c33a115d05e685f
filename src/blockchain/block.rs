use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF, hasher};
use crate::transaction::Transaction;

/// A single block in the chain holding the batch of transactions committed
/// together with its proof-of-work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64, // seconds since the Unix epoch (UTC)
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis() -> Self {
        Self::new(1, Vec::new(), GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Create a block stamped with the current time.
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        proof: u64,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp: now_secs(),
            transactions,
            proof,
            previous_hash,
        }
    }

    /// Hex SHA-256 of the block's canonical serialization.
    pub fn hash(&self) -> String {
        hasher::hash(self)
    }
}

fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::transaction::Transaction;

    #[test]
    fn genesis_uses_sentinels() {
        let b = Block::genesis();
        assert_eq!(b.index, 1);
        assert_eq!(b.previous_hash, "1");
        assert_eq!(b.proof, 100);
        assert!(b.transactions.is_empty());
        assert!(b.timestamp > 0.0);
    }

    #[test]
    fn hash_changes_when_transactions_are_tampered() {
        let mut b = Block::new(
            2,
            vec![Transaction::new("alice", "bob", 5)],
            35293,
            "prev".into(),
        );
        let old_hash = b.hash();

        b.transactions.push(Transaction::new("mallory", "mallory", 1_000));

        assert_ne!(old_hash, b.hash());
    }

    #[test]
    fn hash_survives_json_round_trip() {
        let b = Block::new(4, vec![Transaction::new("a", "b", 3)], 12, "h".into());
        let json = serde_json::to_string(&b).expect("serialize");
        let back: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, b);
        assert_eq!(back.hash(), b.hash());
    }
}
