use log::debug;
use serde::{Deserialize, Serialize};

use super::{Block, GENESIS_PREVIOUS_HASH, pow};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// The full chain together with its length, as served to clients and peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// In-memory chain plus the pool of transactions awaiting the next block.
///
/// The chain is never empty: the genesis block is created by [`Ledger::new`].
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending_transactions: Vec<Transaction>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Initialize a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending_transactions: Vec::new(),
        }
    }

    /// Queue a transaction for the next block.
    ///
    /// Returns the index the next block is expected to get. This is an
    /// estimate: the chain may be replaced before that block is mined.
    pub fn new_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: i64,
    ) -> Result<u64, LedgerError> {
        let next_index = self.last_block()?.index + 1;
        self.pending_transactions
            .push(Transaction::new(sender, recipient, amount));
        Ok(next_index)
    }

    /// Commit the pending pool as a new block carrying `proof`.
    ///
    /// `previous_hash` defaults to the hash of the current last block. The
    /// proof is not checked here; callers obtain it from [`pow::mine`].
    pub fn new_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, LedgerError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block()?.hash(),
        };
        let transactions = std::mem::take(&mut self.pending_transactions);
        let block = Block::new(
            self.chain.len() as u64 + 1,
            transactions,
            proof,
            previous_hash,
        );
        debug!(
            "ledger - committed block #{} with {} transaction(s)",
            block.index,
            block.transactions.len()
        );
        self.chain.push(block.clone());
        Ok(block)
    }

    /// Check every adjacent pair: index continuity, hash linkage and PoW.
    /// Chains of zero or one block are trivially valid.
    pub fn is_chain_valid(chain: &[Block]) -> bool {
        chain.windows(2).all(|pair| {
            let (prev, cur) = (&pair[0], &pair[1]);
            prev.index.checked_add(1) == Some(cur.index)
                && cur.previous_hash == prev.hash()
                && pow::valid_proof(prev.proof, cur.proof)
        })
    }

    /// True when the chain starts with a genesis-shaped block (`index = 1`,
    /// sentinel `previous_hash`), so later indices line up with positions.
    pub fn is_rooted_at_genesis(chain: &[Block]) -> bool {
        chain.first().is_some_and(|first| {
            first.index == 1 && first.previous_hash == GENESIS_PREVIOUS_HASH
        })
    }

    /// Swap in a whole new chain. The pending pool is kept.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.chain.clone(),
            length: self.chain.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }
}

/// Ledgers whose chains are mined for real; proofs are cached because each
/// one depends only on its predecessor.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::OnceLock;

    use super::Ledger;
    use crate::blockchain::{GENESIS_PROOF, pow};

    static PROOFS: OnceLock<Vec<u64>> = OnceLock::new();

    fn proofs() -> &'static [u64] {
        PROOFS.get_or_init(|| {
            let mut proofs = vec![GENESIS_PROOF];
            for _ in 0..6 {
                let last = *proofs.last().unwrap();
                proofs.push(pow::mine(last));
            }
            proofs
        })
    }

    /// A valid ledger with `length` blocks (genesis included, at most 7).
    pub(crate) fn mined_ledger(length: usize) -> Ledger {
        let mut ledger = Ledger::new();
        for (n, proof) in proofs().iter().skip(1).take(length - 1).enumerate() {
            ledger
                .new_transaction("alice", "bob", n as i64 + 1)
                .unwrap();
            ledger.new_block(*proof, None).unwrap();
        }
        assert_eq!(ledger.len(), length);
        ledger
    }
}
