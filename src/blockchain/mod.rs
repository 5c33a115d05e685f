pub mod block;
pub mod hasher;
pub mod ledger;
pub mod pow;

pub use block::Block;
pub use ledger::{ChainSnapshot, Ledger};

/// `previous_hash` sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Seed proof of the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Sender recorded on the mining reward transaction.
pub const DEFAULT_REWARD_SENDER: &str = "0";

/// Amount credited to the miner for each block (tutorial value).
pub const DEFAULT_MINING_REWARD: i64 = 1;
