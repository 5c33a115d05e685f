pub mod consensus;
pub mod peers;

pub use consensus::{ConsensusOutcome, ConsensusResolver, HttpChainSource};
pub use peers::PeerRegistry;
