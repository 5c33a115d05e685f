use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::error::MiningError;

/// Leading hex digits a proof digest must start with. Fixed, never retargeted.
pub const PROOF_PREFIX: &str = "0000";

/// How many candidates are tried between cancellation/deadline checks.
const CHECK_INTERVAL: u64 = 1024;

/// True iff SHA-256 of `"{last_proof}{proof}"` starts with [`PROOF_PREFIX`].
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{last_proof}{proof}");
    let digest = Sha256::digest(guess.as_bytes());
    hex::encode(digest).starts_with(PROOF_PREFIX)
}

/// Linear scan from 0; returns the smallest proof valid against `last_proof`.
pub fn mine(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}

/// Same scan as [`mine`], but gives up once `cancel` is raised or `deadline`
/// passes. A returned proof always satisfies [`valid_proof`].
pub fn mine_with(
    last_proof: u64,
    cancel: &AtomicBool,
    deadline: Option<Instant>,
) -> Result<u64, MiningError> {
    let mut proof: u64 = 0;
    loop {
        if proof % CHECK_INTERVAL == 0 {
            if cancel.load(Ordering::Relaxed) {
                return Err(MiningError::Cancelled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(MiningError::TimedOut);
            }
        }
        if valid_proof(last_proof, proof) {
            return Ok(proof);
        }
        proof += 1;
    }
}
