//! Commitment of a reward pool into a claim table.

use std::collections::BTreeMap;

use tracing::info;

use stashcraft_core::{hash_hex, Address, Amount, ClaimEntry, Result, StashError, B256};
use stashcraft_prover::MerkleTree;

use crate::rewards::RewardPool;

/// Merkle distribution for one cycle (ready to be written as a snapshot)
#[derive(Debug, Clone)]
pub struct Distribution {
    /// Root of the claim tree, `None` for an empty pool
    pub root: Option<B256>,
    /// Sum of every claim amount
    pub total: Amount,
    /// Per-address index, amount and proof
    pub claims: BTreeMap<Address, ClaimEntry>,
}

/// Assign indices and build the claim tree.
///
/// Index `i` goes to the `i`-th address in ascending byte order (the pool's
/// iteration order). The same enumeration feeds both leaf hashing and proof
/// extraction.
pub fn build_distribution(pool: &RewardPool) -> Result<Distribution> {
    let total = pool.total()?;
    let tree = MerkleTree::from_claims(pool.iter());

    let mut claims = BTreeMap::new();
    for (index, (account, amount)) in pool.iter().enumerate() {
        let proof = tree.proof(index).ok_or_else(|| {
            StashError::Serialization(format!("no proof for leaf {}", index))
        })?;
        claims.insert(
            *account,
            ClaimEntry {
                index: index as u64,
                amount: *amount,
                proof: proof.siblings,
            },
        );
    }

    let root = tree.root();
    info!(
        "Built distribution: {} claims, total {}, root {}",
        claims.len(),
        total,
        root.as_ref().map(hash_hex).unwrap_or_else(|| "<empty>".to_string()),
    );

    Ok(Distribution {
        root,
        total,
        claims,
    })
}
