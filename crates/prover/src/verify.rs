//! Whole-ledger proof verification.

use stashcraft_core::{checksum, Address, LedgerSnapshot};
use tracing::debug;

use crate::merkle::{merkle_leaf, verify_proof};

/// Why a snapshot failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofFailure {
    #[error("Snapshot has claims but no merkle root")]
    MissingRoot,

    #[error("Snapshot has a merkle root but no claims")]
    UnexpectedRoot,

    #[error("Proof for {account} (index {index}) does not reproduce the root")]
    InvalidProof { account: String, index: u64 },
}

impl ProofFailure {
    fn invalid(account: &Address, index: u64) -> Self {
        Self::InvalidProof {
            account: checksum(account),
            index,
        }
    }
}

/// Recompute every claim's leaf and fold its proof up to the stored root.
pub fn verify_snapshot(snapshot: &LedgerSnapshot) -> Result<(), ProofFailure> {
    let root = match (&snapshot.merkle_root, snapshot.claims.is_empty()) {
        (None, true) => return Ok(()),
        (None, false) => return Err(ProofFailure::MissingRoot),
        (Some(_), true) => return Err(ProofFailure::UnexpectedRoot),
        (Some(root), false) => root,
    };

    for (account, claim) in &snapshot.claims {
        let leaf = merkle_leaf(claim.index, account, &claim.amount);
        if !verify_proof(&leaf, &claim.proof, root) {
            return Err(ProofFailure::invalid(account, claim.index));
        }
    }

    debug!(
        "Verified {} claim proofs for {} ({})",
        snapshot.claims.len(),
        snapshot.symbol,
        snapshot.date,
    );
    Ok(())
}
