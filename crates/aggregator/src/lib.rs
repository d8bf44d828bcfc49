//! StashCraft Aggregator
//!
//! Regenerates a token's claim distribution for a new cycle:
//!
//! 1. **Load**: read `latest.json` (or start from genesis).
//! 2. **Aggregate**: fold the new reward rows into a deduplicated pool.
//! 3. **Carry over**: check the stash is paused, read the previous cycle's
//!    claimed bitmap and credit every unclaimed entry back into the pool.
//! 4. **Commit**: assign indices, build the sorted-pair Merkle tree and one
//!    proof per claimant.
//! 5. **Persist**: archive the previous file if the date rolled over and
//!    atomically replace `latest.json`.
//!
//! Every failure happens before step 5 touches the ledger directory.

mod carry_over;
mod distribution;
mod rewards;
mod store;

pub use carry_over::{reconcile, CarryOverReport, ClaimBitmap, BITS_PER_WORD};
pub use distribution::{build_distribution, Distribution};
pub use rewards::RewardPool;
pub use store::{LedgerStore, SaveOutcome};

use tracing::info;

use stashcraft_core::{
    checksum, is_date_stamp, Address, LedgerSnapshot, Result, RewardRow, StashError,
};
use stashcraft_settlement::ClaimStatusOracle;

/// One regeneration run.
#[derive(Debug, Clone)]
pub struct RegenerateRequest {
    pub symbol: String,
    /// Token the distribution pays out
    pub token: Address,
    /// Date stamp of the new cycle (`YYYYMMDD`)
    pub date: String,
    /// New rewards for this cycle
    pub rows: Vec<RewardRow>,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RegenerateOutcome {
    /// The snapshot now in `latest.json`
    pub snapshot: LedgerSnapshot,
    pub carry_over: CarryOverReport,
    pub saved: SaveOutcome,
}

/// Drives one distribution through load → reconcile → commit → persist.
pub struct Regenerator<O> {
    oracle: O,
    store: LedgerStore,
}

impl<O: ClaimStatusOracle> Regenerator<O> {
    pub fn new(oracle: O, store: LedgerStore) -> Self {
        Self { oracle, store }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Run the whole pipeline for one request.
    pub async fn run(&self, request: &RegenerateRequest) -> Result<RegenerateOutcome> {
        if !is_date_stamp(&request.date) {
            return Err(StashError::InvalidDate(request.date.clone()));
        }
        info!(
            "Regenerating {} ({}) for {} with {} rows",
            request.symbol,
            checksum(&request.token),
            request.date,
            request.rows.len(),
        );

        let previous = self
            .store
            .load(&request.symbol, &request.token, &request.date)?;

        let mut pool = RewardPool::from_rows(&request.rows)?;
        let carry_over = reconcile(&self.oracle, &request.token, &previous, &mut pool).await?;

        let distribution = build_distribution(&pool)?;
        let snapshot = LedgerSnapshot {
            symbol: request.symbol.clone(),
            address: request.token,
            date: request.date.clone(),
            merkle_root: distribution.root,
            total: distribution.total,
            claims: distribution.claims,
        };

        let saved = self.store.save(&snapshot, &previous)?;
        info!(
            "Wrote {} ({} claims, total {})",
            saved.latest.display(),
            snapshot.claims.len(),
            snapshot.total,
        );

        Ok(RegenerateOutcome {
            snapshot,
            carry_over,
            saved,
        })
    }
}
