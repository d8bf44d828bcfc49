//! Carry-over of unclaimed amounts from the previous cycle.
//!
//! The previous cycle's bitmap lives under `update - 1` on the stash. Every
//! previous entry whose bit is unset is credited back into the new pool; set
//! bits were paid out and are dropped.

use tracing::{debug, info};

use stashcraft_core::{
    checksum, hash_hex, Address, Amount, LedgerSnapshot, Result, StashError, B256, U256,
};
use stashcraft_settlement::ClaimStatusOracle;

use crate::rewards::RewardPool;

/// Bits per bitmap storage word.
pub const BITS_PER_WORD: u64 = 256;

/// Claimed bitmap of one cycle, covering indices `0..words.len() * 256`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimBitmap {
    words: Vec<U256>,
}

impl ClaimBitmap {
    pub fn from_words(words: Vec<U256>) -> Self {
        Self { words }
    }

    /// Words needed to cover `entries` indices.
    pub fn word_count(entries: usize) -> u64 {
        (entries as u64).div_ceil(BITS_PER_WORD)
    }

    /// `None` when `index` lies beyond the fetched words.
    pub fn is_claimed(&self, index: u64) -> Option<bool> {
        let word = self.words.get((index / BITS_PER_WORD) as usize)?;
        Some(word.bit((index % BITS_PER_WORD) as usize))
    }

    /// Fetch every word covering `entries` indices of cycle `update`.
    pub async fn fetch<O: ClaimStatusOracle>(
        oracle: &O,
        token: &Address,
        update: U256,
        entries: usize,
    ) -> Result<Self> {
        let count = Self::word_count(entries);
        let mut words = Vec::with_capacity(count as usize);
        for word_index in 0..count {
            let word = oracle.read_word(token, update, word_index).await?;
            debug!("Bitmap word {}: {} bits set", word_index, word.count_ones());
            words.push(word);
        }
        Ok(Self { words })
    }
}

/// What reconciliation did to the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryOverReport {
    /// Previous entries credited back
    pub carried: usize,
    pub carried_amount: Amount,
    /// Previous entries already withdrawn
    pub claimed: usize,
    pub claimed_amount: Amount,
    /// Update counter the bitmap was read from, `None` on genesis
    pub bitmap_update: Option<U256>,
}

/// Fold the unclaimed part of `previous` into `pool`.
///
/// Skipped entirely (no oracle calls) when `previous` has no claims. Fails
/// with `DistributionActive` if the stash still serves a root for `token`.
/// All bitmap words are fetched before the pool is touched.
pub async fn reconcile<O: ClaimStatusOracle>(
    oracle: &O,
    token: &Address,
    previous: &LedgerSnapshot,
    pool: &mut RewardPool,
) -> Result<CarryOverReport> {
    if previous.is_genesis() {
        info!("No previous claims for {}, skipping carry-over", previous.symbol);
        return Ok(CarryOverReport::default());
    }

    let root = oracle.current_root(token).await?;
    if root != B256::ZERO {
        return Err(StashError::DistributionActive {
            token: checksum(token),
            root: hash_hex(&root),
        });
    }

    let update = oracle.update_counter(token).await?;
    let bitmap_update = update.checked_sub(U256::from(1u64)).ok_or_else(|| {
        StashError::Oracle(format!(
            "update counter for {} is zero but a previous ledger exists",
            checksum(token)
        ))
    })?;

    let bitmap = ClaimBitmap::fetch(oracle, token, bitmap_update, previous.claims.len()).await?;

    let mut report = CarryOverReport {
        bitmap_update: Some(bitmap_update),
        ..Default::default()
    };
    for (account, claim) in &previous.claims {
        let claimed = bitmap.is_claimed(claim.index).ok_or_else(|| {
            StashError::Oracle(format!("bitmap does not cover index {}", claim.index))
        })?;
        if claimed {
            debug!("{} (index {}) already claimed {}", checksum(account), claim.index, claim.amount);
            report.claimed += 1;
            report.claimed_amount = report.claimed_amount.saturating_add(claim.amount);
        } else {
            debug!("Carrying {} for {} (index {})", claim.amount, checksum(account), claim.index);
            pool.credit(*account, claim.amount)?;
            report.carried += 1;
            report.carried_amount = report.carried_amount.saturating_add(claim.amount);
        }
    }

    info!(
        "Carry-over for {}: {} unclaimed ({}), {} claimed ({}) from update {}",
        previous.symbol,
        report.carried,
        report.carried_amount,
        report.claimed,
        report.claimed_amount,
        bitmap_update,
    );
    Ok(report)
}
