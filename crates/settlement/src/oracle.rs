use std::future::Future;

use stashcraft_core::{Address, Result, B256, U256};

/// Read-only view of a token's claim state on the stash contract.
///
/// Implementations must not cache across runs; each call reflects the chain
/// at the configured block.
pub trait ClaimStatusOracle {
    /// Live root for `token`. Zero means the distribution is paused.
    fn current_root(&self, token: &Address) -> impl Future<Output = Result<B256>> + Send;

    /// Number of roots committed for `token` so far.
    fn update_counter(&self, token: &Address) -> impl Future<Output = Result<U256>> + Send;

    /// One 256-bit word of the claimed bitmap of cycle `update`.
    fn read_word(
        &self,
        token: &Address,
        update: U256,
        word_index: u64,
    ) -> impl Future<Output = Result<U256>> + Send;
}
