//! StashCraft Settlement
//!
//! Read-only access to the on-chain claim stash.
//!
//! ## What the stash exposes
//!
//! 1. **Root**: `merkleRoot(token)` is the live distribution root. It is zero
//!    while the distribution is paused for an update.
//! 2. **Update counter**: `update(token)` counts committed distributions. The
//!    bitmap of the cycle currently on disk is stored under `update - 1`.
//! 3. **Claimed bitmap**: one bit per claim index, 256 bits per storage word,
//!    at the slot computed by [`claimed_word_slot`].
//!
//! The regeneration pipeline only depends on the [`ClaimStatusOracle`] trait;
//! [`StashClient`] implements it against JSON-RPC (Live) or in memory (Mock).

mod client;
mod oracle;
mod slot;

pub use client::{OracleMode, StashClient, StashConfig, DEFAULT_STASH_ADDRESS};
pub use oracle::ClaimStatusOracle;
pub use slot::{address_word, claimed_word_slot, token_bitmap_slot, CLAIMED_BITMAP_SLOT};
