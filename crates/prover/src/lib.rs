//! StashCraft Prover
//!
//! Leaf encoding, sorted-pair Merkle tree and proof verification for claim
//! distributions.
//!
//! The `MerkleTree` is used by the aggregator to commit a distribution and
//! hand out one proof per claimant. The same hashing rules are what the
//! on-chain stash checks when a claim is submitted, so `merkle_leaf` and
//! `hash_pair` are a compatibility surface.

pub mod merkle;
pub mod verify;

pub use merkle::{hash_pair, merkle_leaf, verify_proof, MerkleProof, MerkleTree};
pub use verify::{verify_snapshot, ProofFailure};
