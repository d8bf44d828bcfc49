//! Sorted-pair Merkle tree over claim leaves.
//!
//! - Leaf: `keccak256(uint256 index || address account || uint256 amount)`,
//!   tightly packed (32 + 20 + 32 bytes), the `abi.encodePacked` layout.
//! - Parent: `keccak256(min(a, b) || max(a, b))`, so a verifier never needs
//!   to know whether a sibling was on the left or the right.
//! - Odd node at the end of a level is promoted unchanged to the next level
//!   and contributes no proof element at that level.
//! - A single leaf is its own root. Zero leaves have no root.
//!
//! Leaves stay in index order; the tree never re-sorts them. Roots therefore
//! differ from trees that also sort the leaf layer (merkletreejs with
//! `sort: true`), although proofs from either verify the same way.

use alloy_primitives::{keccak256, Address, B256, U256};

/// Hash one claim into a leaf.
pub fn merkle_leaf(index: u64, account: &Address, amount: &U256) -> B256 {
    let mut packed = [0u8; 84];
    packed[..32].copy_from_slice(&U256::from(index).to_be_bytes::<32>());
    packed[32..52].copy_from_slice(account.as_slice());
    packed[52..].copy_from_slice(&amount.to_be_bytes::<32>());
    keccak256(packed)
}

/// Combine two siblings, smaller hash first.
pub fn hash_pair(a: &B256, b: &B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling hashes, leaf level first
    pub siblings: Vec<B256>,
}

impl MerkleProof {
    /// Fold the siblings over `leaf` and compare with `root`.
    pub fn verify(&self, leaf: &B256, root: &B256) -> bool {
        verify_proof(leaf, &self.siblings, root)
    }
}

/// Stand-alone verification, as a sorted-pair verifier contract does it.
pub fn verify_proof(leaf: &B256, proof: &[B256], root: &B256) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |acc, sibling| hash_pair(&acc, sibling));
    computed == *root
}

/// Binary Merkle tree keeping every level for proof extraction.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// `levels[0]` are the leaves, the last level holds the root
    levels: Vec<Vec<B256>>,
}

impl MerkleTree {
    pub fn from_leaves(leaves: Vec<B256>) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves];
        while let Some(level) = levels.last().filter(|l| l.len() > 1) {
            let next: Vec<B256> = level
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    [odd] => *odd,
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }

        Self { levels }
    }

    /// Build from `(index-ordered) (account, amount)` pairs.
    pub fn from_claims<'a, I>(claims: I) -> Self
    where
        I: IntoIterator<Item = (&'a Address, &'a U256)>,
    {
        let leaves = claims
            .into_iter()
            .enumerate()
            .map(|(index, (account, amount))| merkle_leaf(index as u64, account, amount))
            .collect();
        Self::from_leaves(leaves)
    }

    /// Root hash, `None` for an empty tree.
    pub fn root(&self) -> Option<B256> {
        self.levels.last().and_then(|top| top.first()).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leaf(&self, index: usize) -> Option<B256> {
        self.levels.first()?.get(index).copied()
    }

    /// Proof for the leaf at `index`, `None` if out of range.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.len() {
            return None;
        }

        let mut siblings = Vec::new();
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(position ^ 1) {
                siblings.push(*sibling);
            }
            position /= 2;
        }

        Some(MerkleProof { siblings })
    }
}
