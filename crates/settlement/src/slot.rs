//! Storage slots of the claimed bitmap.
//!
//! The stash declares
//! `mapping(address => mapping(uint256 => mapping(uint256 => uint256)))`
//! at slot 3 (token → update → word index → bits). Solidity places
//! `m[k]` at `keccak256(abi.encode(k, slot_of_m))`, applied once per key.

use alloy_primitives::{keccak256, Address, B256, U256};

/// Declaration slot of the claimed bitmap mapping.
pub const CLAIMED_BITMAP_SLOT: u64 = 3;

/// ABI-encode an address as a left-padded 32-byte word.
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

fn mapping_slot(key: [u8; 32], base: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&key);
    buf[32..].copy_from_slice(base.as_slice());
    keccak256(buf)
}

/// Slot of `bitmap[token]`.
pub fn token_bitmap_slot(token: &Address) -> B256 {
    let base = B256::from(U256::from(CLAIMED_BITMAP_SLOT).to_be_bytes::<32>());
    mapping_slot(address_word(token), &base)
}

/// Slot of `bitmap[token][update][word_index]`.
pub fn claimed_word_slot(token: &Address, update: U256, word_index: u64) -> B256 {
    let by_update = mapping_slot(update.to_be_bytes::<32>(), &token_bitmap_slot(token));
    mapping_slot(U256::from(word_index).to_be_bytes::<32>(), &by_update)
}
