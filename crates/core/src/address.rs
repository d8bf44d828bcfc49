//! Address normalization
//!
//! Every ledger key is an `Address` parsed through [`parse_address`], so case
//! variants of the same account always collapse to one entry. The textual
//! form written to disk is the EIP-55 checksum.

use alloy_primitives::Address;

use crate::{Result, StashError};

/// Parse a textual address in any letter casing.
///
/// Accepts 40 hex characters with an optional `0x` prefix. All-lowercase and
/// all-uppercase inputs are accepted as-is; mixed-case input must carry a
/// valid EIP-55 checksum, otherwise it is treated as a typo and rejected.
pub fn parse_address(input: &str) -> Result<Address> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(StashError::InvalidAddress(input.to_string()));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|_| StashError::InvalidAddress(input.to_string()))?;
    let address = Address::from(bytes);

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        let checksummed = address.to_checksum(None);
        if checksummed[2..] != *digits {
            return Err(StashError::InvalidAddress(input.to_string()));
        }
    }

    Ok(address)
}

/// Canonical (checksummed) text for an address.
pub fn checksum(address: &Address) -> String {
    address.to_checksum(None)
}

/// Normalize a textual address to its checksummed form.
pub fn normalize_address(input: &str) -> Result<String> {
    parse_address(input).map(|a| checksum(&a))
}
