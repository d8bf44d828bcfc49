//! Reward amounts
//!
//! Amounts are `U256` in the token's smallest denomination, matching the
//! `uint256` the claim leaf commits to. All arithmetic is checked.

use alloy_primitives::U256;

use crate::{Result, StashError};

pub type Amount = U256;

/// Parse a non-negative integer amount.
///
/// Decimal text is the normal form; `0x`-prefixed hex is also accepted.
/// Signs, fractions and values above `2^256 - 1` are rejected.
pub fn parse_amount(text: &str) -> Result<Amount> {
    let invalid = || StashError::InvalidAmount(text.to_string());

    let (digits, radix) = match text.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
        return Err(invalid());
    }

    U256::from_str_radix(digits, radix).map_err(|_| invalid())
}

/// Sum amounts, failing instead of wrapping.
pub fn checked_sum<'a, I>(amounts: I) -> Option<Amount>
where
    I: IntoIterator<Item = &'a Amount>,
{
    amounts
        .into_iter()
        .try_fold(U256::ZERO, |acc, amount| acc.checked_add(*amount))
}
