//! Reward pool: one amount per address for the cycle being built.

use std::collections::BTreeMap;

use tracing::debug;

use stashcraft_core::{
    checked_sum, checksum, parse_address, parse_amount, Address, Amount, RewardRow, Result,
    StashError,
};

/// Deduplicated mapping of address → amount.
///
/// Keys are ordered by address bytes; that order is the leaf index order of
/// the committed distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardPool {
    amounts: BTreeMap<Address, Amount>,
}

impl RewardPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate raw rows, summing repeated addresses.
    ///
    /// Any malformed row fails the whole batch; no partial pool is returned.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a RewardRow>,
    {
        let mut pool = Self::new();
        let mut count = 0usize;
        for row in rows {
            let account = parse_address(&row.address)?;
            let amount = parse_amount(&row.amount)?;
            pool.credit(account, amount)?;
            count += 1;
        }
        debug!("Aggregated {} rows into {} accounts", count, pool.len());
        Ok(pool)
    }

    /// Add `amount` to `account`, creating the entry if absent.
    pub fn credit(&mut self, account: Address, amount: Amount) -> Result<()> {
        let entry = self.amounts.entry(account).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| StashError::AmountOverflow(checksum(&account)))?;
        Ok(())
    }

    pub fn get(&self, account: &Address) -> Option<Amount> {
        self.amounts.get(account).copied()
    }

    pub fn contains(&self, account: &Address) -> bool {
        self.amounts.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Sum of all amounts.
    pub fn total(&self) -> Result<Amount> {
        checked_sum(self.amounts.values())
            .ok_or_else(|| StashError::AmountOverflow("pool total".to_string()))
    }

    /// Entries in leaf order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.amounts.iter()
    }
}
