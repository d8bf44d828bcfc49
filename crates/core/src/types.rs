//! Ledger types and their on-disk encoding
//!
//! The JSON layout (`symbol`, `address`, `date`, `merkleRoot`, `total`,
//! `claims`) is read by claim frontends and verifiers, so field names and
//! encodings are fixed:
//! - addresses are EIP-55 checksummed text
//! - amounts are decimal strings
//! - hashes are `0x`-prefixed lowercase hex
//! - an uncommitted root is the empty string

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::amount::checked_sum;
use crate::date::is_date_stamp;

/// One raw reward row as supplied by the row source (e.g. a CSV line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRow {
    pub address: String,
    pub amount: String,
}

impl RewardRow {
    pub fn new(address: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            amount: amount.into(),
        }
    }
}

/// A single claimable entry in a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    /// Leaf position, dense over `0..claims.len()`
    pub index: u64,
    #[serde(with = "amount_text")]
    pub amount: U256,
    /// Sibling hashes from leaf to root
    #[serde(with = "hash_list")]
    pub proof: Vec<B256>,
}

/// A full distribution cycle: one root, one claim table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub symbol: String,
    /// Token the distribution pays out
    #[serde(with = "address_text")]
    pub address: Address,
    /// Distribution date stamp (`YYYYMMDD`)
    pub date: String,
    /// `None` until a non-empty claim table has been committed
    #[serde(with = "root_text")]
    pub merkle_root: Option<B256>,
    #[serde(with = "amount_text")]
    pub total: U256,
    /// Ordered by address bytes, which is also index order
    #[serde(with = "claims_map")]
    pub claims: BTreeMap<Address, ClaimEntry>,
}

impl LedgerSnapshot {
    /// The state before any distribution has been committed.
    pub fn genesis(symbol: impl Into<String>, token: Address, date: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            address: token,
            date: date.into(),
            merkle_root: None,
            total: U256::ZERO,
            claims: BTreeMap::new(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claims in index order.
    pub fn claims_by_index(&self) -> Vec<(&Address, &ClaimEntry)> {
        let mut entries: Vec<_> = self.claims.iter().collect();
        entries.sort_by_key(|(_, claim)| claim.index);
        entries
    }

    /// Check the structural invariants of a snapshot.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !is_date_stamp(&self.date) {
            return Err(format!("date {:?} is not a YYYYMMDD stamp", self.date));
        }

        let sum = checked_sum(self.claims.values().map(|c| &c.amount))
            .ok_or_else(|| "claim amounts overflow uint256".to_string())?;
        if sum != self.total {
            return Err(format!("total {} does not match claim sum {}", self.total, sum));
        }

        match (&self.merkle_root, self.claims.is_empty()) {
            (Some(_), true) => return Err("merkle root present without claims".to_string()),
            (None, false) => return Err("claims present without merkle root".to_string()),
            _ => {}
        }

        let n = self.claims.len() as u64;
        let mut seen = vec![false; self.claims.len()];
        for (address, claim) in &self.claims {
            if claim.index >= n {
                return Err(format!(
                    "index {} of {} is outside 0..{}",
                    claim.index, address, n
                ));
            }
            let slot = &mut seen[claim.index as usize];
            if *slot {
                return Err(format!("index {} is assigned twice", claim.index));
            }
            *slot = true;
        }

        Ok(())
    }
}

/// Format a hash the way the ledger stores it.
pub fn hash_hex(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-prefixed 32-byte hex hash.
pub fn parse_hash(text: &str) -> Option<B256> {
    let digits = text.strip_prefix("0x")?;
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes).ok()?;
    Some(B256::from(bytes))
}

mod amount_text {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::parse_amount(&text).map_err(D::Error::custom)
    }
}

mod address_text {
    use alloy_primitives::Address;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crate::checksum(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let text = String::deserialize(deserializer)?;
        crate::parse_address(&text).map_err(D::Error::custom)
    }
}

mod root_text {
    use alloy_primitives::B256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(root: &Option<B256>, serializer: S) -> Result<S::Ok, S::Error> {
        match root {
            Some(hash) => serializer.serialize_str(&super::hash_hex(hash)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<B256>, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Ok(None);
        }
        super::parse_hash(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid merkle root {text:?}")))
    }
}

mod hash_list {
    use alloy_primitives::B256;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hashes: &[B256], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(hashes.len()))?;
        for hash in hashes {
            seq.serialize_element(&super::hash_hex(hash))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<B256>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .iter()
            .map(|t| {
                super::parse_hash(t).ok_or_else(|| D::Error::custom(format!("invalid proof hash {t:?}")))
            })
            .collect()
    }
}

mod claims_map {
    use std::collections::BTreeMap;

    use alloy_primitives::Address;
    use serde::{de::Error, ser::SerializeMap, Deserialize, Deserializer, Serializer};

    use super::ClaimEntry;

    pub fn serialize<S: Serializer>(
        claims: &BTreeMap<Address, ClaimEntry>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(claims.len()))?;
        for (address, claim) in claims {
            map.serialize_entry(&crate::checksum(address), claim)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Address, ClaimEntry>, D::Error> {
        let raw = BTreeMap::<String, ClaimEntry>::deserialize(deserializer)?;
        let mut claims = BTreeMap::new();
        for (text, claim) in raw {
            let address = crate::parse_address(&text).map_err(D::Error::custom)?;
            if claims.insert(address, claim).is_some() {
                return Err(D::Error::custom(format!("duplicate claim for {text}")));
            }
        }
        Ok(claims)
    }
}
