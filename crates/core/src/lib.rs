//! StashCraft Core Types
//!
//! Addresses, amounts and the ledger snapshot shared by every StashCraft crate.

mod address;
mod amount;
mod date;
mod error;
mod types;

pub use address::*;
pub use amount::*;
pub use date::*;
pub use error::*;
pub use types::*;

pub use alloy_primitives::{Address, B256, U256};
