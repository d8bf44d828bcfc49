use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date stamp: {0}")]
    InvalidDate(String),

    #[error("Amount overflow: reward for {0} exceeds uint256")]
    AmountOverflow(String),

    #[error("Distribution active: stash root for {token} is {root}, pause it before regenerating")]
    DistributionActive { token: String, root: String },

    #[error("Corrupt ledger {}: {reason}", .path.display())]
    CorruptLedger { path: PathBuf, reason: String },

    #[error("Archive collision: {} already exists", .0.display())]
    ArchiveCollision(PathBuf),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Ledger IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StashError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptLedger {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
