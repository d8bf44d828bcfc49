//! Configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use stashcraft_core::{checksum, parse_address};
use stashcraft_settlement::{OracleMode, StashConfig, DEFAULT_STASH_ADDRESS};

use crate::{Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Claim-status oracle settings
    #[serde(default)]
    pub oracle: OracleSettings,

    /// Ledger storage settings
    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl Settings {
    /// Load settings from `path`, or defaults if there is no file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}

/// Oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleSettings {
    /// Where claim status is read from
    #[serde(default)]
    pub mode: SettingsOracleMode,

    /// JSON-RPC endpoint
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Stash contract address
    #[serde(default = "default_stash_address")]
    pub stash_address: String,

    /// Block tag or number used for reads
    #[serde(default = "default_block")]
    pub block: String,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_stash_address() -> String {
    checksum(&DEFAULT_STASH_ADDRESS)
}

fn default_block() -> String {
    "latest".to_string()
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            mode: SettingsOracleMode::default(),
            rpc_url: default_rpc_url(),
            stash_address: default_stash_address(),
            block: default_block(),
        }
    }
}

impl OracleSettings {
    /// Build the stash client configuration
    pub fn stash_config(&self) -> Result<StashConfig> {
        let stash_address = parse_address(&self.stash_address)
            .map_err(|_| SettingsError::InvalidStashAddress(self.stash_address.clone()))?;
        Ok(StashConfig {
            mode: self.mode.into(),
            rpc_url: self.rpc_url.clone(),
            stash_address,
            block: self.block.clone(),
        })
    }
}

/// Oracle mode as written in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettingsOracleMode {
    /// Read from a node
    #[default]
    Live,
    /// In-memory, everything paused and unclaimed
    Mock,
}

impl From<SettingsOracleMode> for OracleMode {
    fn from(mode: SettingsOracleMode) -> Self {
        match mode {
            SettingsOracleMode::Live => OracleMode::Live,
            SettingsOracleMode::Mock => OracleMode::Mock,
        }
    }
}

/// Ledger storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Directory holding one sub-directory per symbol
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("merkles")
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}
