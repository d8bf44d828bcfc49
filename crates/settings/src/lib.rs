//! StashCraft Settings
//!
//! Configuration for the regeneration tool.
//!
//! ## Features
//!
//! - Oracle settings (mode, JSON-RPC endpoint, stash contract, block tag)
//! - Ledger root directory
//! - JSON serialization with per-field defaults
//!
//! ## Usage
//!
//! ```no_run
//! use stashcraft_settings::{default_settings_path, Settings};
//!
//! // Defaults apply to every field the file leaves out
//! let settings = Settings::load_from(&default_settings_path())?;
//! let stash = settings.oracle.stash_config()?;
//! # Ok::<(), stashcraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{LedgerSettings, OracleSettings, Settings, SettingsOracleMode};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Invalid stash address: {0}")]
    InvalidStashAddress(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("stashcraft.json")
}
