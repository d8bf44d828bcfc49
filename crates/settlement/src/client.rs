//! Stash client for reading claim state
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without a node. Roots, update
//!   counters and storage words are tracked in-memory and set by the caller.
//! - **Live Mode**: `eth_call` / `eth_getStorageAt` against a JSON-RPC endpoint.
//!
//! Both modes address bitmap words through [`claimed_word_slot`], so a mock
//! populated with [`StashClient::mark_claimed`] exercises the same slot
//! derivation a live read does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use alloy_primitives::{address, keccak256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stashcraft_core::{checksum, hash_hex, Address, Result, StashError, B256, U256};

use crate::oracle::ClaimStatusOracle;
use crate::slot::{address_word, claimed_word_slot};

/// Mainnet MultiMerkleStash deployment.
pub const DEFAULT_STASH_ADDRESS: Address = address!("aBC6A4e345801Cb5f57629E79Cd5Eb2e9e514e98");

/// Oracle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleMode {
    /// In-memory state, nothing leaves the process
    Mock,
    /// JSON-RPC against a live node
    Live,
}

/// Stash client configuration
#[derive(Debug, Clone)]
pub struct StashConfig {
    /// Oracle mode (Mock or Live)
    pub mode: OracleMode,
    /// JSON-RPC endpoint (only used in Live mode)
    pub rpc_url: String,
    /// Stash contract holding roots and claimed bitmaps
    pub stash_address: Address,
    /// Block tag or number for every read
    pub block: String,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            mode: OracleMode::Mock,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            stash_address: DEFAULT_STASH_ADDRESS,
            block: "latest".to_string(),
        }
    }
}

impl StashConfig {
    /// Create a mock configuration for development
    pub fn mock() -> Self {
        Self {
            mode: OracleMode::Mock,
            ..Default::default()
        }
    }

    /// Create a live configuration against `rpc_url`
    pub fn live(rpc_url: impl Into<String>, stash_address: Address) -> Self {
        Self {
            mode: OracleMode::Live,
            rpc_url: rpc_url.into(),
            stash_address,
            ..Default::default()
        }
    }
}

/// In-memory state for mock mode
#[derive(Debug, Default)]
struct MockState {
    roots: HashMap<Address, B256>,
    updates: HashMap<Address, U256>,
    /// Raw storage keyed by slot
    storage: HashMap<B256, U256>,
    /// Number of oracle calls served
    calls: u64,
}

/// Contract view functions, as `keccak256(signature)[..4]` inputs.
mod selector {
    pub const MERKLE_ROOT: &str = "merkleRoot(address)";
    pub const UPDATE: &str = "update(address)";
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Claim-status client for one stash contract
///
/// In mock mode every read is served from in-memory state.
pub struct StashClient {
    config: StashConfig,
    /// HTTP client (only used in Live mode)
    http: Option<reqwest::Client>,
    /// Mock state (only used in Mock mode)
    mock_state: Arc<RwLock<MockState>>,
    next_id: AtomicU64,
}

impl StashClient {
    pub fn new(config: StashConfig) -> Self {
        let http = match config.mode {
            OracleMode::Live => Some(reqwest::Client::new()),
            OracleMode::Mock => None,
        };
        Self {
            config,
            http,
            mock_state: Arc::new(RwLock::new(MockState::default())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Shorthand for a mock client
    pub fn mock() -> Self {
        Self::new(StashConfig::mock())
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == OracleMode::Mock
    }

    pub fn config(&self) -> &StashConfig {
        &self.config
    }

    // =========================================================================
    // Mock state
    // =========================================================================

    /// Set the live root for `token` (mock only).
    pub fn set_root(&self, token: Address, root: B256) {
        let mut state = self.mock_state.write().expect("stash lock poisoned");
        state.roots.insert(token, root);
    }

    /// Set the update counter for `token` (mock only).
    pub fn set_update_counter(&self, token: Address, update: U256) {
        let mut state = self.mock_state.write().expect("stash lock poisoned");
        state.updates.insert(token, update);
    }

    /// Overwrite a whole bitmap word (mock only).
    pub fn set_word(&self, token: Address, update: U256, word_index: u64, word: U256) {
        let slot = claimed_word_slot(&token, update, word_index);
        let mut state = self.mock_state.write().expect("stash lock poisoned");
        state.storage.insert(slot, word);
    }

    /// Set the claimed bit of `index` in cycle `update` (mock only).
    pub fn mark_claimed(&self, token: Address, update: U256, index: u64) {
        let slot = claimed_word_slot(&token, update, index / 256);
        let bit = U256::from(1u64) << (index % 256) as usize;
        let mut state = self.mock_state.write().expect("stash lock poisoned");
        let word = state.storage.entry(slot).or_default();
        *word |= bit;
    }

    /// Number of oracle calls served so far (mock only).
    pub fn mock_calls(&self) -> u64 {
        self.mock_state.read().expect("stash lock poisoned").calls
    }

    fn mock_read<T>(&self, read: impl FnOnce(&MockState) -> T) -> T {
        let mut state = self.mock_state.write().expect("stash lock poisoned");
        state.calls += 1;
        read(&state)
    }

    // =========================================================================
    // Live JSON-RPC
    // =========================================================================

    async fn rpc(&self, method: &str, params: serde_json::Value) -> Result<String> {
        let http = self
            .http
            .as_ref()
            .ok_or_else(|| StashError::Oracle("HTTP client not initialized".to_string()))?;

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: JsonRpcResponse = http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StashError::Oracle(format!("{}: {}", method, e)))?
            .json()
            .await
            .map_err(|e| StashError::Oracle(format!("{}: invalid response: {}", method, e)))?;

        if let Some(err) = response.error {
            return Err(StashError::Oracle(format!(
                "{}: {} (code {})",
                method, err.message, err.code
            )));
        }
        response
            .result
            .ok_or_else(|| StashError::Oracle(format!("{}: empty result", method)))
    }

    /// Call a `view(address) returns (word)` function on the stash.
    async fn call_view(&self, signature: &str, token: &Address) -> Result<U256> {
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&keccak256(signature.as_bytes())[..4]);
        data.extend_from_slice(&address_word(token));

        let params = serde_json::json!([
            {
                "to": checksum(&self.config.stash_address),
                "data": format!("0x{}", hex::encode(&data)),
            },
            self.config.block,
        ]);
        let result = self.rpc("eth_call", params).await?;
        parse_word(&result)
    }
}

/// Decode the first 32-byte word of a hex quantity or return blob.
///
/// Nodes differ on whether storage values are zero-padded (`0x00..05`) or
/// compact (`0x5`); both decode to the same word.
fn parse_word(text: &str) -> Result<U256> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let word = digits
        .get(..digits.len().min(64))
        .ok_or_else(|| StashError::Oracle(format!("invalid word {:?}", text)))?;
    if word.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(word, 16)
        .map_err(|_| StashError::Oracle(format!("invalid word {:?}", text)))
}

impl ClaimStatusOracle for StashClient {
    async fn current_root(&self, token: &Address) -> Result<B256> {
        if self.is_mock() {
            return Ok(self.mock_read(|s| s.roots.get(token).copied().unwrap_or_default()));
        }
        let word = self.call_view(selector::MERKLE_ROOT, token).await?;
        Ok(B256::from(word.to_be_bytes::<32>()))
    }

    async fn update_counter(&self, token: &Address) -> Result<U256> {
        if self.is_mock() {
            return Ok(self.mock_read(|s| s.updates.get(token).copied().unwrap_or_default()));
        }
        self.call_view(selector::UPDATE, token).await
    }

    async fn read_word(&self, token: &Address, update: U256, word_index: u64) -> Result<U256> {
        let slot = claimed_word_slot(token, update, word_index);
        debug!(
            "Reading bitmap word {} of update {} for {} at slot {}",
            word_index,
            update,
            checksum(token),
            hash_hex(&slot),
        );

        if self.is_mock() {
            return Ok(self.mock_read(|s| s.storage.get(&slot).copied().unwrap_or_default()));
        }

        let params = serde_json::json!([
            checksum(&self.config.stash_address),
            hash_hex(&slot),
            self.config.block,
        ]);
        let result = self.rpc("eth_getStorageAt", params).await?;
        parse_word(&result)
    }
}
