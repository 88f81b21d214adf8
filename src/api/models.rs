use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{ChainDriver, ChainParams, DriverState, RegtestNode};
use crate::encoding::Hash256;
use crate::errors::ChainResult;
use crate::wallet::RecipientKey;

/// Shared application state: the in-process node and the driver feeding it.
///
/// Handlers that need both take `driver` first, then `node`.
pub struct AppState {
    pub node: Mutex<RegtestNode>,
    pub driver: Mutex<ChainDriver>,
}

impl AppState {
    pub fn new(params: ChainParams, recipient: RecipientKey) -> ChainResult<Self> {
        let node = RegtestNode::new(params.clone());
        let driver = ChainDriver::from_oracle(params, recipient, &node)?;
        Ok(Self {
            node: Mutex::new(node),
            driver: Mutex::new(driver),
        })
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct ChainInfoResponse {
    pub network: String,
    pub height: u32,
    pub tip: Hash256,
    pub tip_time: u32,
    pub tip_time_utc: Option<String>,
    pub median_time_past: u32,
    pub next: DriverState,
}

#[derive(Serialize, Deserialize)]
pub struct UtxoResponse {
    pub height: u32,
    pub digest: Hash256,
    pub coins: usize,
    pub total_value: u128,
}

#[derive(Deserialize)]
pub struct SubmitBlockRequest {
    /// Serialized block, hex encoded.
    pub hex: String,
}

#[derive(Serialize, Deserialize)]
pub struct SubmitBlockResponse {
    pub accepted: bool,
    pub reason: Option<String>,
    pub height: u32,
    pub tip: Hash256,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub blocks: u32,
}

#[derive(Serialize, Deserialize)]
pub struct GenerateResponse {
    pub generated: u32,
    pub height: u32,
    pub tip: Hash256,
    pub next: DriverState,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub height: u32,
    pub field: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
