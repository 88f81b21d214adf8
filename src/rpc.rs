use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use crate::blockchain::{ConsensusOracle, SubmitOutcome};
use crate::config::RpcConfig;
use crate::encoding::Hash256;
use crate::errors::{ChainResult, RpcError};

/// Keys under which `gettxoutsetinfo` has reported the serialized-set hash
/// across node releases, newest first.
const HASH_SERIALIZED_KEYS: &[&str] = &["hash_serialized_3", "hash_serialized_2", "hash_serialized"];

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: JsonValue,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A full node reached over JSON-RPC 1.0 with basic auth.
pub struct RpcOracle {
    client: HttpClient,
    url: String,
    user: String,
    password: String,
    next_id: AtomicU64,
}

impl RpcOracle {
    pub fn new(config: &RpcConfig) -> ChainResult<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RpcError::from)?;
        Ok(Self {
            client,
            url: config.url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn call(&self, method: &str, params: JsonValue) -> Result<JsonValue, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("RPC - -> {} #{}", method, id);

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()?;

        // nodes answer RPC errors with a non-2xx status and a JSON body
        let status = response.status();
        let body = response.text()?;
        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RpcError::UnexpectedResponse(format!(
                    "{} returned HTTP {}",
                    method, status
                )));
            }
            Err(e) => return Err(RpcError::UnexpectedResponse(format!("{method}: {e}"))),
        };

        if let Some(err) = parsed.error {
            warn!("RPC - {} failed: {} ({})", method, err.message, err.code);
            return Err(RpcError::Server {
                code: err.code,
                message: err.message,
            });
        }
        Ok(parsed.result)
    }

    fn call_hash(&self, method: &str) -> Result<Hash256, RpcError> {
        let result = self.call(method, json!([]))?;
        parse_hash(method, &result)
    }
}

impl ConsensusOracle for RpcOracle {
    fn submit_block(&mut self, raw_block: &[u8]) -> ChainResult<SubmitOutcome> {
        let result = self.call("submitblock", json!([hex::encode(raw_block)]))?;
        Ok(submit_outcome(result)?)
    }

    fn best_block_hash(&self) -> ChainResult<Hash256> {
        Ok(self.call_hash("getbestblockhash")?)
    }

    fn chain_height(&self) -> ChainResult<u32> {
        let info = self.call("getblockchaininfo", json!([]))?;
        let blocks = info
            .get("blocks")
            .and_then(JsonValue::as_u64)
            .and_then(|b| u32::try_from(b).ok())
            .ok_or_else(|| {
                RpcError::UnexpectedResponse("getblockchaininfo: missing blocks".into())
            })?;
        Ok(blocks)
    }

    fn utxo_set_digest(&self) -> ChainResult<Hash256> {
        let info = self.call("gettxoutsetinfo", json!([]))?;
        Ok(hash_serialized(&info)?)
    }
}

/* ---- Helpers ---- */

/// `submitblock` yields `null` on acceptance and a reason string otherwise.
fn submit_outcome(result: JsonValue) -> Result<SubmitOutcome, RpcError> {
    match result {
        JsonValue::Null => Ok(SubmitOutcome::Accepted),
        JsonValue::String(reason) => Ok(SubmitOutcome::Rejected(reason)),
        other => Err(RpcError::UnexpectedResponse(format!(
            "submitblock: {other}"
        ))),
    }
}

fn hash_serialized(info: &JsonValue) -> Result<Hash256, RpcError> {
    HASH_SERIALIZED_KEYS
        .iter()
        .find_map(|key| info.get(*key))
        .ok_or_else(|| {
            RpcError::UnexpectedResponse("gettxoutsetinfo: no serialized hash".into())
        })
        .and_then(|v| parse_hash("gettxoutsetinfo", v))
}

fn parse_hash(method: &str, value: &JsonValue) -> Result<Hash256, RpcError> {
    value
        .as_str()
        .and_then(|s| Hash256::from_hex(s).ok())
        .ok_or_else(|| RpcError::UnexpectedResponse(format!("{method}: expected a hash, got {value}")))
}
