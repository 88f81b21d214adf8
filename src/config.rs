use std::env;

use crate::errors::{ChainError, ChainResult};
use crate::wallet::RecipientKey;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Settings for the HTTP server and its in-process node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub recipient: RecipientKey,
    /// Overrides the network's first virtual block time.
    pub initial_mock_time: Option<u32>,
}

impl NodeConfig {
    /// Read `HOST`, `PORT`, `COINBASE_SECRET` and `INITIAL_MOCKTIME`.
    pub fn from_env() -> ChainResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ChainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("PORT") {
            Some(v) => parse_var("PORT", &v)?,
            None => DEFAULT_PORT,
        };
        let recipient = match lookup("COINBASE_SECRET") {
            Some(secret) => RecipientKey::from_secret_hex(secret.trim())
                .map_err(|e| ChainError::Config(format!("COINBASE_SECRET: {e}")))?,
            None => RecipientKey::deterministic()?,
        };
        let initial_mock_time = lookup("INITIAL_MOCKTIME")
            .map(|v| parse_var("INITIAL_MOCKTIME", &v))
            .transpose()?;

        Ok(Self {
            host,
            port,
            recipient,
            initial_mock_time,
        })
    }
}

/// Credentials for a node reached over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl RpcConfig {
    /// `None` when `RPC_URL` is unset.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("RPC_URL").filter(|u| !u.trim().is_empty())?;
        Some(Self {
            url,
            user: lookup("RPC_USER").unwrap_or_default(),
            password: lookup("RPC_PASSWORD").unwrap_or_default(),
            timeout_secs: lookup("RPC_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> ChainResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChainError::Config(format!("{key}: cannot parse {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = NodeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.recipient, RecipientKey::deterministic().unwrap());
        assert_eq!(cfg.initial_mock_time, None);
    }

    #[test]
    fn reads_overrides() {
        let env = vars(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            (
                "COINBASE_SECRET",
                "0000000000000000000000000000000000000000000000000000000000000002",
            ),
            ("INITIAL_MOCKTIME", "1700000000"),
        ]);
        let cfg = NodeConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9000);
        assert_eq!(
            cfg.recipient.to_hex(),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
        assert_eq!(cfg.initial_mock_time, Some(1_700_000_000));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let env = vars(&[("PORT", "eighty")]);
        assert!(matches!(
            NodeConfig::from_lookup(|k| env.get(k).cloned()),
            Err(ChainError::Config(_))
        ));
        let env = vars(&[("COINBASE_SECRET", "00")]);
        assert!(matches!(
            NodeConfig::from_lookup(|k| env.get(k).cloned()),
            Err(ChainError::Config(_))
        ));
    }

    #[test]
    fn rpc_requires_url() {
        assert!(RpcConfig::from_lookup(|_| None).is_none());
        let env = vars(&[("RPC_URL", "http://127.0.0.1:18443"), ("RPC_USER", "u")]);
        let cfg = RpcConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.user, "u");
        assert_eq!(cfg.password, "");
        assert_eq!(cfg.timeout_secs, DEFAULT_RPC_TIMEOUT_SECS);
    }
}
