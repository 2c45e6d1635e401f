//! Runtime configuration
//!
//! Read once from the environment at startup. The `NEXT_PUBLIC_*` names used
//! by the web front-end are accepted as aliases so one `.env` file can serve
//! both.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::aptos::{ClientConfig, LocalAccount};
use crate::validation::normalize_address;

pub const DEFAULT_MODULE_ADDRESS: &str =
    "0x2267d403073795ada7cb1da76029e92c2b0b693ecfbdc31e1ea65c57584d33bd";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown network {0:?} (expected devnet, testnet or mainnet)")]
    InvalidNetwork(String),

    #[error("invalid module address {0:?}")]
    InvalidModuleAddress(String),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddr(String),

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("RELAYER_PRIVATE_KEY is invalid: {0}")]
    InvalidRelayerKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Public fullnode REST base
    pub fn node_url(&self) -> &'static str {
        match self {
            Network::Devnet => "https://api.devnet.aptoslabs.com/v1",
            Network::Testnet => "https://api.testnet.aptoslabs.com/v1",
            Network::Mainnet => "https://api.mainnet.aptoslabs.com/v1",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(ConfigError::InvalidNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Config {
    pub module_address: String,
    pub network: Network,
    pub node_url: String,
    /// Server-only signing key; `None` disables relayed withdrawals
    pub relayer_private_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub confirmation_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        let raw_module = get(&["MODULE_ADDRESS", "NEXT_PUBLIC_MODULE_ADDRESS"])
            .unwrap_or_else(|| DEFAULT_MODULE_ADDRESS.to_string());
        let module_address = normalize_address(&raw_module)
            .ok_or(ConfigError::InvalidModuleAddress(raw_module))?;

        let network = match get(&["APTOS_NETWORK", "NEXT_PUBLIC_APTOS_NETWORK"]) {
            Some(v) => v.parse()?,
            None => Network::Devnet,
        };

        let node_url = get(&["APTOS_NODE_URL"]).unwrap_or_else(|| network.node_url().to_string());

        let bind_raw = get(&["BIND_ADDR"]).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let request_timeout =
            Duration::from_secs(positive(get(&["REQUEST_TIMEOUT"]), "REQUEST_TIMEOUT", 30)?);
        let confirmation_attempts =
            positive(get(&["CONFIRMATION_ATTEMPTS"]), "CONFIRMATION_ATTEMPTS", 30)? as u32;

        Ok(Self {
            module_address,
            network,
            node_url,
            relayer_private_key: get(&["RELAYER_PRIVATE_KEY"]),
            bind_addr,
            request_timeout,
            confirmation_attempts,
        })
    }

    /// Fullnode client tuning derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: self.request_timeout,
            confirmation_attempts: self.confirmation_attempts,
            ..ClientConfig::default()
        }
    }

    /// Parse the relayer key. A missing key is not an error, only a warning:
    /// direct withdrawals keep working without a relayer.
    pub fn relayer_account(&self) -> Result<Option<LocalAccount>, ConfigError> {
        match &self.relayer_private_key {
            Some(key) => LocalAccount::from_private_key_hex(key)
                .map(Some)
                .map_err(|e| ConfigError::InvalidRelayerKey(e.to_string())),
            None => {
                log::warn!("RELAYER_PRIVATE_KEY not configured - relayer functionality will be disabled");
                Ok(None)
            }
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("module_address", &self.module_address)
            .field("network", &self.network)
            .field("node_url", &self.node_url)
            .field("relayer_configured", &self.relayer_private_key.is_some())
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("confirmation_attempts", &self.confirmation_attempts)
            .finish()
    }
}

fn positive(value: Option<String>, var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 && n <= u32::MAX as u64 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value: v }),
        },
    }
}
