use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::core::domain::{ChainRole, Direction};
use crate::core::errors::BridgeError;
use crate::core::validation::{validate_ethereum_address, AddressFormat};

/// Per-network bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Display name (e.g. "Ethereum Mainnet").
    pub name: String,
    /// Chain id the wallet must be on before submitting.
    pub chain_id: u64,
    /// Chain name offered when asking the wallet to switch.
    pub chain_name: String,
    /// Bridge contract; the spender checked by allowance queries.
    pub bridge_contract: String,
    /// Symbol of the native chain's coin, used in the recipient label for `Out`.
    pub native_symbol: String,
    /// Informative bridge fee in basis points.
    #[serde(default)]
    pub fee_bps: u32,
}

/// Bridge orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "BridgeConfig::default_networks")]
    pub networks: HashMap<String, NetworkConfig>,

    /// Network selected on mount.
    #[serde(default = "BridgeConfig::default_network")]
    pub default_network: String,

    /// Symbol used in the recipient label for `In`.
    #[serde(default = "BridgeConfig::default_counterpart_symbol")]
    pub counterpart_symbol: String,

    /// Accepted human-readable prefixes for counterpart-chain addresses.
    #[serde(default = "BridgeConfig::default_counterpart_prefixes")]
    pub counterpart_address_prefixes: Vec<String>,

    /// Direction in which the spent token needs an allowance before transfer.
    #[serde(default = "BridgeConfig::default_approval_direction")]
    pub approval_direction: Direction,

    /// Block submission until a wallet is connected.
    #[serde(default = "BridgeConfig::default_require_connected_wallet")]
    pub require_connected_wallet: bool,
}

impl BridgeConfig {
    fn default_network() -> String {
        "Ethereum".to_string()
    }
    fn default_counterpart_symbol() -> String {
        "CKB".to_string()
    }
    fn default_counterpart_prefixes() -> Vec<String> {
        vec!["ckb".to_string(), "ckt".to_string()]
    }
    fn default_approval_direction() -> Direction {
        Direction::In
    }
    fn default_require_connected_wallet() -> bool {
        true
    }

    fn default_networks() -> HashMap<String, NetworkConfig> {
        let mut networks = HashMap::with_capacity(2);

        networks.insert(
            "Ethereum".to_string(),
            NetworkConfig {
                name: "Ethereum Mainnet".to_string(),
                chain_id: 1,
                chain_name: "Ethereum Mainnet".to_string(),
                bridge_contract: "0x0000000000000000000000000000000000000001".to_string(),
                native_symbol: "ETH".to_string(),
                fee_bps: 0,
            },
        );

        networks.insert(
            "BSC".to_string(),
            NetworkConfig {
                name: "BNB Smart Chain".to_string(),
                chain_id: 56,
                chain_name: "BSC Mainnet".to_string(),
                bridge_contract: "0x0000000000000000000000000000000000000002".to_string(),
                native_symbol: "BNB".to_string(),
                fee_bps: 0,
            },
        );

        networks
    }

    /// Parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        info!("Loaded bridge config from {} ({} networks)", path.display(), config.networks.len());
        Ok(config)
    }

    /// Build from `BRIDGE_CONFIG_PATH` (defaults when unset or missing) and apply
    /// env overrides.
    pub fn from_env() -> Result<Self, BridgeError> {
        let mut config = match std::env::var("BRIDGE_CONFIG_PATH") {
            Ok(path) if Path::new(&path).exists() => Self::load(&path)?,
            Ok(path) => {
                warn!("BRIDGE_CONFIG_PATH={} does not exist. Using default configuration", path);
                Self::default()
            }
            Err(_) => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// `BRIDGE_REQUIRE_WALLET`, `BRIDGE_<NETWORK>_CHAIN_ID`, `BRIDGE_<NETWORK>_CHAIN_NAME`.
    pub fn apply_env_overrides(&mut self) -> Result<(), BridgeError> {
        if let Ok(val) = std::env::var("BRIDGE_REQUIRE_WALLET") {
            self.require_connected_wallet = parse_bool_env("BRIDGE_REQUIRE_WALLET", &val)?;
        }

        for (key, network) in self.networks.iter_mut() {
            let env_key = key.to_ascii_uppercase().replace('-', "_");

            if let Ok(val) = std::env::var(format!("BRIDGE_{}_CHAIN_ID", env_key)) {
                network.chain_id = val.trim().parse().map_err(|_| {
                    BridgeError::Config(format!("BRIDGE_{}_CHAIN_ID is not a number: {}", env_key, val))
                })?;
            }
            if let Ok(val) = std::env::var(format!("BRIDGE_{}_CHAIN_NAME", env_key)) {
                network.chain_name = val;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.networks.is_empty() {
            return Err(BridgeError::Config("no networks configured".to_string()));
        }
        if !self.networks.contains_key(&self.default_network) {
            return Err(BridgeError::Config(format!(
                "default network '{}' is not configured",
                self.default_network
            )));
        }
        if self.counterpart_address_prefixes.is_empty() {
            return Err(BridgeError::Config("no counterpart address prefixes configured".to_string()));
        }
        for (key, network) in &self.networks {
            if network.chain_id == 0 {
                return Err(BridgeError::Config(format!("network '{}' has chain_id 0", key)));
            }
            validate_ethereum_address(&network.bridge_contract).map_err(|e| {
                BridgeError::Config(format!("network '{}' bridge contract: {}", key, e))
            })?;
            if network.fee_bps > 10_000 {
                return Err(BridgeError::Config(format!("network '{}' fee_bps exceeds 10000", key)));
            }
        }
        Ok(())
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, BridgeError> {
        self.networks
            .get(name)
            .ok_or_else(|| BridgeError::UnsupportedNetwork(name.to_string()))
    }

    /// Sorted network keys.
    pub fn supported_networks(&self) -> Vec<String> {
        let mut names: Vec<String> = self.networks.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn address_format(&self, role: ChainRole) -> AddressFormat {
        match role {
            ChainRole::Native => AddressFormat::Evm,
            ChainRole::Counterpart => {
                AddressFormat::Ckb { prefixes: self.counterpart_address_prefixes.clone() }
            }
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            networks: Self::default_networks(),
            default_network: Self::default_network(),
            counterpart_symbol: Self::default_counterpart_symbol(),
            counterpart_address_prefixes: Self::default_counterpart_prefixes(),
            approval_direction: Self::default_approval_direction(),
            require_connected_wallet: Self::default_require_connected_wallet(),
        }
    }
}

fn parse_bool_env(key: &str, val: &str) -> Result<bool, BridgeError> {
    let v = val.trim();
    if v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on") {
        Ok(true)
    } else if v == "0" || v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") || v.eq_ignore_ascii_case("off") {
        Ok(false)
    } else {
        Err(BridgeError::Config(format!("{} must be a boolean, got '{}'", key, val)))
    }
}
