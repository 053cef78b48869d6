//! Supported networks and deployed contract addresses
//!
//! The network table is built once at startup and never mutated afterwards.
//! RPC endpoints are the only per-deployment input and are attached while the
//! registry is being built.
//!
//! # Environment Variable Schema
//!
//! ```text
//! ETHEREUM_RPC_URL=https://...   # optional, one per network key
//! BSC_RPC_URL=https://...
//! POLYGON_RPC_URL=https://...
//! ```

use alloy::primitives::{address, Address};
use eyre::{eyre, Result};
use std::collections::{BTreeMap, HashMap};

use crate::error::SwapError;

/// Fee manager contract (deployed on Polygon)
pub const FEE_MANAGER_ADDRESS: Address = address!("B1e7A13eccacDF92C9267a4917bc66103bB4D6D6");

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL uses http/https and has a host component.
pub fn validate_rpc_url(url_str: &str, name: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url_str).map_err(|e| eyre!("{} must be a valid URL: {}", name, e))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(eyre!(
            "{} must use http:// or https:// scheme, got {}",
            name,
            scheme
        ));
    }

    if parsed.host_str().is_none() {
        return Err(eyre!("{} must have a host component", name));
    }

    if scheme == "http" {
        tracing::warn!(
            "{} uses unencrypted http://, use https:// in production",
            name
        );
    }

    Ok(())
}

// ============================================================================
// Network
// ============================================================================

/// A chain with a deployed token pool
#[derive(Debug, Clone)]
pub struct Network {
    /// Lookup key (e.g., "ethereum", "bsc")
    pub key: String,
    /// Display name
    pub name: String,
    /// Native EVM chain ID (e.g., 1, 56, 137)
    pub chain_id: u64,
    /// Messaging-layer chain ID used as the transfer destination
    pub messaging_chain_id: u16,
    /// TokenPool contract on this chain
    pub pool_address: Address,
    /// Token symbol → token contract
    pub tokens: BTreeMap<String, Address>,
    /// RPC endpoint, if this deployment talks to the chain
    pub rpc_url: Option<String>,
}

impl Network {
    pub fn new(
        key: &str,
        name: &str,
        chain_id: u64,
        messaging_chain_id: u16,
        pool_address: Address,
        tokens: &[(&str, Address)],
    ) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            chain_id,
            messaging_chain_id,
            pool_address,
            tokens: tokens
                .iter()
                .map(|(symbol, addr)| (symbol.to_string(), *addr))
                .collect(),
            rpc_url: None,
        }
    }

    /// Resolve a token symbol to its contract on this network
    pub fn token(&self, symbol: &str) -> Result<Address, SwapError> {
        self.tokens
            .get(&symbol.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| SwapError::UnsupportedToken {
                symbol: symbol.to_string(),
                network: self.key.clone(),
            })
    }

    /// Environment variable carrying this network's RPC URL
    pub fn rpc_env_var(&self) -> String {
        format!("{}_RPC_URL", self.key.to_ascii_uppercase())
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(eyre!("Network key is empty"));
        }
        if self.chain_id == 0 {
            return Err(eyre!("Chain ID is 0 for network {}", self.key));
        }
        if self.messaging_chain_id == 0 {
            return Err(eyre!("Messaging chain ID is 0 for network {}", self.key));
        }
        if self.pool_address == Address::ZERO {
            return Err(eyre!("Pool address is zero for network {}", self.key));
        }
        if self.tokens.is_empty() {
            return Err(eyre!("Network {} has no tokens", self.key));
        }
        if let Some(url) = &self.rpc_url {
            validate_rpc_url(url, &self.rpc_env_var())?;
        }
        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable table of supported networks
///
/// Lookup by key, native chain ID, or messaging chain ID.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<Network>,
    key_map: HashMap<String, usize>,
    chain_id_map: HashMap<u64, usize>,
    messaging_id_map: HashMap<u16, usize>,
    fee_manager: Address,
}

impl NetworkRegistry {
    /// The production deployment: Ethereum, BSC and Polygon pools
    pub fn mainnet() -> Self {
        let networks = vec![
            Network::new(
                "ethereum",
                "Ethereum",
                1,
                101,
                address!("Ee3aA54b931c5Fc0F986D3E7380809f16762A4a9"),
                &[
                    ("USDC", address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
                    ("USDT", address!("dAC17F958D2ee523a2206206994597C13D831ec7")),
                ],
            ),
            Network::new(
                "bsc",
                "BSC",
                56,
                102,
                address!("629c475137D201B9b3500900a3ADf8268697442B"),
                &[("USDC", address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"))],
            ),
            Network::new(
                "polygon",
                "Polygon",
                137,
                109,
                address!("94Ef82A7e76D07249af7314122F54a0568D7c11c"),
                &[("USDC", address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"))],
            ),
        ];

        Self::index(networks, FEE_MANAGER_ADDRESS)
    }

    fn index(networks: Vec<Network>, fee_manager: Address) -> Self {
        let mut key_map = HashMap::new();
        let mut chain_id_map = HashMap::new();
        let mut messaging_id_map = HashMap::new();

        for (idx, network) in networks.iter().enumerate() {
            key_map.insert(network.key.clone(), idx);
            chain_id_map.insert(network.chain_id, idx);
            messaging_id_map.insert(network.messaging_chain_id, idx);
        }

        Self {
            networks,
            key_map,
            chain_id_map,
            messaging_id_map,
            fee_manager,
        }
    }

    /// Attach RPC endpoints by network key and re-validate
    pub fn with_rpc_urls(mut self, rpc_urls: &HashMap<String, String>) -> Result<Self> {
        for (key, url) in rpc_urls {
            let idx = *self
                .key_map
                .get(key)
                .ok_or_else(|| eyre!("RPC URL given for unknown network: {}", key))?;
            let network = &mut self.networks[idx];
            network.rpc_url = Some(url.clone());
            network.validate()?;
        }
        Ok(self)
    }

    /// Read `<KEY>_RPC_URL` for every network in the registry
    pub fn rpc_urls_from_env(&self) -> HashMap<String, String> {
        self.networks
            .iter()
            .filter_map(|n| {
                std::env::var(n.rpc_env_var())
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (n.key.clone(), v.trim().to_string()))
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Network> {
        self.key_map.get(key).map(|&idx| &self.networks[idx])
    }

    /// Like [`get`](Self::get) but with a swap error for unknown keys
    pub fn require(&self, key: &str) -> Result<&Network, SwapError> {
        self.get(key).ok_or_else(|| SwapError::UnknownNetwork {
            key: key.to_string(),
        })
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Option<&Network> {
        self.chain_id_map.get(&chain_id).map(|&idx| &self.networks[idx])
    }

    pub fn by_messaging_chain_id(&self, id: u16) -> Option<&Network> {
        self.messaging_id_map.get(&id).map(|&idx| &self.networks[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter()
    }

    pub fn fee_manager(&self) -> Address {
        self.fee_manager
    }
}
