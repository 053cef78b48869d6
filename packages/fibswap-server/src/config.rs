//! Server configuration
//!
//! Read from the environment (after `.env` has been loaded in `main`).
//!
//! | Variable | Default |
//! |---|---|
//! | `BIND_ADDRESS` | `0.0.0.0` |
//! | `API_PORT` | `8080` |
//! | `WALLET_NETWORK` | `ethereum` |
//! | `WALLET_PRIVATE_KEY` | unset: no wallet connected |
//! | `<NETWORK>_RPC_URL` | unset |
//! | `CONFIRMATION_TIMEOUT_SECS` | `300` |
//! | `LOG_FORMAT` | `text` (`json` for structured output) |

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use eyre::{eyre, Result};
use fibswap_core::redact::Redacted;
use fibswap_core::NetworkRegistry;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub api_port: u16,

    /// Network the wallet (or read-only provider) is connected to
    pub wallet_network: String,
    /// Signing key; `None` runs the server with no wallet connected
    pub wallet_private_key: Option<Redacted<String>>,

    /// RPC endpoints by network key
    pub rpc_urls: HashMap<String, String>,

    pub confirmation_timeout_secs: u64,
}

impl Config {
    /// Load and validate configuration for the given network table
    pub fn load(registry: &NetworkRegistry) -> Result<Self> {
        let config = Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .ok()
                .map(|v| v.parse().map_err(|_| eyre!("Invalid API_PORT: {}", v)))
                .transpose()?
                .unwrap_or(8080),

            wallet_network: env::var("WALLET_NETWORK")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|_| "ethereum".to_string()),
            wallet_private_key: env::var("WALLET_PRIVATE_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(Redacted),

            rpc_urls: registry.rpc_urls_from_env(),

            confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                .ok()
                .map(|v| {
                    v.parse()
                        .map_err(|_| eyre!("Invalid CONFIRMATION_TIMEOUT_SECS: {}", v))
                })
                .transpose()?
                .unwrap_or(300),
        };

        config.validate(registry)?;
        Ok(config)
    }

    pub fn validate(&self, registry: &NetworkRegistry) -> Result<()> {
        if registry.get(&self.wallet_network).is_none() {
            let known: Vec<&str> = registry.iter().map(|n| n.key.as_str()).collect();
            return Err(eyre!(
                "WALLET_NETWORK '{}' is not one of: {}",
                self.wallet_network,
                known.join(", ")
            ));
        }

        if self.confirmation_timeout_secs == 0 {
            return Err(eyre!("CONFIRMATION_TIMEOUT_SECS must be greater than zero"));
        }

        if self.wallet_private_key.is_some() && !self.rpc_urls.contains_key(&self.wallet_network) {
            return Err(eyre!(
                "WALLET_PRIVATE_KEY is set but {}_RPC_URL is missing",
                self.wallet_network.to_uppercase()
            ));
        }

        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

/// Whether `LOG_FORMAT=json` was requested
pub fn json_logging() -> bool {
    env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 8] = [
        "BIND_ADDRESS",
        "API_PORT",
        "WALLET_NETWORK",
        "WALLET_PRIVATE_KEY",
        "CONFIRMATION_TIMEOUT_SECS",
        "ETHEREUM_RPC_URL",
        "BSC_RPC_URL",
        "POLYGON_RPC_URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::load(&NetworkRegistry::mainnet()).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.wallet_network, "ethereum");
        assert!(config.wallet_private_key.is_none());
        assert!(config.rpc_urls.is_empty());
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(300));
    }

    #[test]
    #[serial]
    fn test_reads_overrides_and_redacts_key() {
        clear_env();
        env::set_var("API_PORT", "9100");
        env::set_var("WALLET_NETWORK", "Polygon");
        env::set_var("POLYGON_RPC_URL", "https://polygon-rpc.com");
        env::set_var("WALLET_PRIVATE_KEY", "0xdeadbeef");
        env::set_var("CONFIRMATION_TIMEOUT_SECS", "60");

        let config = Config::load(&NetworkRegistry::mainnet()).unwrap();
        clear_env();

        assert_eq!(config.api_port, 9100);
        assert_eq!(config.wallet_network, "polygon");
        assert_eq!(
            config.rpc_urls.get("polygon").map(String::as_str),
            Some("https://polygon-rpc.com")
        );
        assert_eq!(config.confirmation_timeout_secs, 60);
        assert!(!format!("{:?}", config).contains("deadbeef"));
    }

    #[test]
    #[serial]
    fn test_rejects_bad_values() {
        clear_env();
        env::set_var("API_PORT", "not-a-port");
        assert!(Config::load(&NetworkRegistry::mainnet()).is_err());

        clear_env();
        env::set_var("WALLET_NETWORK", "avalanche");
        let err = Config::load(&NetworkRegistry::mainnet()).unwrap_err();
        assert!(err.to_string().contains("avalanche"));

        clear_env();
        env::set_var("WALLET_PRIVATE_KEY", "0xdeadbeef");
        let err = Config::load(&NetworkRegistry::mainnet()).unwrap_err();
        assert!(err.to_string().contains("ETHEREUM_RPC_URL"));

        clear_env();
    }
}
