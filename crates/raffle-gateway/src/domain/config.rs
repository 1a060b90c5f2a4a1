//! Gateway configuration with validation.
//!
//! Defaults are overridden by `RAFFLE_*` environment variables; the raffle
//! core reads its own variables through [`RaffleConfig::from_lookup`].

use raffle_draw::RaffleConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::warn;

/// Environment variable overriding [`GatewayConfig::bind_addr`].
pub const ENV_BIND_ADDR: &str = "RAFFLE_BIND_ADDR";
/// Environment variable overriding [`GatewayConfig::entries_file`].
pub const ENV_ENTRIES_FILE: &str = "RAFFLE_ENTRIES_FILE";

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// JSON ledger export read by the entry source
    pub entries_file: PathBuf,
    /// Raffle core configuration
    pub raffle: RaffleConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            entries_file: PathBuf::from("entries.json"),
            raffle: RaffleConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Defaults overridden by `RAFFLE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            raffle: RaffleConfig::from_lookup(&lookup),
            ..Self::default()
        };

        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            match addr.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => warn!(
                    "[raffle] Ignoring {}={:?}: not a socket address",
                    ENV_BIND_ADDR, addr
                ),
            }
        }
        if let Some(path) = lookup(ENV_ENTRIES_FILE) {
            config.entries_file = PathBuf::from(path);
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("entries_file cannot be empty".into()));
        }

        self.raffle
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_validation() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
            (ENV_ENTRIES_FILE, "/var/lib/raffle/entries.json"),
            ("RAFFLE_BEACON_TIMEOUT_SECS", "4"),
        ]
        .into_iter()
        .collect();
        let config = GatewayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(
            config.entries_file,
            PathBuf::from("/var/lib/raffle/entries.json")
        );
        assert_eq!(config.raffle.beacon_timeout_secs, 4);
    }

    #[test]
    fn test_bad_bind_addr_keeps_default() {
        let config =
            GatewayConfig::from_lookup(|k| (k == ENV_BIND_ADDR).then(|| "nowhere".to_string()));
        assert_eq!(config.bind_addr, GatewayConfig::default().bind_addr);
    }

    #[test]
    fn test_invalid_raffle_config() {
        let mut config = GatewayConfig::default();
        config.raffle.beacon_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
