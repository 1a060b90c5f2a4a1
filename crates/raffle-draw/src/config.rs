//! # Raffle Configuration
//!
//! Configuration for the raffle draw service. Defaults can be overridden
//! through `RAFFLE_*` environment variables.

use crate::domain::{
    DEFAULT_BEACON_TIMEOUT_SECS, DEFAULT_BEACON_URL, DEFAULT_SEED_LABEL, FALLBACK_SEED_LABEL,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Environment variable overriding [`RaffleConfig::beacon_url`].
pub const ENV_BEACON_URL: &str = "RAFFLE_BEACON_URL";
/// Environment variable overriding [`RaffleConfig::beacon_timeout_secs`].
pub const ENV_BEACON_TIMEOUT_SECS: &str = "RAFFLE_BEACON_TIMEOUT_SECS";
/// Environment variable overriding [`RaffleConfig::seed_label`].
pub const ENV_SEED_LABEL: &str = "RAFFLE_SEED_LABEL";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Beacon URL is not http(s).
    #[error("invalid beacon url: {0}")]
    InvalidBeaconUrl(String),
    /// Timeout is zero.
    #[error("invalid beacon timeout: {0}")]
    InvalidTimeout(String),
    /// Seed label is unusable.
    #[error("invalid seed label: {0}")]
    InvalidSeedLabel(String),
}

/// Raffle service configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RaffleConfig {
    /// Randomness beacon endpoint returning the latest block hash.
    pub beacon_url: String,

    /// Upper bound on one beacon round trip, in seconds.
    pub beacon_timeout_secs: u64,

    /// Prefix recorded in front of beacon hashes (`<label>:<hash>`).
    pub seed_label: String,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            beacon_url: DEFAULT_BEACON_URL.to_string(),
            beacon_timeout_secs: DEFAULT_BEACON_TIMEOUT_SECS,
            seed_label: DEFAULT_SEED_LABEL.to_string(),
        }
    }
}

impl RaffleConfig {
    /// Create a config for testing (local beacon, short timeout).
    pub fn for_testing() -> Self {
        Self {
            beacon_url: "http://127.0.0.1:9/latesthash".to_string(),
            beacon_timeout_secs: 1,
            seed_label: DEFAULT_SEED_LABEL.to_string(),
        }
    }

    /// Defaults overridden by `RAFFLE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BEACON_URL) {
            config.beacon_url = url;
        }
        if let Some(secs) = lookup(ENV_BEACON_TIMEOUT_SECS) {
            match secs.parse() {
                Ok(secs) => config.beacon_timeout_secs = secs,
                Err(_) => warn!(
                    "[raffle] Ignoring {}={:?}: not a number",
                    ENV_BEACON_TIMEOUT_SECS, secs
                ),
            }
        }
        if let Some(label) = lookup(ENV_SEED_LABEL) {
            config.seed_label = label;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.beacon_url.starts_with("http://") || self.beacon_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBeaconUrl(self.beacon_url.clone()));
        }

        if self.beacon_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "beacon timeout cannot be 0".into(),
            ));
        }

        // Must not collide with fallback seeds or the `<label>:<hash>` split
        if self.seed_label.is_empty()
            || self.seed_label == FALLBACK_SEED_LABEL
            || !self.seed_label.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::InvalidSeedLabel(self.seed_label.clone()));
        }

        Ok(())
    }

    /// Beacon timeout as a `Duration`.
    pub fn beacon_timeout(&self) -> Duration {
        Duration::from_secs(self.beacon_timeout_secs)
    }
}
