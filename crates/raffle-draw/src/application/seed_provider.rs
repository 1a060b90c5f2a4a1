//! # External Seed Provider
//!
//! Turns an untrusted beacon payload into a draw seed. Any failure (timeout,
//! transport error, malformed body) degrades to a FALLBACK seed, which is
//! recorded as such so auditors can see the draw had lower assurance.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RaffleConfig;
use crate::domain::{is_hash_hex, RaffleError, Seed};
use crate::ports::{RandomnessBeacon, SeedProvider};

/// Seed provider backed by a public randomness beacon.
pub struct ExternalSeedProvider<B: RandomnessBeacon> {
    beacon: B,
    label: String,
    timeout: Duration,
}

impl<B: RandomnessBeacon> ExternalSeedProvider<B> {
    /// Wrap `beacon`, labelling and bounding fetches per `config`.
    pub fn new(beacon: B, config: &RaffleConfig) -> Self {
        Self {
            beacon,
            label: config.seed_label.clone(),
            timeout: config.beacon_timeout(),
        }
    }

    /// Underlying beacon.
    pub fn beacon(&self) -> &B {
        &self.beacon
    }

    async fn fetch_external(&self) -> Result<Seed, RaffleError> {
        let body = tokio::time::timeout(self.timeout, self.beacon.fetch_latest_hash())
            .await
            .map_err(|_| {
                RaffleError::Beacon(format!("no answer within {:?}", self.timeout))
            })??;

        let hash = parse_beacon_hash(&body)
            .ok_or_else(|| RaffleError::Beacon(format!("unusable payload {:?}", preview(&body))))?;
        Seed::external(&self.label, &hash)
    }
}

#[async_trait]
impl<B: RandomnessBeacon> SeedProvider for ExternalSeedProvider<B> {
    async fn get_seed(&self) -> Seed {
        match self.fetch_external().await {
            Ok(seed) => {
                info!(
                    "[raffle] Beacon {} returned {}...",
                    self.beacon.beacon_id(),
                    preview(&seed.value)
                );
                seed
            }
            Err(e) => {
                warn!(
                    "[raffle] Beacon {} unavailable, using fallback seed: {}",
                    self.beacon.beacon_id(),
                    e
                );
                Seed::fallback(Utc::now().timestamp_millis(), Uuid::new_v4())
            }
        }
    }
}

/// Extract a 64-hex hash from a beacon body.
///
/// Accepts the bare hash or a JSON object with a `hash` field, surrounding
/// whitespace allowed. Upper-case hex is normalised to lower case before
/// the lowercase-only check, so a beacon that reports the same hash in upper
/// case still yields an EXTERNAL seed with a canonical value.
pub fn parse_beacon_hash(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let candidate = if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        value.get("hash")?.as_str()?.trim().to_ascii_lowercase()
    } else {
        trimmed.to_ascii_lowercase()
    };

    is_hash_hex(&candidate).then_some(candidate)
}

fn preview(value: &str) -> &str {
    value.get(..24).unwrap_or(value)
}
