//! HTTP Randomness Beacon Adapter
//!
//! Implements `RandomnessBeacon` by fetching the latest block hash from a
//! public HTTP endpoint (blockchain.info `/q/latesthash` by default).

use crate::config::RaffleConfig;
use crate::domain::RaffleError;
use crate::ports::outbound::RandomnessBeacon;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Bodies larger than this are not a hash.
const MAX_BODY_BYTES: usize = 1024;

/// HTTP-based randomness beacon.
pub struct HttpRandomnessBeacon {
    client: Client,
    url: String,
}

impl HttpRandomnessBeacon {
    /// Create a beacon client for `config.beacon_url`.
    pub fn new(config: &RaffleConfig) -> Result<Self, RaffleError> {
        Self::with_timeout(config.beacon_url.clone(), config.beacon_timeout())
    }

    /// Create with custom URL and timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RaffleError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RaffleError::Beacon(format!("client setup failed: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RandomnessBeacon for HttpRandomnessBeacon {
    async fn fetch_latest_hash(&self) -> Result<String, RaffleError> {
        debug!("[raffle] Fetching latest hash from {}", self.url);

        let mut response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RaffleError::Beacon(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RaffleError::Beacon(format!("HTTP {}", status)));
        }

        if let Some(declared) = response.content_length() {
            if declared > MAX_BODY_BYTES as u64 {
                return Err(body_too_large(declared));
            }
        }

        // Chunked bodies carry no length, so the cap is enforced while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RaffleError::Beacon(format!("unreadable body: {}", e)))?
        {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(body_too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body).map_err(|_| RaffleError::Beacon("body is not UTF-8".into()))
    }

    fn beacon_id(&self) -> &str {
        &self.url
    }
}

fn body_too_large(bytes: u64) -> RaffleError {
    RaffleError::Beacon(format!("body of at least {} bytes is too large", bytes))
}
