//! JSON File Entry Source
//!
//! Implements `EntrySource` over a JSON document mapping period keys to
//! ordered entry lists:
//!
//! ```json
//! { "2024-11": ["ticket-1", "ticket-2"] }
//! ```
//!
//! The file is re-read on every call so an operator can append a period
//! without restarting the gateway.

use crate::domain::{Period, RaffleError};
use crate::ports::outbound::EntrySource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entry source reading a JSON ledger export.
pub struct JsonFileEntrySource {
    path: PathBuf,
}

impl JsonFileEntrySource {
    /// Source backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EntrySource for JsonFileEntrySource {
    async fn entries_for_period(&self, period: &Period) -> Result<Vec<String>, RaffleError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RaffleError::Persistence(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let mut ledger: HashMap<String, Vec<String>> = serde_json::from_str(&raw).map_err(|e| {
            RaffleError::Persistence(format!("cannot parse {}: {}", self.path.display(), e))
        })?;

        let entries = ledger.remove(period.as_str()).unwrap_or_default();
        debug!(
            "[raffle] Loaded {} entries for period {} from {}",
            entries.len(),
            period,
            self.path.display()
        );
        Ok(entries)
    }
}
