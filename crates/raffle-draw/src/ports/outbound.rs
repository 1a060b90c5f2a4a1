//! # Outbound Ports
//!
//! Traits for external dependencies (entry ledger, persistence, randomness).

use crate::domain::{Period, Raffle, RaffleError, RaffleId, Seed};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Entry source - outbound port.
///
/// Read API of the points ledger: the ordered entry identifiers earned in a
/// period, in capture order.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Ordered entry identifiers of `period`.
    async fn entries_for_period(&self, period: &Period) -> Result<Vec<String>, RaffleError>;
}

/// Raffle repository - outbound port.
///
/// Writes are compare-and-swap on the stored status, so concurrent service
/// instances serialize through the store rather than through process memory.
/// A failed precondition is reported with the row that is actually stored:
/// `AlreadyDrawn` for a DRAWN row, `InvalidState` otherwise.
#[async_trait]
pub trait RaffleRepository: Send + Sync {
    /// Load a raffle by id.
    async fn find_by_id(&self, raffle_id: RaffleId) -> Result<Option<Raffle>, RaffleError>;

    /// Load the raffle of a period.
    async fn find_by_period(&self, period: &Period) -> Result<Option<Raffle>, RaffleError>;

    /// Insert an OPEN raffle. If the period already has a raffle, return
    /// that one instead.
    async fn create(&self, raffle: Raffle) -> Result<Raffle, RaffleError>;

    /// OPEN → CLOSED: store the closed raffle and its entry snapshot in one
    /// atomic write, conditional on the stored row still being OPEN.
    async fn save_closed(&self, raffle: Raffle, entries: Vec<String>)
        -> Result<Raffle, RaffleError>;

    /// CLOSED → DRAWN, conditional on the stored row still being CLOSED.
    async fn save_drawn(&self, raffle: Raffle) -> Result<Raffle, RaffleError>;

    /// Entry snapshot captured when the raffle closed.
    async fn entry_snapshot(&self, raffle_id: RaffleId)
        -> Result<Option<Vec<String>>, RaffleError>;
}

/// Randomness beacon - outbound port.
///
/// Returns the raw, untrusted latest-hash payload. Validation happens in the
/// seed provider.
#[async_trait]
pub trait RandomnessBeacon: Send + Sync {
    /// Fetch the latest beacon value.
    async fn fetch_latest_hash(&self) -> Result<String, RaffleError>;

    /// Beacon identifier (for logging).
    fn beacon_id(&self) -> &str;
}

/// Seed provider - outbound port used by the draw.
///
/// Infallible by contract: degradation is expressed as a FALLBACK seed.
#[async_trait]
pub trait SeedProvider: Send + Sync {
    /// Obtain a draw seed.
    async fn get_seed(&self) -> Seed;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock entry source backed by a map.
#[derive(Default)]
pub struct MockEntrySource {
    /// Entries per period key.
    pub entries: HashMap<String, Vec<String>>,
    /// Should return errors?
    pub should_fail: bool,
    calls: AtomicUsize,
}

impl MockEntrySource {
    /// Source with a single period.
    pub fn with_period(period: &str, entries: &[&str]) -> Self {
        let mut source = Self::default();
        source.insert(period, entries);
        source
    }

    /// Add or replace a period.
    pub fn insert(&mut self, period: &str, entries: &[&str]) {
        self.entries.insert(
            period.to_string(),
            entries.iter().map(|e| e.to_string()).collect(),
        );
    }

    /// Number of `entries_for_period` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntrySource for MockEntrySource {
    async fn entries_for_period(&self, period: &Period) -> Result<Vec<String>, RaffleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(RaffleError::Persistence("Mock failure".to_string()));
        }
        Ok(self.entries.get(period.as_str()).cloned().unwrap_or_default())
    }
}

/// Mock beacon returning a canned payload, optionally after a delay.
pub struct MockBeacon {
    response: Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockBeacon {
    /// Beacon answering `body`.
    pub fn returning(body: impl Into<String>) -> Self {
        Self {
            response: Ok(body.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Beacon failing with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RandomnessBeacon for MockBeacon {
    async fn fetch_latest_hash(&self) -> Result<String, RaffleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone().map_err(RaffleError::Beacon)
    }

    fn beacon_id(&self) -> &str {
        "mock-beacon"
    }
}

/// Seed provider that always hands out the same seed.
///
/// Used to replay a draw with a known public seed.
pub struct FixedSeedProvider {
    seed: Seed,
    calls: AtomicUsize,
}

impl FixedSeedProvider {
    /// Provider of `seed`.
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of seeds handed out so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SeedProvider for FixedSeedProvider {
    async fn get_seed(&self) -> Seed {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seed.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_entry_source_counts_calls() {
        let source = MockEntrySource::with_period("2024-11", &["e1", "e2"]);
        let period = Period::new("2024-11").unwrap();
        assert_eq!(source.entries_for_period(&period).await.unwrap(), vec!["e1", "e2"]);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_entry_source_unknown_period_is_empty() {
        let source = MockEntrySource::default();
        let period = Period::new("2030-01").unwrap();
        assert!(source.entries_for_period(&period).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_beacon_failure() {
        let beacon = MockBeacon::failing("down");
        assert!(matches!(
            beacon.fetch_latest_hash().await,
            Err(RaffleError::Beacon(_))
        ));
        assert_eq!(beacon.calls(), 1);
    }

    #[tokio::test]
    async fn test_fixed_seed_provider() {
        let seed = Seed::external("BITCOIN", &"0".repeat(64)).unwrap();
        let provider = FixedSeedProvider::new(seed.clone());
        assert_eq!(provider.get_seed().await, seed);
        assert_eq!(provider.calls(), 1);
    }
}
