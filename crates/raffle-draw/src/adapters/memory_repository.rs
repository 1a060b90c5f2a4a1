//! In-Memory Raffle Repository
//!
//! Implements `RaffleRepository` over process memory. Rows are held in their
//! flat `RaffleRecord` form and rehydrated on every read, so invariant
//! violations surface the same way they would from a database.

use crate::domain::{Period, Raffle, RaffleError, RaffleId, RaffleRecord, RaffleStatus};
use crate::ports::outbound::RaffleRepository;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct Tables {
    raffles: HashMap<RaffleId, RaffleRecord>,
    by_period: HashMap<String, RaffleId>,
    snapshots: HashMap<RaffleId, Vec<String>>,
}

impl Tables {
    fn stored(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError> {
        let record = self
            .raffles
            .get(&raffle_id)
            .cloned()
            .ok_or(RaffleError::NotFound(raffle_id))?;
        Raffle::try_from(record)
    }

    /// Compare-and-swap precondition: stored row is `expected`, new row is `next`.
    fn check_transition(
        &self,
        raffle: &Raffle,
        expected: RaffleStatus,
        next: RaffleStatus,
    ) -> Result<(), RaffleError> {
        if raffle.status() != next {
            return Err(RaffleError::Persistence(format!(
                "refusing to store {} raffle {} as {}",
                raffle.status(),
                raffle.id(),
                next
            )));
        }
        self.stored(raffle.id())?.require_status(expected)
    }
}

/// Raffle repository backed by process memory.
///
/// One mutex guards all tables, so every write is atomic with respect to
/// the status check that precedes it.
#[derive(Default)]
pub struct InMemoryRaffleRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRaffleRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored raffles.
    pub fn len(&self) -> usize {
        self.tables.lock().raffles.len()
    }

    /// No raffles stored?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a snapshot behind the commitment's back.
    #[cfg(test)]
    pub(crate) fn replace_snapshot(&self, raffle_id: RaffleId, entries: Vec<String>) {
        self.tables.lock().snapshots.insert(raffle_id, entries);
    }
}

#[async_trait]
impl RaffleRepository for InMemoryRaffleRepository {
    async fn find_by_id(&self, raffle_id: RaffleId) -> Result<Option<Raffle>, RaffleError> {
        let tables = self.tables.lock();
        match tables.raffles.get(&raffle_id) {
            Some(record) => Raffle::try_from(record.clone()).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_period(&self, period: &Period) -> Result<Option<Raffle>, RaffleError> {
        let tables = self.tables.lock();
        match tables.by_period.get(period.as_str()) {
            Some(id) => tables.stored(*id).map(Some),
            None => Ok(None),
        }
    }

    async fn create(&self, raffle: Raffle) -> Result<Raffle, RaffleError> {
        let mut tables = self.tables.lock();
        if let Some(existing) = tables.by_period.get(raffle.period().as_str()).copied() {
            debug!(
                "[raffle] Period {} already has raffle {}",
                raffle.period(),
                existing
            );
            return tables.stored(existing);
        }

        tables
            .by_period
            .insert(raffle.period().to_string(), raffle.id());
        tables
            .raffles
            .insert(raffle.id(), RaffleRecord::from(&raffle));
        Ok(raffle)
    }

    async fn save_closed(
        &self,
        raffle: Raffle,
        entries: Vec<String>,
    ) -> Result<Raffle, RaffleError> {
        let mut tables = self.tables.lock();
        tables.check_transition(&raffle, RaffleStatus::Open, RaffleStatus::Closed)?;

        tables.snapshots.insert(raffle.id(), entries);
        tables
            .raffles
            .insert(raffle.id(), RaffleRecord::from(&raffle));
        Ok(raffle)
    }

    async fn save_drawn(&self, raffle: Raffle) -> Result<Raffle, RaffleError> {
        let mut tables = self.tables.lock();
        tables.check_transition(&raffle, RaffleStatus::Closed, RaffleStatus::Drawn)?;

        tables
            .raffles
            .insert(raffle.id(), RaffleRecord::from(&raffle));
        Ok(raffle)
    }

    async fn entry_snapshot(
        &self,
        raffle_id: RaffleId,
    ) -> Result<Option<Vec<String>>, RaffleError> {
        Ok(self.tables.lock().snapshots.get(&raffle_id).cloned())
    }
}
