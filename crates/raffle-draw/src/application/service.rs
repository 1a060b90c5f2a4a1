//! # Raffle Service
//!
//! Application service driving the raffle lifecycle:
//!
//! ```text
//! OPEN --close_period--> CLOSED --draw_winner--> DRAWN
//! ```
//!
//! The service holds no in-process locks. Every state change is a
//! compare-and-swap write in the repository, so concurrent callers (in this
//! process or another one) commit at most once per transition.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::algorithms::{select_index, verify_draw, verify_inclusion, MerkleTree};
use crate::domain::{
    invariant_snapshot_size, Commitment, EntryProof, ErrorKind, Period, Raffle, RaffleError,
    RaffleId, RaffleStatus, TransparencyReport,
};
use crate::ports::{EntrySource, RaffleApi, RaffleRepository, SeedProvider};

/// Raffle Service - orchestrates commitments, seeds and winner selection.
pub struct RaffleService<E, R, S>
where
    E: EntrySource,
    R: RaffleRepository,
    S: SeedProvider,
{
    /// Points ledger.
    entries: Arc<E>,
    /// Raffle store.
    repository: Arc<R>,
    /// Draw seeds.
    seeds: Arc<S>,
}

impl<E, R, S> RaffleService<E, R, S>
where
    E: EntrySource,
    R: RaffleRepository,
    S: SeedProvider,
{
    /// Create a new raffle service.
    pub fn new(entries: Arc<E>, repository: Arc<R>, seeds: Arc<S>) -> Self {
        Self {
            entries,
            repository,
            seeds,
        }
    }

    /// Repository handle.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    async fn load(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError> {
        self.repository
            .find_by_id(raffle_id)
            .await?
            .ok_or(RaffleError::NotFound(raffle_id))
    }

    async fn find_or_create(&self, period: &Period) -> Result<Raffle, RaffleError> {
        if let Some(raffle) = self.repository.find_by_period(period).await? {
            return Ok(raffle);
        }
        let raffle = self
            .repository
            .create(Raffle::open(period.clone(), Utc::now()))
            .await?;
        debug!("[raffle] Opened raffle {} for period {}", raffle.id(), period);
        Ok(raffle)
    }

    /// Internal: OPEN → CLOSED for `period`.
    async fn commit_close(&self, period: &Period) -> Result<Raffle, RaffleError> {
        let raffle = self.find_or_create(period).await?;
        raffle.require_status(RaffleStatus::Open)?;

        let entries = self.entries.entries_for_period(period).await?;
        if entries.is_empty() {
            warn!("[raffle] No entries for period {}, raffle stays OPEN", period);
            return Err(RaffleError::NoEntries {
                period: period.to_string(),
            });
        }

        let tree = MerkleTree::build(&entries)?;
        let root = tree.root().to_string();
        let closed = raffle.close(root, entries.len() as u64, Utc::now())?;
        let saved = self.repository.save_closed(closed, entries).await?;

        info!(
            raffle_id = %saved.id(),
            "[raffle] Closed period {} with {} entries, root {}",
            period,
            saved.entry_count().unwrap_or_default(),
            saved.merkle_root().unwrap_or_default()
        );
        Ok(saved)
    }

    /// Internal: CLOSED → DRAWN for `raffle_id`.
    async fn commit_draw(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError> {
        let raffle = self.load(raffle_id).await?;
        raffle.require_status(RaffleStatus::Closed)?;
        let commitment = committed(&raffle)?.clone();

        let seed = self.seeds.get_seed().await;
        let (snapshot, _) = self.load_snapshot(raffle_id, &commitment).await?;

        let winner_index =
            select_index(&commitment.merkle_root, &seed.value, commitment.entry_count)?;
        let winner_entry_id = usize::try_from(winner_index)
            .ok()
            .and_then(|i| snapshot.get(i))
            .cloned()
            .ok_or(RaffleError::EntryIndexOutOfRange {
                index: winner_index,
                count: commitment.entry_count,
            })?;

        let drawn = raffle.draw(seed, winner_index, winner_entry_id, Utc::now())?;
        let saved = match self.repository.save_drawn(drawn).await {
            Ok(saved) => saved,
            Err(e @ RaffleError::AlreadyDrawn { .. }) => {
                info!(
                    raffle_id = %raffle_id,
                    "[raffle] Concurrent draw committed first, discarding local result"
                );
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if let Some(outcome) = saved.outcome() {
            info!(
                raffle_id = %raffle_id,
                seed_source = %outcome.seed.source,
                "[raffle] Drew index {} of {}: winner {}",
                outcome.winner_index,
                commitment.entry_count,
                outcome.winner_entry_id
            );
        }
        Ok(saved)
    }

    /// Internal: load the entry snapshot and check it against the commitment.
    async fn load_snapshot(
        &self,
        raffle_id: RaffleId,
        commitment: &Commitment,
    ) -> Result<(Vec<String>, MerkleTree), RaffleError> {
        let integrity = |reason: String| RaffleError::SnapshotIntegrity { raffle_id, reason };

        let snapshot = self
            .repository
            .entry_snapshot(raffle_id)
            .await?
            .ok_or_else(|| integrity("snapshot missing".to_string()))?;

        if !invariant_snapshot_size(snapshot.len(), commitment.entry_count) {
            return Err(integrity(format!(
                "snapshot holds {} entries, commitment says {}",
                snapshot.len(),
                commitment.entry_count
            )));
        }

        let tree = MerkleTree::build(&snapshot)?;
        if tree.root() != commitment.merkle_root {
            return Err(integrity(format!(
                "snapshot root {} does not match committed root {}",
                tree.root(),
                commitment.merkle_root
            )));
        }

        Ok((snapshot, tree))
    }
}

fn committed(raffle: &Raffle) -> Result<&Commitment, RaffleError> {
    raffle.commitment().ok_or(RaffleError::InvalidState {
        raffle_id: raffle.id(),
        expected: RaffleStatus::Closed,
        actual: raffle.status(),
    })
}

/// Log failures that callers only see as a generic message.
fn log_failure(operation: &str, subject: &dyn std::fmt::Display, e: &RaffleError) {
    match e.kind() {
        ErrorKind::Integrity | ErrorKind::Persistence => {
            error!("[raffle] {} {} failed: {}", operation, subject, e)
        }
        _ => debug!("[raffle] {} {} rejected: {}", operation, subject, e),
    }
}

#[async_trait]
impl<E, R, S> RaffleApi for RaffleService<E, R, S>
where
    E: EntrySource + 'static,
    R: RaffleRepository + 'static,
    S: SeedProvider + 'static,
{
    async fn close_period(&self, period: Period) -> Result<Raffle, RaffleError> {
        let result = self.commit_close(&period).await;
        if let Err(e) = &result {
            log_failure("close", &period, e);
        }
        result
    }

    async fn draw_winner(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError> {
        let result = self.commit_draw(raffle_id).await;
        if let Err(e) = &result {
            log_failure("draw", &raffle_id, e);
        }
        result
    }

    async fn get_raffle(&self, raffle_id: RaffleId) -> Result<Raffle, RaffleError> {
        self.load(raffle_id).await
    }

    async fn find_by_period(&self, period: &Period) -> Result<Option<Raffle>, RaffleError> {
        self.repository.find_by_period(period).await
    }

    async fn inclusion_proof(
        &self,
        raffle_id: RaffleId,
        index: u64,
    ) -> Result<EntryProof, RaffleError> {
        let raffle = self.load(raffle_id).await?;
        let commitment = committed(&raffle)?;
        let (snapshot, tree) = self.load_snapshot(raffle_id, commitment).await?;

        let position = usize::try_from(index)
            .ok()
            .filter(|&i| i < snapshot.len())
            .ok_or(RaffleError::EntryIndexOutOfRange {
                index,
                count: commitment.entry_count,
            })?;

        Ok(EntryProof {
            raffle_id,
            entry_id: snapshot[position].clone(),
            merkle_root: commitment.merkle_root.clone(),
            proof: tree.proof(position)?,
        })
    }

    async fn transparency_report(
        &self,
        raffle_id: RaffleId,
    ) -> Result<TransparencyReport, RaffleError> {
        let raffle = self.load(raffle_id).await?;
        raffle.require_status(RaffleStatus::Drawn)?;
        let commitment = committed(&raffle)?;
        let outcome = raffle.outcome().ok_or_else(|| {
            RaffleError::CorruptRecord(format!("DRAWN raffle {} without outcome", raffle_id))
        })?;

        let result = self.load_snapshot(raffle_id, commitment).await;
        let (snapshot, tree) = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                log_failure("report", &raffle_id, &e);
                return Err(e);
            }
        };

        let position = usize::try_from(outcome.winner_index).map_err(|_| {
            RaffleError::EntryIndexOutOfRange {
                index: outcome.winner_index,
                count: commitment.entry_count,
            }
        })?;
        let merkle_proof = tree.proof(position)?;

        let draw = verify_draw(
            &snapshot,
            &commitment.merkle_root,
            &outcome.seed.value,
            outcome.winner_index,
        )?;
        let winner_included =
            verify_inclusion(&outcome.winner_entry_id, &merkle_proof, &commitment.merkle_root);
        let verification_passed = draw.passed() && winner_included;
        if !verification_passed {
            warn!(
                raffle_id = %raffle_id,
                "[raffle] Draw verification failed (root {}, index {}, inclusion {})",
                draw.root_matches,
                draw.index_matches,
                winner_included
            );
        }

        Ok(TransparencyReport {
            raffle_id,
            period: raffle.period().clone(),
            total_entries: commitment.entry_count,
            merkle_root: commitment.merkle_root.clone(),
            external_seed: outcome.seed.value.clone(),
            seed_source: outcome.seed.source,
            winner_index: outcome.winner_index,
            winner_entry_id: outcome.winner_entry_id.clone(),
            merkle_proof,
            verification_passed,
        })
    }
}
