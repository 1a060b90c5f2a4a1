//! # Domain Entities
//!
//! The `Raffle` aggregate and its flat persisted shape.
//!
//! A `Raffle` is immutable. Status changes only through [`Raffle::close`] and
//! [`Raffle::draw`], which consume the old value and validate the transition,
//! so a status can never exist without the fields it implies.

use super::errors::RaffleError;
use super::invariants::{invariant_commitment, invariant_winner_index};
use super::value_objects::{
    Commitment, DrawOutcome, Period, RaffleId, RaffleStatus, Seed, SeedSource,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
enum RaffleState {
    Open,
    Closed(Commitment),
    Drawn {
        commitment: Commitment,
        outcome: DrawOutcome,
    },
}

impl RaffleState {
    fn status(&self) -> RaffleStatus {
        match self {
            Self::Open => RaffleStatus::Open,
            Self::Closed(_) => RaffleStatus::Closed,
            Self::Drawn { .. } => RaffleStatus::Drawn,
        }
    }
}

fn transition_error(
    raffle_id: RaffleId,
    state: &RaffleState,
    expected: RaffleStatus,
) -> RaffleError {
    match state {
        RaffleState::Drawn { outcome, .. } => RaffleError::AlreadyDrawn {
            raffle_id,
            winner_entry_id: outcome.winner_entry_id.clone(),
        },
        _ => RaffleError::InvalidState {
            raffle_id,
            expected,
            actual: state.status(),
        },
    }
}

/// A periodic raffle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    id: RaffleId,
    period: Period,
    created_at: DateTime<Utc>,
    state: RaffleState,
}

impl Raffle {
    /// Create a new OPEN raffle for `period`.
    pub fn open(period: Period, created_at: DateTime<Utc>) -> Self {
        Self {
            id: RaffleId::new(),
            period,
            created_at,
            state: RaffleState::Open,
        }
    }

    /// OPEN → CLOSED. Records the audit commitment.
    ///
    /// # Errors
    /// - `InvalidState` if the raffle is not OPEN
    /// - `InvalidEntryCount` / `CorruptRecord` if the commitment is malformed
    pub fn close(
        self,
        merkle_root: String,
        entry_count: u64,
        closed_at: DateTime<Utc>,
    ) -> Result<Self, RaffleError> {
        self.require_status(RaffleStatus::Open)?;
        invariant_commitment(&merkle_root, entry_count)?;

        Ok(Self {
            state: RaffleState::Closed(Commitment {
                merkle_root,
                entry_count,
                closed_at,
            }),
            ..self
        })
    }

    /// CLOSED → DRAWN. Records the winner.
    ///
    /// # Errors
    /// - `AlreadyDrawn` if a winner is already recorded
    /// - `InvalidState` if the raffle is still OPEN
    /// - `EntryIndexOutOfRange` if `winner_index >= entry_count`
    pub fn draw(
        self,
        seed: Seed,
        winner_index: u64,
        winner_entry_id: String,
        drawn_at: DateTime<Utc>,
    ) -> Result<Self, RaffleError> {
        let Self {
            id,
            period,
            created_at,
            state,
        } = self;
        let commitment = match state {
            RaffleState::Closed(commitment) => commitment,
            other => return Err(transition_error(id, &other, RaffleStatus::Closed)),
        };
        invariant_winner_index(winner_index, commitment.entry_count)?;

        Ok(Self {
            id,
            period,
            created_at,
            state: RaffleState::Drawn {
                commitment,
                outcome: DrawOutcome {
                    seed,
                    winner_index,
                    winner_entry_id,
                    drawn_at,
                },
            },
        })
    }

    /// Fail unless the raffle is in `expected` status.
    ///
    /// A DRAWN raffle always yields `AlreadyDrawn` so callers can surface
    /// the recorded winner instead of a bare conflict.
    pub fn require_status(&self, expected: RaffleStatus) -> Result<(), RaffleError> {
        if self.status() == expected {
            return Ok(());
        }
        Err(transition_error(self.id, &self.state, expected))
    }

    /// Raffle id.
    pub fn id(&self) -> RaffleId {
        self.id
    }

    /// Period key.
    pub fn period(&self) -> &Period {
        &self.period
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current status.
    pub fn status(&self) -> RaffleStatus {
        self.state.status()
    }

    /// Audit commitment, once CLOSED.
    pub fn commitment(&self) -> Option<&Commitment> {
        match &self.state {
            RaffleState::Open => None,
            RaffleState::Closed(commitment) | RaffleState::Drawn { commitment, .. } => {
                Some(commitment)
            }
        }
    }

    /// Draw outcome, once DRAWN.
    pub fn outcome(&self) -> Option<&DrawOutcome> {
        match &self.state {
            RaffleState::Drawn { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Committed Merkle root.
    pub fn merkle_root(&self) -> Option<&str> {
        self.commitment().map(|c| c.merkle_root.as_str())
    }

    /// Committed entry count.
    pub fn entry_count(&self) -> Option<u64> {
        self.commitment().map(|c| c.entry_count)
    }
}

/// Flat row shape of a raffle, as stored and as served over HTTP.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleRecord {
    /// Raffle id.
    pub id: RaffleId,
    /// Period key.
    pub period: String,
    /// Lifecycle status.
    pub status: RaffleStatus,
    /// Hex Merkle root (CLOSED and later).
    pub merkle_root: Option<String>,
    /// Snapshot size (CLOSED and later).
    pub entry_count: Option<u64>,
    /// Seed used for the draw (DRAWN).
    pub external_seed: Option<String>,
    /// Seed provenance (DRAWN).
    pub seed_source: Option<SeedSource>,
    /// Winning entry (DRAWN).
    pub winner_entry_id: Option<String>,
    /// Winning index (DRAWN).
    pub winner_index: Option<u64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Close time.
    pub closed_at: Option<DateTime<Utc>>,
    /// Draw time.
    pub drawn_at: Option<DateTime<Utc>>,
}

impl From<&Raffle> for RaffleRecord {
    fn from(raffle: &Raffle) -> Self {
        let commitment = raffle.commitment();
        let outcome = raffle.outcome();
        Self {
            id: raffle.id,
            period: raffle.period.to_string(),
            status: raffle.status(),
            merkle_root: commitment.map(|c| c.merkle_root.clone()),
            entry_count: commitment.map(|c| c.entry_count),
            external_seed: outcome.map(|o| o.seed.value.clone()),
            seed_source: outcome.map(|o| o.seed.source),
            winner_entry_id: outcome.map(|o| o.winner_entry_id.clone()),
            winner_index: outcome.map(|o| o.winner_index),
            created_at: raffle.created_at,
            closed_at: commitment.map(|c| c.closed_at),
            drawn_at: outcome.map(|o| o.drawn_at),
        }
    }
}

fn required<T>(value: Option<T>, field: &str, status: RaffleStatus) -> Result<T, RaffleError> {
    value.ok_or_else(|| RaffleError::CorruptRecord(format!("{} raffle without {}", status, field)))
}

fn restore_commitment(
    merkle_root: Option<String>,
    entry_count: Option<u64>,
    closed_at: Option<DateTime<Utc>>,
    status: RaffleStatus,
) -> Result<Commitment, RaffleError> {
    let merkle_root = required(merkle_root, "merkleRoot", status)?;
    let entry_count = required(entry_count, "entryCount", status)?;
    invariant_commitment(&merkle_root, entry_count)
        .map_err(|e| RaffleError::CorruptRecord(e.to_string()))?;
    Ok(Commitment {
        merkle_root,
        entry_count,
        closed_at: required(closed_at, "closedAt", status)?,
    })
}

impl TryFrom<RaffleRecord> for Raffle {
    type Error = RaffleError;

    /// Rehydrate a stored row, re-checking every raffle invariant.
    fn try_from(record: RaffleRecord) -> Result<Self, Self::Error> {
        let period = Period::new(record.period)
            .map_err(|e| RaffleError::CorruptRecord(e.to_string()))?;
        let status = record.status;

        let has_commitment = record.merkle_root.is_some()
            || record.entry_count.is_some()
            || record.closed_at.is_some();
        let has_outcome = record.external_seed.is_some()
            || record.seed_source.is_some()
            || record.winner_entry_id.is_some()
            || record.winner_index.is_some()
            || record.drawn_at.is_some();

        let state = match status {
            RaffleStatus::Open => {
                if has_commitment || has_outcome {
                    return Err(RaffleError::CorruptRecord(
                        "OPEN raffle carries close or draw fields".to_string(),
                    ));
                }
                RaffleState::Open
            }
            RaffleStatus::Closed => {
                if has_outcome {
                    return Err(RaffleError::CorruptRecord(
                        "CLOSED raffle carries draw fields".to_string(),
                    ));
                }
                RaffleState::Closed(restore_commitment(
                    record.merkle_root,
                    record.entry_count,
                    record.closed_at,
                    status,
                )?)
            }
            RaffleStatus::Drawn => {
                let commitment = restore_commitment(
                    record.merkle_root,
                    record.entry_count,
                    record.closed_at,
                    status,
                )?;
                let value = required(record.external_seed, "externalSeed", status)?;
                let source = required(record.seed_source, "seedSource", status)?;
                let seed = Seed::parse(&value)
                    .map_err(|e| RaffleError::CorruptRecord(e.to_string()))?;
                if seed.source != source {
                    return Err(RaffleError::CorruptRecord(format!(
                        "seed {:?} recorded as {}",
                        value, source
                    )));
                }
                let winner_index = required(record.winner_index, "winnerIndex", status)?;
                invariant_winner_index(winner_index, commitment.entry_count)
                    .map_err(|e| RaffleError::CorruptRecord(e.to_string()))?;
                RaffleState::Drawn {
                    commitment,
                    outcome: DrawOutcome {
                        seed,
                        winner_index,
                        winner_entry_id: required(
                            record.winner_entry_id,
                            "winnerEntryId",
                            status,
                        )?,
                        drawn_at: required(record.drawn_at, "drawnAt", status)?,
                    },
                }
            }
        };

        Ok(Self {
            id: record.id,
            period,
            created_at: record.created_at,
            state,
        })
    }
}
