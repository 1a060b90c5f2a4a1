//! # Domain Errors
//!
//! Error types for the raffle draw subsystem.
//!
//! Every variant belongs to one [`ErrorKind`], which is what the HTTP
//! boundary uses to pick a status code and how much detail to reveal.

use super::value_objects::{RaffleId, RaffleStatus};
use thiserror::Error;

/// Hash type alias (32-byte SHA-256)
pub type Hash = [u8; 32];

/// Coarse classification of a [`RaffleError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input, no state was touched.
    Validation,
    /// The raffle is not in the state the operation requires.
    InvalidState,
    /// The raffle does not exist.
    NotFound,
    /// Stored data no longer satisfies its own commitments.
    Integrity,
    /// The external randomness beacon misbehaved.
    Dependency,
    /// The repository failed.
    Persistence,
}

/// Raffle error types.
#[derive(Debug, Error)]
pub enum RaffleError {
    /// A Merkle tree was requested over zero entries.
    #[error("Cannot build a Merkle tree from an empty entry list")]
    EmptyInput,

    /// The period had no entries at closing time.
    #[error("No entries for period {period}")]
    NoEntries {
        /// Period that was being closed
        period: String,
    },

    /// Period key failed validation.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Raffle id could not be parsed.
    #[error("Invalid raffle id: {0}")]
    InvalidRaffleId(String),

    /// Winner selection over zero entries.
    #[error("Entry count must be positive")]
    InvalidEntryCount,

    /// Seed string does not match any known format.
    #[error("Malformed seed: {0}")]
    MalformedSeed(String),

    /// Index is outside the entry snapshot.
    #[error("Entry index {index} out of range for {count} entries")]
    EntryIndexOutOfRange {
        /// Requested index
        index: u64,
        /// Number of entries
        count: u64,
    },

    /// Transition attempted from the wrong status.
    #[error("Raffle {raffle_id} is {actual}, expected {expected}")]
    InvalidState {
        /// Raffle concerned
        raffle_id: RaffleId,
        /// Status the operation requires
        expected: RaffleStatus,
        /// Status actually stored
        actual: RaffleStatus,
    },

    /// The raffle already has a recorded winner.
    #[error("Raffle {raffle_id} already drawn (winner {winner_entry_id})")]
    AlreadyDrawn {
        /// Raffle concerned
        raffle_id: RaffleId,
        /// Winner that was persisted by the successful draw
        winner_entry_id: String,
    },

    /// Raffle does not exist.
    #[error("Raffle not found: {0}")]
    NotFound(RaffleId),

    /// Entry snapshot is missing or does not reproduce the committed root.
    #[error("Entry snapshot integrity failure for raffle {raffle_id}: {reason}")]
    SnapshotIntegrity {
        /// Raffle concerned
        raffle_id: RaffleId,
        /// What did not match
        reason: String,
    },

    /// Persisted record violates a raffle invariant.
    #[error("Corrupt raffle record: {0}")]
    CorruptRecord(String),

    /// Randomness beacon failure. Never leaves the seed provider.
    #[error("Randomness beacon error: {0}")]
    Beacon(String),

    /// Repository failure.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl RaffleError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::NoEntries { .. }
            | Self::InvalidPeriod(_)
            | Self::InvalidRaffleId(_)
            | Self::InvalidEntryCount
            | Self::MalformedSeed(_)
            | Self::EntryIndexOutOfRange { .. } => ErrorKind::Validation,
            Self::InvalidState { .. } | Self::AlreadyDrawn { .. } => ErrorKind::InvalidState,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::SnapshotIntegrity { .. } | Self::CorruptRecord(_) => ErrorKind::Integrity,
            Self::Beacon(_) => ErrorKind::Dependency,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
