//! # Domain Value Objects
//!
//! Immutable value types for the raffle draw subsystem.

use super::errors::RaffleError;
use super::invariants::{is_hash_hex, FALLBACK_SEED_LABEL, MAX_PERIOD_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique raffle identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaffleId(Uuid);

impl RaffleId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RaffleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RaffleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RaffleId {
    type Err = RaffleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| RaffleError::InvalidRaffleId(s.to_string()))
    }
}

/// Raffle period key (e.g. `"2024-11"`).
///
/// Non-empty, at most [`MAX_PERIOD_LEN`] characters, restricted to ASCII
/// alphanumerics and `-`, `_`, `.`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    /// Validate and wrap a period key.
    pub fn new(value: impl Into<String>) -> Result<Self, RaffleError> {
        let value = value.into();
        if value.is_empty() {
            return Err(RaffleError::InvalidPeriod("period is empty".to_string()));
        }
        if value.len() > MAX_PERIOD_LEN {
            return Err(RaffleError::InvalidPeriod(format!(
                "period longer than {} characters",
                MAX_PERIOD_LEN
            )));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(RaffleError::InvalidPeriod(format!(
                "unexpected character {:?} in {:?}",
                c, value
            )));
        }
        Ok(Self(value))
    }

    /// Period key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Period {
    type Error = RaffleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raffle lifecycle status.
///
/// ```text
/// OPEN ──close──→ CLOSED ──draw──→ DRAWN (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaffleStatus {
    /// Accepting entries.
    Open,
    /// Entry set committed by a Merkle root.
    Closed,
    /// Winner recorded.
    Drawn,
}

impl fmt::Display for RaffleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Drawn => "DRAWN",
        })
    }
}

/// Where a draw seed came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeedSource {
    /// Public randomness beacon.
    External,
    /// Locally generated. Lower assurance.
    Fallback,
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::External => "EXTERNAL",
            Self::Fallback => "FALLBACK",
        })
    }
}

/// A draw seed together with its provenance.
///
/// Formats:
/// - external: `<LABEL>:<64 lowercase hex>` (e.g. `BITCOIN:00ab...`)
/// - fallback: `FALLBACK:<epoch millis>:<uuid v4>`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    /// Full seed string, fed verbatim into winner selection.
    pub value: String,
    /// Provenance.
    pub source: SeedSource,
}

impl Seed {
    /// Seed from a validated beacon hash.
    pub fn external(label: &str, hash: &str) -> Result<Self, RaffleError> {
        Self::parse(&format!("{}:{}", label, hash))
    }

    /// Locally generated seed.
    pub fn fallback(epoch_millis: i64, nonce: Uuid) -> Self {
        Self {
            value: format!("{}:{}:{}", FALLBACK_SEED_LABEL, epoch_millis, nonce),
            source: SeedSource::Fallback,
        }
    }

    /// Parse a recorded seed string and recover its source.
    pub fn parse(value: &str) -> Result<Self, RaffleError> {
        let malformed = || RaffleError::MalformedSeed(value.to_string());
        let (label, rest) = value.split_once(':').ok_or_else(malformed)?;

        if label == FALLBACK_SEED_LABEL {
            let (millis, nonce) = rest.split_once(':').ok_or_else(malformed)?;
            millis.parse::<i64>().map_err(|_| malformed())?;
            Uuid::parse_str(nonce).map_err(|_| malformed())?;
            return Ok(Self {
                value: value.to_string(),
                source: SeedSource::Fallback,
            });
        }

        if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed());
        }
        if !is_hash_hex(rest) {
            return Err(malformed());
        }
        Ok(Self {
            value: value.to_string(),
            source: SeedSource::External,
        })
    }
}

/// The audit commitment written at the CLOSED transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Hex Merkle root over the entry snapshot.
    pub merkle_root: String,
    /// Number of entries in the snapshot.
    pub entry_count: u64,
    /// When the raffle closed.
    pub closed_at: DateTime<Utc>,
}

/// Result of a draw, written at the DRAWN transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    /// Seed used for selection.
    pub seed: Seed,
    /// Selected index into the entry snapshot.
    pub winner_index: u64,
    /// Entry at `winner_index`.
    pub winner_entry_id: String,
    /// When the draw was recorded.
    pub drawn_at: DateTime<Utc>,
}

/// Position of a sibling in a Merkle proof.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Sibling is on the left.
    Left,
    /// Sibling is on the right.
    Right,
}

/// Node in a Merkle proof path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofNode {
    /// Hex hash of the sibling node.
    pub hash: String,
    /// Position of the sibling.
    pub position: Position,
}

impl ProofNode {
    /// Create a left sibling node.
    pub fn left(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            position: Position::Left,
        }
    }

    /// Create a right sibling node.
    pub fn right(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            position: Position::Right,
        }
    }
}

/// Inclusion proof for one entry of a committed set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    /// Position of the entry in the snapshot.
    pub leaf_index: u64,
    /// Hex hash of the entry.
    pub leaf_hash: String,
    /// Sibling path from leaf to root.
    pub path: Vec<ProofNode>,
}

/// Inclusion proof bound to a specific raffle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntryProof {
    /// Raffle the entry belongs to.
    pub raffle_id: RaffleId,
    /// Entry identifier.
    pub entry_id: String,
    /// Committed root the proof resolves to.
    pub merkle_root: String,
    /// The proof itself.
    pub proof: MerkleProof,
}

/// Outcome of re-running a draw from public inputs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrawVerification {
    /// Root rebuilt from the snapshot.
    pub recomputed_root: String,
    /// Index recomputed from root and seed.
    pub recomputed_index: u64,
    /// Rebuilt root equals the committed one.
    pub root_matches: bool,
    /// Recomputed index equals the recorded one.
    pub index_matches: bool,
}

impl DrawVerification {
    /// Both checks passed.
    pub fn passed(&self) -> bool {
        self.root_matches && self.index_matches
    }
}

/// Everything a third party needs to re-verify a finished draw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransparencyReport {
    /// Raffle id.
    pub raffle_id: RaffleId,
    /// Period key.
    pub period: Period,
    /// Size of the entry snapshot.
    pub total_entries: u64,
    /// Committed root.
    pub merkle_root: String,
    /// Seed used for the draw.
    pub external_seed: String,
    /// Seed provenance.
    pub seed_source: SeedSource,
    /// Selected index.
    pub winner_index: u64,
    /// Selected entry.
    pub winner_entry_id: String,
    /// Inclusion proof of the winning entry.
    pub merkle_proof: MerkleProof,
    /// Root, index and proof all re-verified.
    pub verification_passed: bool,
}
