//! # Raffle Draw
//!
//! Provably-fair periodic raffles for a loyalty points ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Pick one winner per period so that anyone can check afterwards that the
//! operator neither edited the entry list nor chose the winner:
//! - The entry snapshot is committed to a Merkle root when the period closes
//! - The seed comes from a public randomness beacon (latest Bitcoin block hash)
//! - The winning index is `SHA256(root ++ seed) mod entry_count`
//!
//! ## Fairness Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | Fixed entry set | Merkle root recorded before any seed exists |
//! | Unpredictable seed | External beacon, FALLBACK seeds flagged as such |
//! | Reproducible winner | Public inputs only, no hidden state |
//! | Single outcome | Compare-and-swap on status in the repository |
//!
//! ## Module Structure
//!
//! ```text
//! raffle-draw/
//! ├── domain/          # Raffle aggregate, value objects, errors, invariants
//! ├── algorithms/      # Merkle commitment, inclusion proofs, winner selection
//! ├── ports/           # API trait (inbound) + dependency traits (outbound)
//! ├── application/     # RaffleService, ExternalSeedProvider
//! ├── adapters/        # HTTP beacon, in-memory repository, JSON entry source
//! └── config.rs        # RaffleConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{HttpRandomnessBeacon, InMemoryRaffleRepository, JsonFileEntrySource};
pub use algorithms::{
    build_root, hash_pair, select_index, sha256, sha256_hex, verify_draw, verify_inclusion,
    MerkleTree,
};
pub use application::{parse_beacon_hash, ExternalSeedProvider, RaffleService};
pub use config::{ConfigError, RaffleConfig};
pub use domain::{
    Commitment, DrawOutcome, DrawVerification, EntryProof, ErrorKind, Hash, MerkleProof, Period,
    Position, ProofNode, Raffle, RaffleError, RaffleId, RaffleRecord, RaffleStatus, Seed,
    SeedSource, TransparencyReport,
};
pub use ports::{
    EntrySource, FixedSeedProvider, MockBeacon, MockEntrySource, RaffleApi, RaffleRepository,
    RandomnessBeacon, SeedProvider,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
