//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: randomness beacon, raffle store and
//! entry ledger.

mod entry_source;
mod http_beacon;
mod memory_repository;

pub use entry_source::JsonFileEntrySource;
pub use http_beacon::HttpRandomnessBeacon;
pub use memory_repository::InMemoryRaffleRepository;
