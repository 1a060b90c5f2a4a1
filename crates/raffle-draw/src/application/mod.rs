//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod seed_provider;
pub mod service;

pub use seed_provider::{parse_beacon_hash, ExternalSeedProvider};
pub use service::RaffleService;
