//! # Algorithms Module
//!
//! Deterministic algorithms behind a verifiable draw: hashing, the Merkle
//! commitment over the entry set, and winner index derivation.

pub mod hashing;
pub mod merkle_tree;
pub mod winner_selection;

pub use hashing::{hash_pair, sha256, sha256_hex};
pub use merkle_tree::{build_root, verify_inclusion, MerkleTree};
pub use winner_selection::{select_index, verify_draw};
