//! # Merkle Commitment
//!
//! Builds the Merkle root that commits a raffle to its entry snapshot, and
//! derives per-entry inclusion proofs from the retained layers.
//!
//! # Algorithm
//!
//! 1. Each entry is hashed on its own: `leaf = SHA256(entry)`
//! 2. Adjacent pairs are combined: `parent = SHA256(left ++ right)`
//! 3. A level with an odd number of nodes pairs its last node with itself
//! 4. Repeat until one node remains; that node is the root
//!
//! Entry order is part of the commitment. The same ordered list always
//! yields the same root.

use super::hashing::{hash_pair, sha256_hex};
use crate::domain::{MerkleProof, Position, ProofNode, RaffleError};

/// A fully materialised Merkle tree over an ordered entry list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    /// `layers[0]` are the leaves, the last layer holds only the root.
    layers: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Build the tree.
    ///
    /// # Errors
    /// - `EmptyInput` if `entries` is empty
    ///
    /// # Time Complexity: O(n)
    pub fn build<S: AsRef<str>>(entries: &[S]) -> Result<Self, RaffleError> {
        if entries.is_empty() {
            return Err(RaffleError::EmptyInput);
        }

        let mut level: Vec<String> = entries
            .iter()
            .map(|entry| sha256_hex(entry.as_ref().as_bytes()))
            .collect();
        let mut layers = Vec::new();

        while level.len() > 1 {
            let mut next_level = Vec::with_capacity((level.len() + 1) / 2);
            for chunk in level.chunks(2) {
                let left = &chunk[0];
                let right = chunk.get(1).unwrap_or(left); // Duplicate last if odd
                next_level.push(hash_pair(left, right));
            }
            layers.push(level);
            level = next_level;
        }
        layers.push(level);

        Ok(Self { layers })
    }

    /// Hex Merkle root.
    pub fn root(&self) -> &str {
        // Invariant: build() always pushes a final single-node layer.
        &self.layers[self.layers.len() - 1][0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// All layers, leaves first.
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// Inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    /// - `EntryIndexOutOfRange` if `index >= leaf_count()`
    ///
    /// # Time Complexity: O(log n)
    pub fn proof(&self, index: usize) -> Result<MerkleProof, RaffleError> {
        if index >= self.leaf_count() {
            return Err(RaffleError::EntryIndexOutOfRange {
                index: index as u64,
                count: self.leaf_count() as u64,
            });
        }

        let mut path = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut position = index;

        for level in &self.layers[..self.layers.len() - 1] {
            let node = if position % 2 == 0 {
                // Right sibling, or ourselves when we are the odd one out
                ProofNode::right(level.get(position + 1).unwrap_or(&level[position]).clone())
            } else {
                ProofNode::left(level[position - 1].clone())
            };
            path.push(node);
            position /= 2;
        }

        Ok(MerkleProof {
            leaf_index: index as u64,
            leaf_hash: self.layers[0][index].clone(),
            path,
        })
    }
}

/// Merkle root of an ordered entry list.
///
/// # Errors
/// - `EmptyInput` if `entries` is empty
pub fn build_root<S: AsRef<str>>(entries: &[S]) -> Result<String, RaffleError> {
    MerkleTree::build(entries).map(|tree| tree.root().to_string())
}

/// Check that `entry` is committed under `expected_root` via `proof`.
///
/// 1. Start with `SHA256(entry)`; it must equal `proof.leaf_hash`
/// 2. For each node: left sibling → `H(sibling ++ current)`,
///    right sibling → `H(current ++ sibling)`
/// 3. The final hash must equal `expected_root`
pub fn verify_inclusion(entry: &str, proof: &MerkleProof, expected_root: &str) -> bool {
    let mut current = sha256_hex(entry.as_bytes());
    if current != proof.leaf_hash {
        return false;
    }

    for node in &proof.path {
        current = match node.position {
            Position::Left => hash_pair(&node.hash, &current),
            Position::Right => hash_pair(&current, &node.hash),
        };
    }

    current == expected_root
}
