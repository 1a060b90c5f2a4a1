//! # Hashing Primitive
//!
//! SHA-256 helpers. Hashes travel through the raffle subsystem as lowercase
//! hex strings because that is the form published to auditors.

use crate::domain::Hash;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// SHA-256 of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Combine two child nodes: `SHA256(left ++ right)` over their hex text.
///
/// Order matters; siblings are never sorted.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_pair_is_concatenation() {
        assert_eq!(hash_pair("ab", "cd"), sha256_hex(b"abcd"));
    }

    #[test]
    fn test_hash_pair_is_ordered() {
        assert_ne!(hash_pair("ab", "cd"), hash_pair("cd", "ab"));
    }
}
