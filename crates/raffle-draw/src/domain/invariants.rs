//! # Domain Invariants
//!
//! Business rules that must always hold true for a raffle.

use super::errors::RaffleError;

/// Length of a SHA-256 digest rendered as hex.
pub const HASH_HEX_LEN: usize = 64;

/// Longest accepted period key.
pub const MAX_PERIOD_LEN: usize = 64;

/// Label prefixed to locally generated seeds.
pub const FALLBACK_SEED_LABEL: &str = "FALLBACK";

/// Label prefixed to beacon seeds unless configured otherwise.
pub const DEFAULT_SEED_LABEL: &str = "BITCOIN";

/// Default upper bound on the beacon round trip.
pub const DEFAULT_BEACON_TIMEOUT_SECS: u64 = 10;

/// Default public randomness beacon (latest Bitcoin block hash, plain text).
pub const DEFAULT_BEACON_URL: &str = "https://blockchain.info/q/latesthash";

/// True when `value` matches `^[0-9a-f]{64}$`.
pub fn is_hash_hex(value: &str) -> bool {
    value.len() == HASH_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Invariant: a commitment needs a well-formed root over at least one entry.
pub fn invariant_commitment(merkle_root: &str, entry_count: u64) -> Result<(), RaffleError> {
    if entry_count == 0 {
        return Err(RaffleError::InvalidEntryCount);
    }
    if !is_hash_hex(merkle_root) {
        return Err(RaffleError::CorruptRecord(format!(
            "merkle root is not a 64-char hex digest: {:?}",
            merkle_root
        )));
    }
    Ok(())
}

/// Invariant: `winner_index ∈ [0, entry_count)`.
pub fn invariant_winner_index(winner_index: u64, entry_count: u64) -> Result<(), RaffleError> {
    if winner_index >= entry_count {
        return Err(RaffleError::EntryIndexOutOfRange {
            index: winner_index,
            count: entry_count,
        });
    }
    Ok(())
}

/// Invariant: the snapshot a draw runs on is the one that was committed.
pub fn invariant_snapshot_size(snapshot_len: usize, entry_count: u64) -> bool {
    snapshot_len as u64 == entry_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hash_hex() {
        assert!(is_hash_hex(&"0".repeat(64)));
        assert!(is_hash_hex(&"af".repeat(32)));
        assert!(!is_hash_hex(&"AF".repeat(32)));
        assert!(!is_hash_hex(&"0".repeat(63)));
        assert!(!is_hash_hex(&"g".repeat(64)));
        assert!(!is_hash_hex(""));
    }

    #[test]
    fn test_invariant_commitment() {
        assert!(invariant_commitment(&"0".repeat(64), 1).is_ok());
        assert!(matches!(
            invariant_commitment(&"0".repeat(64), 0),
            Err(RaffleError::InvalidEntryCount)
        ));
        assert!(invariant_commitment("root", 3).is_err());
    }

    #[test]
    fn test_invariant_winner_index() {
        assert!(invariant_winner_index(0, 1).is_ok());
        assert!(invariant_winner_index(4, 5).is_ok());
        assert!(invariant_winner_index(5, 5).is_err());
    }

    #[test]
    fn test_invariant_snapshot_size() {
        assert!(invariant_snapshot_size(5, 5));
        assert!(!invariant_snapshot_size(4, 5));
    }
}
