//! # Winner Selection
//!
//! Derives the winning index from public inputs only, so anyone holding the
//! committed root and the recorded seed can reproduce it.
//!
//! ```text
//! combined = SHA256(merkle_root ++ seed)      // root first, UTF-8 text
//! index    = U256::from_big_endian(combined) mod entry_count
//! ```
//!
//! For an `entry_count` that is not a power of two the modulo step favours
//! low indices by at most `entry_count / 2^256`, which is negligible for any
//! realistic entry count. No rejection sampling is applied.

use super::hashing::sha256;
use super::merkle_tree::build_root;
use crate::domain::{DrawVerification, RaffleError};
use primitive_types::U256;

/// Select the winning index in `[0, entry_count)`.
///
/// # Errors
/// - `InvalidEntryCount` if `entry_count == 0`
pub fn select_index(
    merkle_root: &str,
    seed: &str,
    entry_count: u64,
) -> Result<u64, RaffleError> {
    if entry_count == 0 {
        return Err(RaffleError::InvalidEntryCount);
    }

    let mut input = Vec::with_capacity(merkle_root.len() + seed.len());
    input.extend_from_slice(merkle_root.as_bytes());
    input.extend_from_slice(seed.as_bytes());

    let combined = U256::from_big_endian(&sha256(&input));
    Ok((combined % U256::from(entry_count)).low_u64())
}

/// Re-run a recorded draw from its snapshot and seed.
///
/// # Errors
/// - `EmptyInput` if the snapshot is empty
pub fn verify_draw<S: AsRef<str>>(
    entries: &[S],
    committed_root: &str,
    seed: &str,
    recorded_index: u64,
) -> Result<DrawVerification, RaffleError> {
    let recomputed_root = build_root(entries)?;
    let recomputed_index = select_index(&recomputed_root, seed, entries.len() as u64)?;

    Ok(DrawVerification {
        root_matches: recomputed_root == committed_root,
        index_matches: recomputed_index == recorded_index,
        recomputed_root,
        recomputed_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ROOT: &str = "61f744c570bf1efdbf1c81e1f2284c505a7ec3b3ca678df8da9cef7924ebaab3";

    fn zero_seed() -> String {
        format!("BITCOIN:{}", "0".repeat(64))
    }

    #[test]
    fn test_select_index_zero_count() {
        assert!(matches!(
            select_index(ROOT, "seed", 0),
            Err(RaffleError::InvalidEntryCount)
        ));
    }

    #[test]
    fn test_select_index_single_entry() {
        assert_eq!(select_index(ROOT, "anything", 1).unwrap(), 0);
    }

    #[test]
    fn test_select_index_known_vectors() {
        // SHA256(ROOT ++ "BITCOIN:000...0") reduced by several moduli
        let seed = zero_seed();
        assert_eq!(select_index(ROOT, &seed, 5).unwrap(), 0);
        assert_eq!(select_index(ROOT, &seed, 3).unwrap(), 2);
        assert_eq!(select_index(ROOT, &seed, 7).unwrap(), 3);
        assert_eq!(select_index(ROOT, &seed, 1000).unwrap(), 540);
        assert_eq!(select_index(ROOT, &seed, 10_000).unwrap(), 7540);
    }

    #[test]
    fn test_select_index_full_width() {
        // Reduction uses all 256 bits, not a truncated prefix
        assert_eq!(
            select_index(ROOT, &zero_seed(), u64::MAX).unwrap(),
            12_118_505_037_981_159_935
        );
    }

    #[test]
    fn test_select_index_depends_on_seed_and_root() {
        assert_eq!(select_index(ROOT, "BITCOIN:aa", 1_000_000).unwrap(), 690_021);
        assert_eq!(select_index(ROOT, "BITCOIN:ab", 1_000_000).unwrap(), 880_831);
        assert_eq!(
            select_index(&"1".repeat(64), "BITCOIN:aa", 1_000_000).unwrap(),
            526_829
        );
    }

    #[test]
    fn test_select_index_bound_every_count() {
        let seed = zero_seed();
        for count in 1..=10_000u64 {
            assert!(select_index(ROOT, &seed, count).unwrap() < count);
        }
    }

    #[test]
    fn test_verify_draw_passes() {
        let entries = ["e1", "e2", "e3", "e4", "e5"];
        let verification = verify_draw(&entries, ROOT, &zero_seed(), 0).unwrap();
        assert!(verification.passed());
        assert_eq!(verification.recomputed_root, ROOT);
    }

    #[test]
    fn test_verify_draw_detects_wrong_index() {
        let entries = ["e1", "e2", "e3", "e4", "e5"];
        let verification = verify_draw(&entries, ROOT, &zero_seed(), 4).unwrap();
        assert!(verification.root_matches);
        assert!(!verification.index_matches);
        assert!(!verification.passed());
    }

    #[test]
    fn test_verify_draw_detects_altered_snapshot() {
        let entries = ["e1", "e2", "e3", "e4", "e6"];
        let verification = verify_draw(&entries, ROOT, &zero_seed(), 0).unwrap();
        assert!(!verification.root_matches);
    }

    proptest! {
        #[test]
        fn prop_index_within_bounds(count in 1u64..=10_000, seed in "[0-9a-f]{64}") {
            let index = select_index(ROOT, &seed, count).unwrap();
            prop_assert!(index < count);
        }

        #[test]
        fn prop_select_index_deterministic(count in 1u64..=10_000, seed in ".{0,80}") {
            prop_assert_eq!(
                select_index(ROOT, &seed, count).unwrap(),
                select_index(ROOT, &seed, count).unwrap()
            );
        }
    }
}
