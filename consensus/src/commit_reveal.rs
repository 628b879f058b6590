//! Commit-reveal verification

use dpos_core::Hash;

/// A revealed `in_value` is valid only if it hashes to the published `out_value`
pub fn verify_reveal(out_value: &Hash, in_value: &Hash) -> bool {
    *out_value == Hash::of(in_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_reveal() {
        let in_value = Hash::from_string("entropy");
        assert!(verify_reveal(&Hash::of(&in_value), &in_value));
    }

    #[test]
    fn test_mismatching_reveal() {
        let in_value = Hash::from_string("entropy");
        let other = Hash::from_string("other");

        assert!(!verify_reveal(&Hash::of(&in_value), &other));
        // The commitment itself is not a valid reveal
        assert!(!verify_reveal(&in_value, &in_value));
    }
}
