//! Irreversible block detection

use dpos_core::{MinerId, MinerInRound, Round};
use std::collections::BTreeSet;

/// Distinct producers needed before blocks become irreversible: ⌊2N/3⌋ + 1
pub fn confirmation_threshold(miner_count: usize) -> usize {
    miner_count * 2 / 3 + 1
}

/// Offset back from the tip of the last irreversible block, if any.
///
/// Once enough distinct miners have used their slot across the previous
/// and current round, everything before the current round's blocks is
/// final. The offset is the number of slots used in the current round.
/// Supplemented slots were never used and do not count.
pub fn find_irreversible_offset(current: &Round, previous: Option<&Round>) -> Option<u64> {
    let count = current.miner_count();
    if count == 0 {
        return None;
    }

    let mut producers: BTreeSet<&MinerId> = BTreeSet::new();
    for round in previous.into_iter().chain(std::iter::once(current)) {
        producers.extend(
            used_slots(round)
                .filter(|m| current.contains(&m.public_key))
                .map(|m| &m.public_key),
        );
    }

    if producers.len() >= confirmation_threshold(count) {
        Some(used_slots(current).count() as u64)
    } else {
        None
    }
}

fn used_slots(round: &Round) -> impl Iterator<Item = &MinerInRound> {
    round
        .real_time_miners_info
        .values()
        .filter(|m| m.out_value.is_some() && !m.is_missed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dpos_core::Hash;

    fn create_test_round(round_number: u64, filled: &[&str]) -> Round {
        let mut round = Round::new(round_number, 1);
        for (i, key) in ["aa", "bb", "cc", "dd"].iter().enumerate() {
            let mut miner = MinerInRound::new(MinerId::new(*key), i as u32 + 1, Utc::now());
            if filled.contains(key) {
                miner.out_value = Some(Hash::from_string(key));
            }
            round.insert(miner);
        }
        round
    }

    #[test]
    fn test_threshold() {
        assert_eq!(confirmation_threshold(3), 3);
        assert_eq!(confirmation_threshold(4), 3);
        assert_eq!(confirmation_threshold(17), 12);
    }

    #[test]
    fn test_not_enough_producers() {
        let current = create_test_round(3, &["aa"]);
        let previous = create_test_round(2, &["aa", "bb"]);

        assert_eq!(find_irreversible_offset(&current, Some(&previous)), None);
    }

    #[test]
    fn test_producers_across_two_rounds() {
        let current = create_test_round(3, &["aa", "cc"]);
        let previous = create_test_round(2, &["bb"]);

        assert_eq!(find_irreversible_offset(&current, Some(&previous)), Some(2));
    }

    #[test]
    fn test_supplemented_slots_do_not_count() {
        let current = create_test_round(3, &[]);
        let previous = create_test_round(2, &[]).supplement_for_first_round();

        assert_eq!(find_irreversible_offset(&current, Some(&previous)), None);
    }
}
