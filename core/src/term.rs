//! Terms and miner sets

use crate::hash::{Hash, MinerId};
use crate::round::{seed_signature, MinerInRound, Round};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Miner set active during one term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Miners {
    pub term_number: u64,
    pub public_keys: Vec<MinerId>,
}

impl Miners {
    pub fn new(term_number: u64, public_keys: Vec<MinerId>) -> Self {
        Self {
            term_number,
            public_keys,
        }
    }

    pub fn len(&self) -> usize {
        self.public_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
    }

    pub fn contains(&self, miner: &MinerId) -> bool {
        self.public_keys.contains(miner)
    }

    /// Hash over the sorted key list, so insertion order does not matter
    pub fn miners_hash(&self) -> Hash {
        let mut keys: Vec<&str> = self.public_keys.iter().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        Hash::from_string(&keys.concat())
    }

    /// Build the opening rounds of a term for this miner set.
    ///
    /// Miners are ranked by the leading byte of their key, highest first, with
    /// ties broken by the key itself. The first round starts `initial_waiting` after
    /// `timestamp`, the second one directly after the first one's extra block
    /// slot. Extra block producers are picked from the miners hash.
    pub fn generate_new_term(
        &self,
        mining_interval: u64,
        initial_waiting_milliseconds: u64,
        round_number: u64,
        timestamp: DateTime<Utc>,
        chain_id: i32,
    ) -> Term {
        let mut sorted = self.public_keys.clone();
        sorted.sort_by(|a, b| {
            b.first_byte()
                .cmp(&a.first_byte())
                .then_with(|| a.as_str().cmp(b.as_str()))
        });

        let count = sorted.len();
        let miners_hash = self.miners_hash();
        let interval = Duration::milliseconds(mining_interval as i64);
        let waiting = Duration::milliseconds(initial_waiting_milliseconds as i64);
        let first_round_number = round_number + 1;

        let mut first_round = Round::new(first_round_number, self.term_number);
        let mut second_round = Round::new(first_round_number + 1, self.term_number);

        let first_extra = extra_index(&miners_hash, count);
        let second_extra = extra_index(&Hash::of(&miners_hash), count);

        for (i, key) in sorted.iter().enumerate() {
            let offset = interval * (i as i32 + 1);

            let mut first = MinerInRound::new(key.clone(), i as u32 + 1, timestamp + waiting + offset);
            first.signature = Some(seed_signature(key, first_round_number));
            first.is_extra_block_producer = i == first_extra;
            first_round.insert(first);

            let round_length = interval * (count as i32 + 1);
            let mut second =
                MinerInRound::new(key.clone(), i as u32 + 1, timestamp + waiting + round_length + offset);
            second.is_extra_block_producer = i == second_extra;
            second_round.insert(second);
        }

        Term {
            term_number: self.term_number,
            first_round,
            second_round,
            miners: self.clone(),
            mining_interval,
            timestamp,
            chain_id,
        }
    }
}

fn extra_index(hash: &Hash, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (hash.to_u64() % count as u64) as usize
    }
}

/// Opening rounds and miner set of a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term_number: u64,
    pub first_round: Round,
    pub second_round: Round,
    pub miners: Miners,
    pub mining_interval: u64,
    pub timestamp: DateTime<Utc>,
    pub chain_id: i32,
}
