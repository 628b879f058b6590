//! Round information
//!
//! A round is one full cycle through the active miners. Each miner owns one
//! time slot (its `order`), and one of them is additionally flagged as the
//! extra block producer that terminates the round.

use crate::hash::{Hash, MinerId};
use crate::term::Miners;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-miner state inside one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerInRound {
    pub public_key: MinerId,

    /// Slot position, 1..=N and unique within the round
    pub order: u32,

    pub expected_mining_time: DateTime<Utc>,

    /// Commitment published when the slot was used
    pub out_value: Option<Hash>,

    /// Revealed preimage of `out_value`
    pub in_value: Option<Hash>,

    pub signature: Option<Hash>,

    pub produced_blocks: u64,
    pub missed_time_slots: u64,
    pub latest_missed_time_slots: u64,
    pub is_missed: bool,
    pub is_extra_block_producer: bool,
}

impl MinerInRound {
    pub fn new(public_key: MinerId, order: u32, expected_mining_time: DateTime<Utc>) -> Self {
        Self {
            public_key,
            order,
            expected_mining_time,
            out_value: None,
            in_value: None,
            signature: None,
            produced_blocks: 0,
            missed_time_slots: 0,
            latest_missed_time_slots: 0,
            is_missed: false,
            is_extra_block_producer: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_number: u64,
    pub term_number: u64,
    pub blockchain_age: u64,
    pub real_time_miners_info: BTreeMap<MinerId, MinerInRound>,
}

impl Round {
    pub fn new(round_number: u64, term_number: u64) -> Self {
        Self {
            round_number,
            term_number,
            blockchain_age: 0,
            real_time_miners_info: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, miner: MinerInRound) {
        self.real_time_miners_info
            .insert(miner.public_key.clone(), miner);
    }

    pub fn miner_count(&self) -> usize {
        self.real_time_miners_info.len()
    }

    pub fn contains(&self, miner: &MinerId) -> bool {
        self.real_time_miners_info.contains_key(miner)
    }

    pub fn miner(&self, miner: &MinerId) -> Option<&MinerInRound> {
        self.real_time_miners_info.get(miner)
    }

    pub fn miner_mut(&mut self, miner: &MinerId) -> Option<&mut MinerInRound> {
        self.real_time_miners_info.get_mut(miner)
    }

    /// Content fingerprint: sum of expected mining times in whole seconds.
    ///
    /// Two nodes holding the "same" round agree on this value, so it is used
    /// to reject payloads built against stale or forked state.
    pub fn round_id(&self) -> i64 {
        self.real_time_miners_info
            .values()
            .map(|m| m.expected_mining_time.timestamp())
            .sum()
    }

    /// Miners sorted by slot order
    pub fn ordered_miners(&self) -> Vec<&MinerInRound> {
        let mut miners: Vec<&MinerInRound> = self.real_time_miners_info.values().collect();
        miners.sort_by_key(|m| m.order);
        miners
    }

    pub fn miners(&self) -> Miners {
        Miners::new(
            self.term_number,
            self.ordered_miners()
                .into_iter()
                .map(|m| m.public_key.clone())
                .collect(),
        )
    }

    /// Order-independent hash of the miner set
    pub fn miners_hash(&self) -> Hash {
        self.miners().miners_hash()
    }

    pub fn extra_block_producer(&self) -> Option<&MinerInRound> {
        self.real_time_miners_info
            .values()
            .find(|m| m.is_extra_block_producer)
    }

    /// Expected mining time of the miner with order 1
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.real_time_miners_info
            .values()
            .find(|m| m.order == 1)
            .map(|m| m.expected_mining_time)
    }

    /// One interval after the latest ordinary slot
    pub fn extra_block_mining_time(&self, mining_interval: u64) -> Option<DateTime<Utc>> {
        self.real_time_miners_info
            .values()
            .map(|m| m.expected_mining_time)
            .max()
            .map(|last| last + Duration::milliseconds(mining_interval as i64))
    }

    /// A round overflows once the wall clock is within `margin` of its extra block slot.
    pub fn is_time_overflowed(
        &self,
        mining_interval: u64,
        margin_milliseconds: u64,
        timestamp: DateTime<Utc>,
    ) -> bool {
        match self.extra_block_mining_time(mining_interval) {
            Some(extra) => extra - Duration::milliseconds(margin_milliseconds as i64) < timestamp,
            None => false,
        }
    }

    pub fn filled_out_value_count(&self) -> usize {
        self.real_time_miners_info
            .values()
            .filter(|m| m.out_value.is_some())
            .count()
    }

    pub fn all_out_values_filled(&self) -> bool {
        self.miner_count() > 0 && self.filled_out_value_count() == self.miner_count()
    }

    pub fn out_and_in_values_are_null(&self) -> bool {
        self.real_time_miners_info
            .values()
            .all(|m| m.out_value.is_none() && m.in_value.is_none())
    }

    pub fn in_values_are_null(&self) -> bool {
        self.real_time_miners_info
            .values()
            .all(|m| m.in_value.is_none())
    }

    /// Total blocks produced by all miners of this round
    pub fn mined_blocks(&self) -> u64 {
        self.real_time_miners_info
            .values()
            .map(|m| m.produced_blocks)
            .sum()
    }

    /// First miner (by order) that published a signature
    pub fn first_place_miner(&self) -> Option<&MinerInRound> {
        self.ordered_miners()
            .into_iter()
            .find(|m| m.signature.is_some())
    }

    /// Aggregate signature: `Hash(in_value, fold(signatures))`.
    ///
    /// Slots without a signature contribute the hash of their public key.
    pub fn calculate_signature(&self, in_value: &Hash) -> Hash {
        let aggregated = self
            .ordered_miners()
            .into_iter()
            .fold(Hash::ZERO, |acc, miner| {
                let signature = miner
                    .signature
                    .unwrap_or_else(|| Hash::from_string(miner.public_key.as_str()));
                Hash::from_two_hashes(&acc, &signature)
            });
        Hash::from_two_hashes(in_value, &aggregated)
    }

    /// Fill every empty slot with deterministic stand-in values so the round
    /// can be closed. Each filled slot is charged one missed time slot.
    pub fn supplement(&self, previous: &Round) -> Round {
        self.supplement_with(|in_value| previous.calculate_signature(in_value))
    }

    /// Same as [`Round::supplement`] for round 1, which has no predecessor.
    pub fn supplement_for_first_round(&self) -> Round {
        let reference = self.clone();
        self.supplement_with(|in_value| reference.calculate_signature(in_value))
    }

    fn supplement_with(&self, sign: impl Fn(&Hash) -> Hash) -> Round {
        let round_id = self.round_id();
        let mut round = self.clone();
        for miner in round
            .real_time_miners_info
            .values_mut()
            .filter(|m| m.out_value.is_none())
        {
            let in_value = Hash::from_string(&format!("{}:{}", miner.public_key, round_id));
            miner.in_value = Some(in_value);
            miner.out_value = Some(Hash::of(&in_value));
            miner.signature = Some(sign(&in_value));
            miner.missed_time_slots += 1;
            miner.is_missed = true;
        }
        round
    }

    /// Build the following round from this one.
    ///
    /// Next-round order is the signature modulo N (first free slot on
    /// conflict). Slots start one interval after this round's extra block
    /// slot, or after `timestamp` when that slot is already more than 1.5
    /// intervals in the past. The current extra block producer opens the new
    /// round with order 1.
    pub fn generate_next_round(&self, mining_interval: u64, timestamp: DateTime<Utc>) -> Round {
        let count = self.miner_count();
        let mut next = Round::new(self.round_number + 1, self.term_number);
        next.blockchain_age = self.blockchain_age;
        if count == 0 {
            return next;
        }

        let mut slots: BTreeMap<usize, MinerId> = BTreeMap::new();
        for miner in self.ordered_miners() {
            let signature = miner
                .signature
                .unwrap_or_else(|| seed_signature(&miner.public_key, self.round_number));
            let mut slot = (signature.to_u64() % count as u64) as usize;
            if slots.contains_key(&slot) {
                if let Some(free) = (0..count).find(|i| !slots.contains_key(i)) {
                    slot = free;
                }
            }
            slots.insert(slot, miner.public_key.clone());
        }

        let interval = Duration::milliseconds(mining_interval as i64);
        let mut start = self.extra_block_mining_time(mining_interval).unwrap_or(timestamp);
        if start + Duration::milliseconds((mining_interval as i64 * 3) / 2) < timestamp {
            start = timestamp;
        }

        for (slot, public_key) in slots {
            let expected = start + interval * (slot as i32) + interval;
            next.insert(MinerInRound::new(public_key, slot as u32 + 1, expected));
        }

        let extra_order = self.next_extra_block_producer_order(count) as u32 + 1;
        if let Some(miner) = next
            .real_time_miners_info
            .values_mut()
            .find(|m| m.order == extra_order)
        {
            miner.is_extra_block_producer = true;
        }

        if count > 1 {
            if let Some(previous_extra) = self.extra_block_producer().map(|m| m.public_key.clone()) {
                next.move_to_first_slot(&previous_extra);
            }
        }

        next
    }

    fn next_extra_block_producer_order(&self, count: usize) -> usize {
        match self.first_place_miner().and_then(|m| m.signature) {
            Some(signature) => (signature.to_u64() % count as u64) as usize,
            None => 0,
        }
    }

    /// Swap slot (order and expected time) of `miner` with the miner holding order 1.
    fn move_to_first_slot(&mut self, miner: &MinerId) {
        let first = match self
            .real_time_miners_info
            .values()
            .find(|m| m.order == 1)
            .map(|m| m.public_key.clone())
        {
            Some(first) if &first != miner => first,
            _ => return,
        };

        let (order, time) = match self.miner(miner) {
            Some(m) => (m.order, m.expected_mining_time),
            None => return,
        };
        let first_time = match self.miner(&first) {
            Some(m) => m.expected_mining_time,
            None => return,
        };

        if let Some(m) = self.miner_mut(miner) {
            m.order = 1;
            m.expected_mining_time = first_time;
        }
        if let Some(m) = self.miner_mut(&first) {
            m.order = order;
            m.expected_mining_time = time;
        }
    }
}

/// Deterministic stand-in signature for a slot that never published one
pub fn seed_signature(miner: &MinerId, round_number: u64) -> Hash {
    Hash::from_string(&format!("{}:{}", miner, round_number))
}
