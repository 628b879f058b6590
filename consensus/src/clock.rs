//! Round clock
//!
//! Pure time-slot arithmetic. Given a round, a miner and a wall-clock
//! timestamp it answers how long the miner has to wait before acting. Both
//! the command generator and the scheduler go through this one function so
//! they can never disagree about whose turn it is.

use crate::config::ConsensusConfig;
use chrono::{DateTime, Utc};
use dpos_core::{MinerId, Round, INFINITE_MILLISECONDS};

/// Milliseconds until `order`'s slot in the current or next slot window.
///
/// Windows of `miner_count * mining_interval` repeat from the extra block
/// mining time. Inside a window, order `k` owns
/// `[(k - 1) * interval, k * interval)`; being inside one's own slot yields 0.
pub fn slot_waiting_milliseconds(
    order: u32,
    miner_count: usize,
    mining_interval: u64,
    extra_block_mining_time: DateTime<Utc>,
    timestamp: DateTime<Utc>,
) -> u64 {
    let round_time = miner_count as i64 * mining_interval as i64;
    if round_time == 0 || order == 0 {
        return INFINITE_MILLISECONDS;
    }

    let slot_start = (order as i64 - 1) * mining_interval as i64;
    let passed = (timestamp - extra_block_mining_time)
        .num_milliseconds()
        .rem_euclid(round_time);

    let waiting = if passed < slot_start {
        slot_start - passed
    } else if passed < slot_start + mining_interval as i64 {
        0
    } else {
        round_time - passed + slot_start
    };
    waiting as u64
}

pub struct RoundClock<'a> {
    config: &'a ConsensusConfig,
}

impl<'a> RoundClock<'a> {
    pub fn new(config: &'a ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn is_time_overflowed(&self, round: &Round, timestamp: DateTime<Utc>) -> bool {
        round.is_time_overflowed(
            self.config.mining_interval_milliseconds,
            self.config.time_overflow_margin_milliseconds,
            timestamp,
        )
    }

    /// Whether `miner` may still package its out value in this round
    pub fn is_slot_open(&self, round: &Round, miner: &MinerId, timestamp: DateTime<Utc>) -> bool {
        round
            .miner(miner)
            .map(|m| m.out_value.is_none())
            .unwrap_or(false)
            && !self.is_time_overflowed(round, timestamp)
    }

    /// Waiting time of `miner` at `timestamp`.
    ///
    /// Without a round this is the initial waiting time. While the miner's
    /// slot is open it is the distance to its expected mining time
    /// ([`INFINITE_MILLISECONDS`] once that time has passed). Otherwise the
    /// extra block producer waits for the extra block slot and everybody
    /// else for its slot window.
    pub fn counting_milliseconds(
        &self,
        round: Option<&Round>,
        miner: &MinerId,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let round = match round {
            Some(round) => round,
            None => return self.config.initial_waiting_milliseconds,
        };
        let own = match round.miner(miner) {
            Some(own) => own,
            None => return INFINITE_MILLISECONDS,
        };

        if self.is_slot_open(round, miner, timestamp) {
            let gap = (own.expected_mining_time - timestamp).num_milliseconds();
            return if gap < 0 {
                INFINITE_MILLISECONDS
            } else {
                gap as u64
            };
        }

        let interval = self.config.mining_interval_milliseconds;
        let extra_block_mining_time = match round.extra_block_mining_time(interval) {
            Some(time) => time,
            None => return INFINITE_MILLISECONDS,
        };

        if own.is_extra_block_producer && extra_block_mining_time > timestamp {
            return (extra_block_mining_time - timestamp).num_milliseconds() as u64;
        }

        slot_waiting_milliseconds(
            own.order,
            round.miner_count(),
            interval,
            extra_block_mining_time,
            timestamp,
        )
    }

    /// Term changes every `days_each_term` days counted from the chain start
    pub fn is_time_to_change_term(
        &self,
        blockchain_start: Option<DateTime<Utc>>,
        term_number: u64,
        timestamp: DateTime<Utc>,
    ) -> bool {
        match (self.config.days_each_term, blockchain_start) {
            (Some(days), Some(start)) if days > 0 => {
                let elapsed_days = (timestamp - start).num_days().max(0) as u64;
                elapsed_days / days != term_number.saturating_sub(1)
            }
            _ => false,
        }
    }
}
