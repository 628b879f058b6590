//! Consensus command generation
//!
//! Decides what the local miner should propose next and how long to wait
//! before doing so. Never mutates state.

use crate::clock::RoundClock;
use crate::config::ConsensusConfig;
use chrono::{DateTime, Utc};
use dpos_core::{Behaviour, ConsensusState, DPoSCommand, MinerId};
use log::debug;

pub struct CommandGenerator<'a, S: ConsensusState> {
    state: &'a S,
    config: &'a ConsensusConfig,
}

impl<'a, S: ConsensusState> CommandGenerator<'a, S> {
    pub fn new(state: &'a S, config: &'a ConsensusConfig) -> Self {
        Self { state, config }
    }

    pub fn get_consensus_command(&self, public_key: &MinerId, timestamp: DateTime<Utc>) -> DPoSCommand {
        let clock = RoundClock::new(self.config);
        let round = self.state.current_round();

        let behaviour = match &round {
            None => Behaviour::InitialTerm,
            Some(round) if clock.is_slot_open(round, public_key, timestamp) => {
                Behaviour::PackageOutValue
            }
            Some(_) => {
                if clock.is_time_to_change_term(
                    self.state.blockchain_start_timestamp(),
                    self.state.current_term_number(),
                    timestamp,
                ) {
                    Behaviour::NextTerm
                } else {
                    Behaviour::NextRound
                }
            }
        };

        let command = DPoSCommand {
            behaviour,
            counting_milliseconds: clock.counting_milliseconds(round.as_ref(), public_key, timestamp),
            timeout_milliseconds: self.config.mining_interval_milliseconds,
        };

        debug!(
            "command for {}: {} in {}ms",
            public_key.short(10),
            command.behaviour,
            command.counting_milliseconds
        );
        command
    }
}
