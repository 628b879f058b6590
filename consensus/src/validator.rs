//! Consensus information validation
//!
//! Read-only checks run on a proposed [`DPoSInformation`] before it is
//! accepted. Nothing here mutates state or fails hard; every rejection is a
//! [`ValidationResult`] with a message.

use crate::commit_reveal::verify_reveal;
use crate::config::ConsensusConfig;
use crate::information::elected_miners;
use dpos_core::{ConsensusState, DPoSInformation, Forwarding, Miners, Round, Term, ValidationResult};
use log::debug;

pub struct ConsensusValidator<'a, S: ConsensusState> {
    state: &'a S,
    config: &'a ConsensusConfig,
}

impl<'a, S: ConsensusState> ConsensusValidator<'a, S> {
    pub fn new(state: &'a S, config: &'a ConsensusConfig) -> Self {
        Self { state, config }
    }

    pub fn validate(&self, information: &DPoSInformation) -> ValidationResult {
        let result = self.check(information);
        if !result.success {
            debug!(
                "rejected consensus information from {}: {}",
                information.sender_public_key.short(10),
                result.message
            );
        }
        result
    }

    fn check(&self, information: &DPoSInformation) -> ValidationResult {
        let sender = &information.sender_public_key;

        if information.sender != sender.address() {
            return ValidationResult::fail("Sender address does not match its public key.");
        }

        let current = match self.state.current_round() {
            Some(round) => round,
            None => {
                // Genesis: the proposer must be one of the miners it proposes
                if !information.miners_list.is_empty() && !information.miners_list.contains(sender) {
                    return ValidationResult::fail("Sender is not a miner.");
                }
                return ValidationResult::ok();
            }
        };

        if !self.state.is_miner(sender) || !current.contains(sender) {
            return ValidationResult::fail("Sender is not a miner.");
        }

        if information.will_update_consensus {
            if let Some(forwarding) = &information.forwarding {
                return self.check_forwarding(&current, forwarding);
            }
            if let Some(term) = &information.new_term {
                return self.check_new_term(term);
            }
            return ValidationResult::fail("Missing round or term transition.");
        }

        match &information.current_round {
            Some(proposed) => check_same_round(&current, proposed),
            None => ValidationResult::fail("Missing round information."),
        }
    }

    fn check_forwarding(&self, current: &Round, forwarding: &Forwarding) -> ValidationResult {
        if forwarding.current_round.round_id() != current.round_id() {
            return ValidationResult::fail("Round Id not match.");
        }

        if !reveals_are_sound(&forwarding.current_round) {
            return ValidationResult::fail("Incorrect supplemented values.");
        }

        let next = match &forwarding.next_round {
            Some(next) => next,
            None => {
                // Only the opening round of a term hands over to its pre-built second round
                if self.state.round(current.round_number + 1).is_none() {
                    return ValidationResult::fail("Missing next round.");
                }
                return ValidationResult::ok();
            }
        };

        if next.miners_hash() != current.miners_hash() && !self.is_replacement(next) {
            return ValidationResult::fail("Incorrect miners list.");
        }

        if !next.in_values_are_null() {
            return ValidationResult::fail("Incorrect in values.");
        }

        ValidationResult::ok()
    }

    /// A different miner set is only acceptable when it is the full current election outcome
    fn is_replacement(&self, next: &Round) -> bool {
        let elected = Miners::new(0, elected_miners(self.state, self.config));
        next.miner_count() == self.config.producer_number
            && next.miners_hash() == elected.miners_hash()
    }

    fn check_new_term(&self, term: &Term) -> ValidationResult {
        let elected = Miners::new(term.term_number, elected_miners(self.state, self.config));
        if term.miners.miners_hash() != elected.miners_hash() {
            return ValidationResult::fail("Incorrect miners list.");
        }

        if !term.first_round.out_and_in_values_are_null()
            || !term.second_round.out_and_in_values_are_null()
        {
            return ValidationResult::fail("Incorrect Out Value or In Value.");
        }

        ValidationResult::ok()
    }
}

/// Every published in value must open the out value next to it
fn reveals_are_sound(round: &Round) -> bool {
    round.real_time_miners_info.values().all(|m| match (m.out_value, m.in_value) {
        (_, None) => true,
        (Some(out_value), Some(in_value)) => verify_reveal(&out_value, &in_value),
        (None, Some(_)) => false,
    })
}

/// Same-round update: identical round, existing commitments kept, exactly one new
fn check_same_round(current: &Round, proposed: &Round) -> ValidationResult {
    if proposed.round_id() != current.round_id() {
        return ValidationResult::fail("Round Id not match.");
    }

    let cleared = current.real_time_miners_info.values().any(|stored| {
        stored.out_value.is_some()
            && proposed.miner(&stored.public_key).and_then(|m| m.out_value) != stored.out_value
    });
    if cleared {
        return ValidationResult::fail("Incorrect new Out Value.");
    }

    if proposed.filled_out_value_count() != current.filled_out_value_count() + 1 {
        return ValidationResult::fail("Incorrect new Out Value.");
    }

    ValidationResult::ok()
}
