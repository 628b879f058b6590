//! Consensus information and transaction generation
//!
//! Turns a node's [`DPoSExtraInformation`] trigger into the consensus
//! information it should put in its block header, and into the system
//! transactions that carry the same decision on-chain. Read-only.

use crate::clock::RoundClock;
use crate::config::ConsensusConfig;
use crate::errors::{ConsensusError, ConsensusResult};
use chrono::{DateTime, Utc};
use dpos_core::{
    Behaviour, ConsensusCall, ConsensusState, DPoSExtraInformation, DPoSInformation, Forwarding,
    Hash, MinerId, Miners, Round, Term, ToBroadcast, ToPackage, Transaction, TransactionList,
};
use log::debug;

/// Miners of the next term: current victories, or the sitting miners when nobody holds tickets
pub fn elected_miners<S: ConsensusState>(state: &S, config: &ConsensusConfig) -> Vec<MinerId> {
    let victories = state.victories(config.producer_number);
    if !victories.is_empty() {
        return victories;
    }
    state
        .current_miners()
        .map(|m| m.public_keys)
        .or_else(|| state.current_round().map(|r| r.miners().public_keys))
        .unwrap_or_default()
}

pub struct InformationGenerator<'a, S: ConsensusState> {
    state: &'a S,
    config: &'a ConsensusConfig,
}

impl<'a, S: ConsensusState> InformationGenerator<'a, S> {
    pub fn new(state: &'a S, config: &'a ConsensusConfig) -> Self {
        Self { state, config }
    }

    pub fn get_new_consensus_information(
        &self,
        extra: &DPoSExtraInformation,
    ) -> ConsensusResult<DPoSInformation> {
        let public_key = &extra.public_key;

        if self.state.current_round_number() == 0 {
            let mut information = DPoSInformation::new(public_key.clone(), Behaviour::InitialTerm);
            information.will_update_consensus = true;
            information.new_term = Some(self.generate_first_term(extra));
            information.miners_list = extra.initial_miners.clone();
            return Ok(information);
        }

        let current = self.current_round()?;

        if self.is_round_over(&current, extra.timestamp) {
            let mut information = if self.can_change_term(&current, extra) {
                let mut information = DPoSInformation::new(public_key.clone(), Behaviour::NextTerm);
                information.new_term = Some(self.generate_next_term(extra.timestamp)?);
                information
            } else {
                let mut information = DPoSInformation::new(public_key.clone(), Behaviour::NextRound);
                information.forwarding = Some(self.generate_forwarding(extra.timestamp)?);
                information
            };
            information.will_update_consensus = true;
            return Ok(information);
        }

        let (out_value, signature) = self.slot_commitment(&current, extra)?;
        let mut round = current;
        if let Some(miner) = round.miner_mut(public_key) {
            miner.out_value = Some(out_value);
            miner.signature = Some(signature);
        }

        let mut information = DPoSInformation::new(public_key.clone(), Behaviour::PackageOutValue);
        information.current_round = Some(round);
        Ok(information)
    }

    pub fn generate_consensus_transactions(
        &self,
        ref_block_height: u64,
        ref_block_prefix: [u8; 4],
        extra: &DPoSExtraInformation,
    ) -> ConsensusResult<TransactionList> {
        let transaction = |call: ConsensusCall| Transaction {
            from: extra.public_key.address(),
            ref_block_number: ref_block_height.saturating_sub(self.config.ref_block_offset),
            ref_block_prefix,
            call,
        };
        let mut list = TransactionList::default();

        if self.state.current_round_number() == 0 {
            let term = match &extra.new_term {
                Some(term) => term.clone(),
                None => self.generate_first_term(extra),
            };
            list.transactions.push(transaction(ConsensusCall::InitialTerm(term)));
            return Ok(list);
        }

        let current = self.current_round()?;

        if self.is_round_over(&current, extra.timestamp) {
            if self.can_change_term(&current, extra) {
                let term = match &extra.new_term {
                    Some(term) => term.clone(),
                    None => self.generate_next_term(extra.timestamp)?,
                };
                let term_number = self.state.current_term_number();
                let last_round_number = current.round_number;

                list.transactions.push(transaction(ConsensusCall::NextTerm(term)));
                list.transactions.push(transaction(ConsensusCall::SnapshotForMiners {
                    term_number,
                    last_round_number,
                }));
                list.transactions.push(transaction(ConsensusCall::SnapshotForTerm {
                    term_number,
                    last_round_number,
                }));
                list.transactions.push(transaction(ConsensusCall::SendDividends {
                    term_number,
                    last_round_number,
                }));
            } else {
                let forwarding = match &extra.forwarding {
                    Some(forwarding) => forwarding.clone(),
                    None => self.generate_forwarding(extra.timestamp)?,
                };
                list.transactions.push(transaction(ConsensusCall::NextRound(forwarding)));

                // After the transition the ending round becomes the previous one
                if let Some(in_value) = extra.in_value {
                    list.transactions.push(transaction(ConsensusCall::BroadcastInValue(ToBroadcast {
                        round_id: current.round_id(),
                        in_value,
                    })));
                }
            }
            debug!("generated {:?}", list.method_names());
            return Ok(list);
        }

        let package = match self.slot_commitment(&current, extra) {
            Ok((out_value, signature)) => Some(ToPackage {
                round_id: current.round_id(),
                out_value,
                signature,
            }),
            Err(_) => None,
        };

        match (package, self.state.previous_round()) {
            // Nothing to reveal during the first round
            (Some(package), None) => {
                list.transactions.push(transaction(ConsensusCall::PackageOutValue(package)));
            }
            (Some(package), Some(previous)) => {
                if let Some(in_value) = extra.in_value {
                    list.transactions.push(transaction(ConsensusCall::PackageOutValue(package)));
                    list.transactions.push(transaction(ConsensusCall::BroadcastInValue(ToBroadcast {
                        round_id: previous.round_id(),
                        in_value,
                    })));
                }
            }
            (None, _) => {}
        }

        debug!("generated {:?}", list.method_names());
        Ok(list)
    }

    fn current_round(&self) -> ConsensusResult<Round> {
        let round_number = self.state.current_round_number();
        self.state
            .current_round()
            .ok_or(ConsensusError::RoundNotFound(round_number))
    }

    fn is_round_over(&self, round: &Round, timestamp: DateTime<Utc>) -> bool {
        round.all_out_values_filled() || RoundClock::new(self.config).is_time_overflowed(round, timestamp)
    }

    /// A term cannot end on its opening round, whose successor is already stored
    fn can_change_term(&self, round: &Round, extra: &DPoSExtraInformation) -> bool {
        extra.change_term && self.state.round(round.round_number + 1).is_none()
    }

    /// Out value and signature of the caller's slot
    fn slot_commitment(
        &self,
        round: &Round,
        extra: &DPoSExtraInformation,
    ) -> ConsensusResult<(Hash, Hash)> {
        let out_value = extra
            .out_value
            .or_else(|| extra.current_in_value.map(|in_value| Hash::of(&in_value)))
            .ok_or_else(|| ConsensusError::OutValueMissing(extra.public_key.to_string()))?;

        let signature = match (self.state.previous_round(), extra.current_in_value) {
            (Some(previous), Some(in_value)) => previous.calculate_signature(&in_value),
            _ => round
                .miner(&extra.public_key)
                .and_then(|m| m.signature)
                .unwrap_or_else(|| {
                    Hash::from_two_hashes(&out_value, &Hash::from_string(extra.public_key.as_str()))
                }),
        };

        Ok((out_value, signature))
    }

    fn generate_first_term(&self, extra: &DPoSExtraInformation) -> Term {
        Miners::new(1, extra.initial_miners.clone()).generate_new_term(
            self.config.mining_interval_milliseconds,
            self.config.initial_waiting_milliseconds,
            0,
            extra.timestamp,
            extra.chain_id,
        )
    }

    /// Opening rounds of the following term, filled with the elected miners
    pub fn generate_next_term(&self, timestamp: DateTime<Utc>) -> ConsensusResult<Term> {
        let term_number = self.state.current_term_number() + 1;
        let miners = Miners::new(term_number, elected_miners(self.state, self.config));
        Ok(miners.generate_new_term(
            self.config.mining_interval_milliseconds,
            0,
            self.state.current_round_number(),
            timestamp,
            self.state.chain_id().unwrap_or_default(),
        ))
    }

    /// Supplemented current round plus the generated next round
    pub fn generate_forwarding(&self, timestamp: DateTime<Utc>) -> ConsensusResult<Forwarding> {
        let current = self.current_round()?;
        let current_age = self.blockchain_age(timestamp);

        let supplemented = match self.state.previous_round() {
            Some(previous) => current.supplement(&previous),
            None => current.supplement_for_first_round(),
        };

        // The opening round of a term already has its successor stored
        if self.state.round(current.round_number + 1).is_some() {
            return Ok(Forwarding {
                current_age,
                current_round: supplemented,
                next_round: None,
            });
        }

        let next_round =
            supplemented.generate_next_round(self.config.mining_interval_milliseconds, timestamp);

        Ok(Forwarding {
            current_age,
            current_round: supplemented,
            next_round: Some(next_round),
        })
    }

    /// Days since chain start, counting from 1
    fn blockchain_age(&self, timestamp: DateTime<Utc>) -> u64 {
        match self.state.blockchain_start_timestamp() {
            Some(start) => (timestamp - start).num_days().max(0) as u64 + 1,
            None => self.state.blockchain_age(),
        }
    }
}
