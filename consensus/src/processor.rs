//! Round processor
//!
//! The authoritative consensus state machine. Every system transaction is
//! executed here against a [`ConsensusState`]:
//!
//! ```text
//! Uninitialized --InitialTerm--> RoundOpen --PackageOutValue/BroadcastInValue--> RoundOpen
//!                                RoundOpen --NextRound--> RoundOpen
//!                                RoundOpen --NextTerm (+ snapshots, dividends)--> RoundOpen
//! ```
//!
//! Hard failures are returned as [`Outcome::Abort`] and the caller must drop
//! all writes made by the transaction. End-of-term bookkeeping reports
//! repeats as [`Outcome::SoftFail`] without writing anything.

use crate::commit_reveal::verify_reveal;
use crate::collaborators::InlineCall;
use crate::config::ConsensusConfig;
use crate::errors::{ConsensusError, ConsensusResult, Outcome};
use crate::irreversible::find_irreversible_offset;
use chrono::{DateTime, Utc};
use dpos_core::{
    CandidateInHistory, CandidateInTerm, ConsensusCall, ConsensusState, Forwarding, MinerId, Miners,
    Round, Term, TermSnapshot, ToBroadcast, ToPackage,
};
use dpos_economics::IncentiveCalculator;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata of the transaction being executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Public key recovered from the transaction signature
    pub sender: MinerId,
    pub timestamp: DateTime<Utc>,
    pub block_height: u64,
}

impl ExecutionContext {
    pub fn new(sender: MinerId, timestamp: DateTime<Utc>, block_height: u64) -> Self {
        Self {
            sender,
            timestamp,
            block_height,
        }
    }
}

/// Facts emitted by a successful transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    RoundStarted { round_number: u64 },
    TermStarted { term_number: u64, first_round_number: u64 },
    /// Blocks older than `offset` blocks back from the current one are final
    IrreversibleBlockFound { offset: u64 },
}

pub struct RoundProcessor<'a, S: ConsensusState> {
    state: &'a mut S,
    config: &'a ConsensusConfig,
    context: &'a ExecutionContext,
    inline_calls: Vec<InlineCall>,
    events: Vec<ConsensusEvent>,
}

impl<'a, S: ConsensusState> RoundProcessor<'a, S> {
    pub fn new(state: &'a mut S, config: &'a ConsensusConfig, context: &'a ExecutionContext) -> Self {
        Self {
            state,
            config,
            context,
            inline_calls: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Calls to collaborators recorded so far
    pub fn inline_calls(&self) -> &[InlineCall] {
        &self.inline_calls
    }

    pub fn into_effects(self) -> (Vec<InlineCall>, Vec<ConsensusEvent>) {
        (self.inline_calls, self.events)
    }

    pub fn execute(&mut self, call: &ConsensusCall) -> Outcome<()> {
        debug!(
            "executing {} from {}",
            call.method_name(),
            self.context.sender.short(10)
        );
        let outcome = match call {
            ConsensusCall::InitialTerm(term) => self.initial_term(term).into(),
            ConsensusCall::NextTerm(term) => self.next_term(term).into(),
            ConsensusCall::NextRound(forwarding) => self.next_round(forwarding).into(),
            ConsensusCall::PackageOutValue(to_package) => self.package_out_value(to_package).into(),
            ConsensusCall::BroadcastInValue(to_broadcast) => self.broadcast_in_value(to_broadcast).into(),
            ConsensusCall::SnapshotForTerm {
                term_number,
                last_round_number,
            } => self.snapshot_for_term(*term_number, *last_round_number),
            ConsensusCall::SnapshotForMiners {
                term_number,
                last_round_number,
            } => self.snapshot_for_miners(*term_number, *last_round_number),
            ConsensusCall::SendDividends {
                term_number,
                last_round_number,
            } => self.send_dividends(*term_number, *last_round_number),
        };

        match &outcome {
            Outcome::Ok(()) => {}
            Outcome::SoftFail(message) => warn!("{} skipped: {}", call.method_name(), message),
            Outcome::Abort(error) => warn!("{} aborted: {}", call.method_name(), error),
        }
        outcome
    }

    pub fn initial_term(&mut self, term: &Term) -> ConsensusResult<()> {
        if self.state.current_round_number() != 0 {
            return Err(ConsensusError::AlreadyInitialized);
        }

        self.state.set_chain_id(term.chain_id);
        self.state.set_blockchain_start_timestamp(term.timestamp);
        self.advance_term_number(1)?;
        self.advance_round_number(1)?;
        self.state.set_blockchain_age(1);

        let miners = Miners::new(1, term.miners.public_keys.clone());
        if !self.state.set_miners(miners, false) {
            return Err(ConsensusError::MinersAlreadySet(1));
        }
        self.state.add_term_first_round(1, 1);

        let mut first_round = term.first_round.clone();
        let mut second_round = term.second_round.clone();
        for round in [&mut first_round, &mut second_round] {
            round.term_number = 1;
            round.blockchain_age = 1;
        }

        for (index, miner) in first_round.ordered_miners().into_iter().enumerate() {
            let alias = self.config.alias_for(index, &miner.public_key);
            self.state.put_alias(miner.public_key.clone(), alias.clone());
            if self.state.history(&miner.public_key).is_none() {
                self.state
                    .put_history(CandidateInHistory::with_alias(miner.public_key.clone(), alias));
            }
        }

        // The genesis block itself counts for its producer
        let sender = self.context.sender.clone();
        match first_round.miner_mut(&sender) {
            Some(miner) => miner.produced_blocks += 1,
            None => {
                let mut history = self.history_or_new(&sender);
                history.produced_blocks += 1;
                self.state.put_history(history);
            }
        }

        self.add_round(first_round)?;
        self.add_round(second_round)?;

        let token = &self.config.token;
        self.inline_calls.push(InlineCall::InitializeToken {
            symbol: token.symbol.clone(),
            name: token.name.clone(),
            total_supply: token.total_supply,
            decimals: token.decimals,
            issuer: sender.address(),
        });
        self.events.push(ConsensusEvent::TermStarted {
            term_number: 1,
            first_round_number: 1,
        });

        info!(
            "initial term started with {} miners, chain id {}",
            term.miners.len(),
            term.chain_id
        );
        Ok(())
    }

    pub fn next_term(&mut self, term: &Term) -> ConsensusResult<()> {
        let mut current = self.current_round()?;
        let ending_term = self.state.current_term_number();

        count_missed_time_slots(&mut current);
        self.update_round(current.clone())?;
        self.inline_calls.push(InlineCall::KeepWeights {
            term_number: ending_term,
        });

        self.advance_term_number(term.term_number)?;
        self.advance_round_number(term.first_round.round_number)?;

        let age = self.state.blockchain_age();
        let mut first_round = term.first_round.clone();
        let mut second_round = term.second_round.clone();
        for round in [&mut first_round, &mut second_round] {
            round.term_number = term.term_number;
            round.blockchain_age = age;
            for miner in round.real_time_miners_info.values_mut() {
                miner.produced_blocks = 0;
                miner.missed_time_slots = 0;
                miner.latest_missed_time_slots = 0;
                miner.is_missed = false;
            }
        }

        let miners = Miners::new(term.term_number, term.miners.public_keys.clone());
        if !self.state.set_miners(miners, false) {
            return Err(ConsensusError::MinersAlreadySet(term.term_number));
        }
        self.state
            .add_term_first_round(term.term_number, first_round.round_number);

        let first_round_number = first_round.round_number;
        self.add_round(first_round)?;
        self.add_round(second_round)?;

        self.events.push(ConsensusEvent::TermStarted {
            term_number: term.term_number,
            first_round_number,
        });
        info!(
            "term {} started at round {} with {} miners",
            term.term_number,
            first_round_number,
            term.miners.len()
        );
        Ok(())
    }

    pub fn next_round(&mut self, forwarding: &Forwarding) -> ConsensusResult<()> {
        let current = self.current_round()?;
        let supplied = &forwarding.current_round;
        if supplied.round_id() != current.round_id() {
            return Err(ConsensusError::RoundIdMismatch {
                expected: current.round_id(),
                actual: supplied.round_id(),
            });
        }

        let mut ended = current.clone();
        supply_current_round_info(&mut ended, supplied)?;
        self.update_round(ended.clone())?;

        let next_round_number = current.round_number + 1;

        if let Some(mut next) = self.state.round(next_round_number) {
            // The second round of a term is stored together with the first one
            carry_counters(&ended, &mut next);
            self.update_round(next)?;
        } else {
            let mut next = forwarding
                .next_round
                .clone()
                .ok_or(ConsensusError::RoundNotFound(next_round_number))?;
            if next.round_number != next_round_number {
                return Err(ConsensusError::RoundNumberUpdateFailed(next.round_number));
            }

            if next.miners_hash() != ended.miners_hash() {
                self.replace_miners(&next)?;
            }

            carry_counters(&ended, &mut next);
            self.fold_dropped_miners(&ended, &next);

            if current.round_number > self.config.fork_detection_round_number {
                self.recount_latest_missed(&mut next, &ended);
            }

            next.term_number = self.state.current_term_number();
            next.blockchain_age = forwarding.current_age.max(self.state.blockchain_age());
            self.add_round(next)?;
        }

        self.advance_round_number(next_round_number)?;
        if forwarding.current_age > self.state.blockchain_age() {
            self.state.set_blockchain_age(forwarding.current_age);
        }

        self.events.push(ConsensusEvent::RoundStarted {
            round_number: next_round_number,
        });
        info!("round {} started", next_round_number);

        let next = self.current_round()?;
        self.detect_irreversible(&next, Some(&ended));
        Ok(())
    }

    pub fn package_out_value(&mut self, to_package: &ToPackage) -> ConsensusResult<()> {
        let mut current = self.current_round()?;
        if to_package.round_id != current.round_id() {
            return Err(ConsensusError::RoundIdMismatch {
                expected: current.round_id(),
                actual: to_package.round_id,
            });
        }

        let context = self.context;
        let sender = &context.sender;
        let is_first_round = current.round_number == 1;
        let miner = current
            .miner_mut(sender)
            .ok_or_else(|| ConsensusError::NotAMiner(sender.to_string()))?;
        if miner.out_value.is_some() {
            return Err(ConsensusError::OutValueAlreadyFilled(sender.to_string()));
        }

        miner.out_value = Some(to_package.out_value);
        // First round signatures are seeded at term generation
        if !is_first_round || miner.signature.is_none() {
            miner.signature = Some(to_package.signature);
        }
        miner.produced_blocks += 1;

        debug!(
            "{} packaged out value in round {}",
            sender.short(10),
            current.round_number
        );
        self.update_round(current.clone())?;

        let previous = self.state.previous_round();
        self.detect_irreversible(&current, previous.as_ref());
        Ok(())
    }

    pub fn broadcast_in_value(&mut self, to_broadcast: &ToBroadcast) -> ConsensusResult<()> {
        let mut previous = match self.state.previous_round() {
            Some(previous) if previous.round_id() == to_broadcast.round_id => previous,
            Some(_) => {
                warn!(
                    "ignoring stale in value from {} for round id {}",
                    self.context.sender.short(10),
                    to_broadcast.round_id
                );
                return Ok(());
            }
            None => {
                let current = self.current_round()?;
                return Err(ConsensusError::RoundNotFound(current.round_number - 1));
            }
        };

        let context = self.context;
        let sender = &context.sender;
        let miner = previous
            .miner_mut(sender)
            .ok_or_else(|| ConsensusError::NotAMiner(sender.to_string()))?;
        let out_value = miner
            .out_value
            .ok_or_else(|| ConsensusError::OutValueMissing(sender.to_string()))?;
        if miner.signature.is_none() {
            return Err(ConsensusError::SignatureMissing(sender.to_string()));
        }
        if !verify_reveal(&out_value, &to_broadcast.in_value) {
            return Err(ConsensusError::InvalidReveal(sender.to_string()));
        }

        miner.in_value = Some(to_broadcast.in_value);
        self.update_round(previous)
    }

    pub fn snapshot_for_term(&mut self, term_number: u64, last_round_number: u64) -> Outcome<()> {
        if self.state.snapshot(term_number).is_some() {
            return Outcome::SoftFail(format!("Already took snapshot of term {}", term_number));
        }
        let round = match self.state.round(last_round_number) {
            Some(round) => round,
            None => {
                return Outcome::SoftFail(format!(
                    "Round information not found: {}",
                    last_round_number
                ))
            }
        };

        let mut keys: BTreeSet<MinerId> = self.state.candidates().into_iter().collect();
        keys.extend(round.real_time_miners_info.keys().cloned());
        let candidates_snapshot = keys
            .into_iter()
            .map(|public_key| CandidateInTerm {
                votes: self
                    .state
                    .tickets(&public_key)
                    .map(|t| t.obtained_tickets)
                    .unwrap_or(0),
                public_key,
            })
            .collect();

        let snapshot = TermSnapshot {
            term_number,
            end_round_number: last_round_number,
            total_blocks: round.mined_blocks(),
            candidates_snapshot,
        };
        info!(
            "snapshot of term {}: {} blocks until round {}",
            term_number, snapshot.total_blocks, last_round_number
        );
        self.state.set_snapshot(snapshot);
        Outcome::Ok(())
    }

    pub fn snapshot_for_miners(&mut self, term_number: u64, last_round_number: u64) -> Outcome<()> {
        let round = match self.state.round(last_round_number) {
            Some(round) => round,
            None => {
                return Outcome::SoftFail(format!(
                    "Round information not found: {}",
                    last_round_number
                ))
            }
        };

        let already = round.real_time_miners_info.keys().any(|key| {
            self.state
                .history(key)
                .map(|h| h.served_in(term_number))
                .unwrap_or(false)
        });
        if already {
            return Outcome::SoftFail(format!(
                "Already took snapshot of miners of term {}",
                term_number
            ));
        }

        for miner in round.real_time_miners_info.values() {
            let mut history = self.history_or_new(&miner.public_key);
            history.produced_blocks += miner.produced_blocks;
            history.missed_time_slots += miner.missed_time_slots;
            history.continual_appointment_count = if term_number > 1 && history.served_in(term_number - 1) {
                history.continual_appointment_count + 1
            } else {
                0
            };
            history.reappointment_count += 1;
            history.terms.insert(term_number);
            self.state.put_history(history);
        }

        info!(
            "folded counters of {} miners into history for term {}",
            round.miner_count(),
            term_number
        );
        Outcome::Ok(())
    }

    pub fn send_dividends(&mut self, term_number: u64, last_round_number: u64) -> Outcome<()> {
        if self.state.dividends_sent(term_number) {
            return Outcome::SoftFail(format!("Dividends of term {} already sent", term_number));
        }
        let round = match self.state.round(last_round_number) {
            Some(round) => round,
            None => {
                return Outcome::SoftFail(format!(
                    "Round information not found: {}",
                    last_round_number
                ))
            }
        };

        let calculator = IncentiveCalculator::new(self.config.incentives);
        let mined_blocks = round.mined_blocks();

        self.inline_calls.push(InlineCall::AddDividends {
            term_number,
            amount: calculator.voters_dividends(mined_blocks),
        });

        let miners = round.miners();
        let tickets = |key: &MinerId| {
            self.state
                .tickets(key)
                .map(|t| t.obtained_tickets)
                .unwrap_or(0)
        };
        let continual = |key: &MinerId| {
            self.state
                .history(key)
                .map(|h| h.continual_appointment_count)
                .unwrap_or(0)
        };
        let total_tickets: u64 = miners.public_keys.iter().map(&tickets).sum();
        let total_continual: u64 = miners.public_keys.iter().map(&continual).sum();

        let mut payments = Vec::new();
        for key in &miners.public_keys {
            let amount = calculator.miner_reward(
                mined_blocks,
                miners.len(),
                tickets(key),
                total_tickets,
                continual(key),
                total_continual,
            );
            payments.push((key.address(), amount));
        }

        let backups = self.state.backups(&miners);
        let backup_amount = calculator.backup_node_reward(mined_blocks, backups.len());
        for key in &backups {
            payments.push((key.address(), backup_amount));
        }

        for (to, amount) in payments.into_iter().filter(|(_, amount)| *amount > 0) {
            self.inline_calls.push(InlineCall::SendDividends { to, amount });
        }

        self.state.mark_dividends_sent(term_number);
        info!(
            "dividends of term {} sent for {} mined blocks",
            term_number, mined_blocks
        );
        Outcome::Ok(())
    }

    fn current_round(&self) -> ConsensusResult<Round> {
        let round_number = self.state.current_round_number();
        if round_number == 0 {
            return Err(ConsensusError::NotInitialized);
        }
        self.state
            .current_round()
            .ok_or(ConsensusError::RoundNotFound(round_number))
    }

    fn add_round(&mut self, round: Round) -> ConsensusResult<()> {
        let round_number = round.round_number;
        if self.state.try_add_round(round) {
            Ok(())
        } else {
            Err(ConsensusError::RoundAddFailed(round_number))
        }
    }

    fn update_round(&mut self, round: Round) -> ConsensusResult<()> {
        let round_number = round.round_number;
        if self.state.try_update_round(round) {
            Ok(())
        } else {
            Err(ConsensusError::RoundUpdateFailed(round_number))
        }
    }

    fn advance_round_number(&mut self, round_number: u64) -> ConsensusResult<()> {
        if self.state.try_update_round_number(round_number) {
            Ok(())
        } else {
            Err(ConsensusError::RoundNumberUpdateFailed(round_number))
        }
    }

    fn advance_term_number(&mut self, term_number: u64) -> ConsensusResult<()> {
        if self.state.try_update_term_number(term_number) {
            Ok(())
        } else {
            Err(ConsensusError::TermNumberUpdateFailed(term_number))
        }
    }

    fn history_or_new(&self, key: &MinerId) -> CandidateInHistory {
        self.state.history(key).unwrap_or_else(|| {
            let alias = self
                .state
                .alias(key)
                .unwrap_or_else(|| key.short(self.config.alias_limit));
            CandidateInHistory::with_alias(key.clone(), alias)
        })
    }

    /// Swap the current term's miner set for the one of the forwarded round
    fn replace_miners(&mut self, next: &Round) -> ConsensusResult<()> {
        if next.miner_count() != self.config.producer_number {
            return Err(ConsensusError::MinersMismatch {
                expected: self.config.producer_number,
                actual: next.miner_count(),
            });
        }

        let term_number = self.state.current_term_number();
        let mut miners = next.miners();
        miners.term_number = term_number;
        self.state.set_miners(miners, true);
        info!(
            "miners of term {} replaced in round {}",
            term_number, next.round_number
        );
        Ok(())
    }

    /// Miners leaving the set keep their counters in history
    fn fold_dropped_miners(&mut self, ended: &Round, next: &Round) {
        for miner in ended
            .real_time_miners_info
            .values()
            .filter(|m| !next.contains(&m.public_key))
        {
            let mut history = self.history_or_new(&miner.public_key);
            history.produced_blocks += miner.produced_blocks;
            history.missed_time_slots += miner.missed_time_slots;
            self.state.put_history(history);
        }
    }

    /// Consecutive misses inside the fork detection window, ending with `ended`
    fn recount_latest_missed(&self, next: &mut Round, ended: &Round) {
        let window = self.config.fork_detection_round_number;
        let first = ended
            .round_number
            .saturating_sub(window.saturating_sub(1))
            .max(1);
        let mut rounds: Vec<Round> = (first..ended.round_number)
            .filter_map(|n| self.state.round(n))
            .collect();
        rounds.push(ended.clone());

        for miner in next.real_time_miners_info.values_mut() {
            let mut streak = 0;
            for round in &rounds {
                match round.miner(&miner.public_key) {
                    Some(m) if m.is_missed => streak += 1,
                    _ => streak = 0,
                }
            }
            miner.latest_missed_time_slots = streak;
        }
    }

    fn detect_irreversible(&mut self, current: &Round, previous: Option<&Round>) {
        if let Some(offset) = find_irreversible_offset(current, previous) {
            debug!(
                "irreversible block found in round {} at offset {}",
                current.round_number, offset
            );
            self.events
                .push(ConsensusEvent::IrreversibleBlockFound { offset });
        }
    }
}

/// Charge one missed slot to every miner that never published an out value
pub fn count_missed_time_slots(round: &mut Round) {
    for miner in round
        .real_time_miners_info
        .values_mut()
        .filter(|m| m.out_value.is_none())
    {
        miner.missed_time_slots += 1;
    }
}

/// Take supplemented values for empty slots, only when they raise the missed count.
///
/// A taken slot must carry an in value that opens its out value.
fn supply_current_round_info(stored: &mut Round, supplied: &Round) -> ConsensusResult<()> {
    for miner in stored
        .real_time_miners_info
        .values_mut()
        .filter(|m| m.out_value.is_none())
    {
        let supplied = match supplied.miner(&miner.public_key) {
            Some(supplied) if supplied.missed_time_slots > miner.missed_time_slots => supplied,
            _ => continue,
        };
        match (supplied.out_value, supplied.in_value) {
            (Some(out_value), Some(in_value)) if verify_reveal(&out_value, &in_value) => {
                miner.out_value = Some(out_value);
                miner.in_value = Some(in_value);
            }
            _ => return Err(ConsensusError::InvalidReveal(miner.public_key.to_string())),
        }
        miner.signature = supplied.signature;
        miner.missed_time_slots += 1;
        miner.is_missed = true;
    }
    Ok(())
}

/// Copy cumulative counters of miners present in both rounds
fn carry_counters(from: &Round, to: &mut Round) {
    for miner in to.real_time_miners_info.values_mut() {
        if let Some(old) = from.miner(&miner.public_key) {
            miner.produced_blocks = old.produced_blocks;
            miner.missed_time_slots = old.missed_time_slots;
            miner.latest_missed_time_slots = old.latest_missed_time_slots;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dpos_core::{Hash, MinerInRound};

    fn create_test_round(filled: &[&str]) -> Round {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut round = Round::new(4, 1);
        for (i, key) in ["aa", "bb", "cc"].iter().enumerate() {
            let mut miner = MinerInRound::new(
                MinerId::new(*key),
                i as u32 + 1,
                start + chrono::Duration::milliseconds(4000 * i as i64),
            );
            if filled.contains(key) {
                miner.out_value = Some(Hash::from_string(key));
                miner.produced_blocks = 5;
            }
            round.insert(miner);
        }
        round
    }

    #[test]
    fn test_count_missed_time_slots() {
        let mut round = create_test_round(&["aa"]);
        count_missed_time_slots(&mut round);

        assert_eq!(round.miner(&MinerId::new("aa")).unwrap().missed_time_slots, 0);
        assert_eq!(round.miner(&MinerId::new("bb")).unwrap().missed_time_slots, 1);
        assert_eq!(round.miner(&MinerId::new("cc")).unwrap().missed_time_slots, 1);
    }

    #[test]
    fn test_supply_only_takes_higher_missed_counts() {
        let mut stored = create_test_round(&["aa"]);
        let mut supplied = stored.supplement_for_first_round();
        // A lagging proposer did not charge cc
        let cc = supplied.miner_mut(&MinerId::new("cc")).unwrap();
        cc.missed_time_slots = 0;
        cc.out_value = Some(Hash::from_string("bogus"));

        supply_current_round_info(&mut stored, &supplied).unwrap();

        let bb = stored.miner(&MinerId::new("bb")).unwrap();
        assert!(bb.is_missed);
        assert_eq!(bb.missed_time_slots, 1);
        assert_eq!(bb.out_value, supplied.miner(&MinerId::new("bb")).unwrap().out_value);

        let cc = stored.miner(&MinerId::new("cc")).unwrap();
        assert!(cc.out_value.is_none());
        assert_eq!(cc.missed_time_slots, 0);

        let aa = stored.miner(&MinerId::new("aa")).unwrap();
        assert_eq!(aa.out_value, Some(Hash::from_string("aa")));
    }

    #[test]
    fn test_supply_rejects_forged_in_value() {
        let mut stored = create_test_round(&["aa"]);
        let mut supplied = stored.supplement_for_first_round();
        supplied.miner_mut(&MinerId::new("bb")).unwrap().in_value = Some(Hash::from_string("forged"));

        assert!(matches!(
            supply_current_round_info(&mut stored, &supplied),
            Err(ConsensusError::InvalidReveal(_))
        ));

        let mut empty = stored.supplement_for_first_round();
        empty.miner_mut(&MinerId::new("cc")).unwrap().in_value = None;
        assert!(supply_current_round_info(&mut stored, &empty).is_err());
    }

    #[test]
    fn test_carry_counters() {
        let from = create_test_round(&["aa", "bb"]);
        let mut to = Round::new(5, 1);
        to.insert(MinerInRound::new(MinerId::new("aa"), 1, Utc::now()));
        to.insert(MinerInRound::new(MinerId::new("dd"), 2, Utc::now()));

        carry_counters(&from, &mut to);

        assert_eq!(to.miner(&MinerId::new("aa")).unwrap().produced_blocks, 5);
        assert_eq!(to.miner(&MinerId::new("dd")).unwrap().produced_blocks, 0);
    }
}
