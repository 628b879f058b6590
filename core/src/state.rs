//! Consensus state accessor
//!
//! [`ConsensusState`] is the typed key/value surface the consensus contract
//! reads and writes. Implementors only provide the raw getters and setters;
//! the `try_*` methods layer the append-only rules on top.
//!
//! [`MemoryState`] is the plain in-memory document. [`StagedState`] buffers
//! writes over another state and applies them on [`StagedState::commit`], so
//! a failing transaction leaves the underlying state untouched.

use crate::hash::MinerId;
use crate::history::{CandidateInHistory, TermSnapshot, Tickets};
use crate::round::Round;
use crate::term::Miners;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub trait ConsensusState {
    fn chain_id(&self) -> Option<i32>;
    fn set_chain_id(&mut self, chain_id: i32);

    /// Zero until the first term has been initialised
    fn current_round_number(&self) -> u64;
    fn set_current_round_number(&mut self, round_number: u64);

    fn current_term_number(&self) -> u64;
    fn set_current_term_number(&mut self, term_number: u64);

    fn blockchain_age(&self) -> u64;
    fn set_blockchain_age(&mut self, age: u64);

    fn blockchain_start_timestamp(&self) -> Option<DateTime<Utc>>;
    fn set_blockchain_start_timestamp(&mut self, timestamp: DateTime<Utc>);

    fn round(&self, round_number: u64) -> Option<Round>;
    fn put_round(&mut self, round: Round);

    fn miners(&self, term_number: u64) -> Option<Miners>;
    fn put_miners(&mut self, miners: Miners);

    fn term_first_round(&self, term_number: u64) -> Option<u64>;
    fn put_term_first_round(&mut self, term_number: u64, round_number: u64);

    fn history(&self, miner: &MinerId) -> Option<CandidateInHistory>;
    fn put_history(&mut self, history: CandidateInHistory);

    fn snapshot(&self, term_number: u64) -> Option<TermSnapshot>;
    fn put_snapshot(&mut self, snapshot: TermSnapshot);

    fn tickets(&self, miner: &MinerId) -> Option<Tickets>;
    fn put_tickets(&mut self, tickets: Tickets);

    /// Every public key that has ever obtained tickets
    fn candidates(&self) -> Vec<MinerId>;

    fn alias(&self, miner: &MinerId) -> Option<String>;
    fn miner_by_alias(&self, alias: &str) -> Option<MinerId>;
    fn put_alias(&mut self, miner: MinerId, alias: String);

    fn dividends_sent(&self, term_number: u64) -> bool;
    fn mark_dividends_sent(&mut self, term_number: u64);

    fn try_add_round(&mut self, round: Round) -> bool {
        if self.round(round.round_number).is_some() {
            return false;
        }
        self.put_round(round);
        true
    }

    fn try_update_round(&mut self, round: Round) -> bool {
        if self.round(round.round_number).is_none() {
            return false;
        }
        self.put_round(round);
        true
    }

    /// Round numbers start at 1 and only ever advance by one
    fn try_update_round_number(&mut self, round_number: u64) -> bool {
        if self.current_round_number() + 1 != round_number {
            return false;
        }
        self.set_current_round_number(round_number);
        true
    }

    fn try_update_term_number(&mut self, term_number: u64) -> bool {
        if self.current_term_number() + 1 != term_number {
            return false;
        }
        self.set_current_term_number(term_number);
        true
    }

    fn set_miners(&mut self, miners: Miners, replace: bool) -> bool {
        if !replace && self.miners(miners.term_number).is_some() {
            return false;
        }
        self.put_miners(miners);
        true
    }

    fn set_snapshot(&mut self, snapshot: TermSnapshot) -> bool {
        if self.snapshot(snapshot.term_number).is_some() {
            return false;
        }
        self.put_snapshot(snapshot);
        true
    }

    fn add_term_first_round(&mut self, term_number: u64, round_number: u64) -> bool {
        if self.term_first_round(term_number).is_some() {
            return false;
        }
        self.put_term_first_round(term_number, round_number);
        true
    }

    fn current_round(&self) -> Option<Round> {
        match self.current_round_number() {
            0 => None,
            n => self.round(n),
        }
    }

    fn previous_round(&self) -> Option<Round> {
        match self.current_round_number() {
            0 | 1 => None,
            n => self.round(n - 1),
        }
    }

    fn current_miners(&self) -> Option<Miners> {
        self.miners(self.current_term_number())
    }

    fn is_miner(&self, miner: &MinerId) -> bool {
        self.current_miners()
            .map(|m| m.contains(miner))
            .unwrap_or(false)
    }

    /// Top `producer_number` candidates by obtained tickets, ties broken by key
    fn victories(&self, producer_number: usize) -> Vec<MinerId> {
        let mut ranked: Vec<Tickets> = self
            .candidates()
            .iter()
            .filter_map(|c| self.tickets(c))
            .collect();
        ranked.sort_by(|a, b| {
            b.obtained_tickets
                .cmp(&a.obtained_tickets)
                .then_with(|| a.public_key.cmp(&b.public_key))
        });
        ranked
            .into_iter()
            .take(producer_number)
            .map(|t| t.public_key)
            .collect()
    }

    /// Candidates outside the active miner set
    fn backups(&self, current: &Miners) -> Vec<MinerId> {
        self.candidates()
            .into_iter()
            .filter(|c| !current.contains(c))
            .collect()
    }
}

/// In-memory consensus state document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    pub chain_id: Option<i32>,
    pub current_round_number: u64,
    pub current_term_number: u64,
    pub blockchain_age: u64,
    pub blockchain_start_timestamp: Option<DateTime<Utc>>,
    pub rounds: BTreeMap<u64, Round>,
    pub miners: BTreeMap<u64, Miners>,
    pub term_first_rounds: BTreeMap<u64, u64>,
    pub histories: BTreeMap<MinerId, CandidateInHistory>,
    pub snapshots: BTreeMap<u64, TermSnapshot>,
    pub tickets: BTreeMap<MinerId, Tickets>,
    pub aliases: BTreeMap<MinerId, String>,
    pub dividends_sent: BTreeSet<u64>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsensusState for MemoryState {
    fn chain_id(&self) -> Option<i32> {
        self.chain_id
    }

    fn set_chain_id(&mut self, chain_id: i32) {
        self.chain_id = Some(chain_id);
    }

    fn current_round_number(&self) -> u64 {
        self.current_round_number
    }

    fn set_current_round_number(&mut self, round_number: u64) {
        self.current_round_number = round_number;
    }

    fn current_term_number(&self) -> u64 {
        self.current_term_number
    }

    fn set_current_term_number(&mut self, term_number: u64) {
        self.current_term_number = term_number;
    }

    fn blockchain_age(&self) -> u64 {
        self.blockchain_age
    }

    fn set_blockchain_age(&mut self, age: u64) {
        self.blockchain_age = age;
    }

    fn blockchain_start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.blockchain_start_timestamp
    }

    fn set_blockchain_start_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.blockchain_start_timestamp = Some(timestamp);
    }

    fn round(&self, round_number: u64) -> Option<Round> {
        self.rounds.get(&round_number).cloned()
    }

    fn put_round(&mut self, round: Round) {
        self.rounds.insert(round.round_number, round);
    }

    fn miners(&self, term_number: u64) -> Option<Miners> {
        self.miners.get(&term_number).cloned()
    }

    fn put_miners(&mut self, miners: Miners) {
        self.miners.insert(miners.term_number, miners);
    }

    fn term_first_round(&self, term_number: u64) -> Option<u64> {
        self.term_first_rounds.get(&term_number).copied()
    }

    fn put_term_first_round(&mut self, term_number: u64, round_number: u64) {
        self.term_first_rounds.insert(term_number, round_number);
    }

    fn history(&self, miner: &MinerId) -> Option<CandidateInHistory> {
        self.histories.get(miner).cloned()
    }

    fn put_history(&mut self, history: CandidateInHistory) {
        self.histories.insert(history.public_key.clone(), history);
    }

    fn snapshot(&self, term_number: u64) -> Option<TermSnapshot> {
        self.snapshots.get(&term_number).cloned()
    }

    fn put_snapshot(&mut self, snapshot: TermSnapshot) {
        self.snapshots.insert(snapshot.term_number, snapshot);
    }

    fn tickets(&self, miner: &MinerId) -> Option<Tickets> {
        self.tickets.get(miner).cloned()
    }

    fn put_tickets(&mut self, tickets: Tickets) {
        self.tickets.insert(tickets.public_key.clone(), tickets);
    }

    fn candidates(&self) -> Vec<MinerId> {
        self.tickets.keys().cloned().collect()
    }

    fn alias(&self, miner: &MinerId) -> Option<String> {
        self.aliases.get(miner).cloned()
    }

    fn miner_by_alias(&self, alias: &str) -> Option<MinerId> {
        self.aliases
            .iter()
            .find(|(_, a)| a.as_str() == alias)
            .map(|(k, _)| k.clone())
    }

    fn put_alias(&mut self, miner: MinerId, alias: String) {
        self.aliases.insert(miner, alias);
    }

    fn dividends_sent(&self, term_number: u64) -> bool {
        self.dividends_sent.contains(&term_number)
    }

    fn mark_dividends_sent(&mut self, term_number: u64) {
        self.dividends_sent.insert(term_number);
    }
}

/// Write buffer over another state
///
/// Reads see buffered writes first. Dropping the overlay discards them.
pub struct StagedState<'a, S: ConsensusState> {
    base: &'a mut S,
    changes: MemoryState,
    touched: Touched,
}

#[derive(Default)]
struct Touched {
    chain_id: bool,
    round_number: bool,
    term_number: bool,
    age: bool,
    start_timestamp: bool,
}

impl<'a, S: ConsensusState> StagedState<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            changes: MemoryState::default(),
            touched: Touched::default(),
        }
    }

    /// Apply every buffered write to the underlying state
    pub fn commit(self) {
        let StagedState {
            base,
            changes,
            touched,
        } = self;

        if touched.chain_id {
            if let Some(chain_id) = changes.chain_id {
                base.set_chain_id(chain_id);
            }
        }
        if touched.round_number {
            base.set_current_round_number(changes.current_round_number);
        }
        if touched.term_number {
            base.set_current_term_number(changes.current_term_number);
        }
        if touched.age {
            base.set_blockchain_age(changes.blockchain_age);
        }
        if touched.start_timestamp {
            if let Some(timestamp) = changes.blockchain_start_timestamp {
                base.set_blockchain_start_timestamp(timestamp);
            }
        }
        for round in changes.rounds.into_values() {
            base.put_round(round);
        }
        for miners in changes.miners.into_values() {
            base.put_miners(miners);
        }
        for (term, round) in changes.term_first_rounds {
            base.put_term_first_round(term, round);
        }
        for history in changes.histories.into_values() {
            base.put_history(history);
        }
        for snapshot in changes.snapshots.into_values() {
            base.put_snapshot(snapshot);
        }
        for tickets in changes.tickets.into_values() {
            base.put_tickets(tickets);
        }
        for (miner, alias) in changes.aliases {
            base.put_alias(miner, alias);
        }
        for term in changes.dividends_sent {
            base.mark_dividends_sent(term);
        }
    }
}

impl<S: ConsensusState> ConsensusState for StagedState<'_, S> {
    fn chain_id(&self) -> Option<i32> {
        if self.touched.chain_id {
            self.changes.chain_id
        } else {
            self.base.chain_id()
        }
    }

    fn set_chain_id(&mut self, chain_id: i32) {
        self.touched.chain_id = true;
        self.changes.chain_id = Some(chain_id);
    }

    fn current_round_number(&self) -> u64 {
        if self.touched.round_number {
            self.changes.current_round_number
        } else {
            self.base.current_round_number()
        }
    }

    fn set_current_round_number(&mut self, round_number: u64) {
        self.touched.round_number = true;
        self.changes.current_round_number = round_number;
    }

    fn current_term_number(&self) -> u64 {
        if self.touched.term_number {
            self.changes.current_term_number
        } else {
            self.base.current_term_number()
        }
    }

    fn set_current_term_number(&mut self, term_number: u64) {
        self.touched.term_number = true;
        self.changes.current_term_number = term_number;
    }

    fn blockchain_age(&self) -> u64 {
        if self.touched.age {
            self.changes.blockchain_age
        } else {
            self.base.blockchain_age()
        }
    }

    fn set_blockchain_age(&mut self, age: u64) {
        self.touched.age = true;
        self.changes.blockchain_age = age;
    }

    fn blockchain_start_timestamp(&self) -> Option<DateTime<Utc>> {
        if self.touched.start_timestamp {
            self.changes.blockchain_start_timestamp
        } else {
            self.base.blockchain_start_timestamp()
        }
    }

    fn set_blockchain_start_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.touched.start_timestamp = true;
        self.changes.blockchain_start_timestamp = Some(timestamp);
    }

    fn round(&self, round_number: u64) -> Option<Round> {
        self.changes
            .round(round_number)
            .or_else(|| self.base.round(round_number))
    }

    fn put_round(&mut self, round: Round) {
        self.changes.put_round(round);
    }

    fn miners(&self, term_number: u64) -> Option<Miners> {
        self.changes
            .miners(term_number)
            .or_else(|| self.base.miners(term_number))
    }

    fn put_miners(&mut self, miners: Miners) {
        self.changes.put_miners(miners);
    }

    fn term_first_round(&self, term_number: u64) -> Option<u64> {
        self.changes
            .term_first_round(term_number)
            .or_else(|| self.base.term_first_round(term_number))
    }

    fn put_term_first_round(&mut self, term_number: u64, round_number: u64) {
        self.changes.put_term_first_round(term_number, round_number);
    }

    fn history(&self, miner: &MinerId) -> Option<CandidateInHistory> {
        self.changes
            .history(miner)
            .or_else(|| self.base.history(miner))
    }

    fn put_history(&mut self, history: CandidateInHistory) {
        self.changes.put_history(history);
    }

    fn snapshot(&self, term_number: u64) -> Option<TermSnapshot> {
        self.changes
            .snapshot(term_number)
            .or_else(|| self.base.snapshot(term_number))
    }

    fn put_snapshot(&mut self, snapshot: TermSnapshot) {
        self.changes.put_snapshot(snapshot);
    }

    fn tickets(&self, miner: &MinerId) -> Option<Tickets> {
        self.changes
            .tickets(miner)
            .or_else(|| self.base.tickets(miner))
    }

    fn put_tickets(&mut self, tickets: Tickets) {
        self.changes.put_tickets(tickets);
    }

    fn candidates(&self) -> Vec<MinerId> {
        let mut all: BTreeSet<MinerId> = self.base.candidates().into_iter().collect();
        all.extend(self.changes.candidates());
        all.into_iter().collect()
    }

    fn alias(&self, miner: &MinerId) -> Option<String> {
        self.changes
            .alias(miner)
            .or_else(|| self.base.alias(miner))
    }

    fn miner_by_alias(&self, alias: &str) -> Option<MinerId> {
        if let Some(miner) = self.changes.miner_by_alias(alias) {
            return Some(miner);
        }
        // An overlay rename hides the old alias of that key
        self.base
            .miner_by_alias(alias)
            .filter(|miner| !self.changes.aliases.contains_key(miner))
    }

    fn put_alias(&mut self, miner: MinerId, alias: String) {
        self.changes.put_alias(miner, alias);
    }

    fn dividends_sent(&self, term_number: u64) -> bool {
        self.changes.dividends_sent(term_number) || self.base.dividends_sent(term_number)
    }

    fn mark_dividends_sent(&mut self, term_number: u64) {
        self.changes.mark_dividends_sent(term_number);
    }
}
