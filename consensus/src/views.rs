//! Read-only queries over consensus state

use crate::config::ConsensusConfig;
use crate::information::elected_miners;
use dpos_core::{CandidateInHistory, ConsensusState, MinerId, Miners, Round, TermSnapshot};
use dpos_economics::IncentiveCalculator;

pub struct ConsensusViews<'a, S: ConsensusState> {
    state: &'a S,
    config: &'a ConsensusConfig,
}

impl<'a, S: ConsensusState> ConsensusViews<'a, S> {
    pub fn new(state: &'a S, config: &'a ConsensusConfig) -> Self {
        Self { state, config }
    }

    pub fn current_round_number(&self) -> u64 {
        self.state.current_round_number()
    }

    pub fn current_term_number(&self) -> u64 {
        self.state.current_term_number()
    }

    pub fn blockchain_age(&self) -> u64 {
        self.state.blockchain_age()
    }

    pub fn current_round(&self) -> Option<Round> {
        self.state.current_round()
    }

    pub fn round(&self, round_number: u64) -> Option<Round> {
        self.state.round(round_number)
    }

    pub fn current_miners(&self) -> Option<Miners> {
        self.state.current_miners()
    }

    pub fn miners_of_term(&self, term_number: u64) -> Option<Miners> {
        self.state.miners(term_number)
    }

    pub fn term_first_round(&self, term_number: u64) -> Option<u64> {
        self.state.term_first_round(term_number)
    }

    pub fn term_snapshot(&self, term_number: u64) -> Option<TermSnapshot> {
        self.state.snapshot(term_number)
    }

    pub fn candidate_history(&self, miner: &MinerId) -> Option<CandidateInHistory> {
        self.state.history(miner)
    }

    pub fn alias(&self, miner: &MinerId) -> Option<String> {
        self.state.alias(miner)
    }

    pub fn miner_by_alias(&self, alias: &str) -> Option<MinerId> {
        self.state.miner_by_alias(alias)
    }

    /// Miners that would take office if the term changed now
    pub fn current_victories(&self) -> Vec<MinerId> {
        elected_miners(self.state, self.config)
    }

    /// Tokens released so far in the current term
    pub fn current_dividends(&self) -> u64 {
        let mined = self
            .state
            .current_round()
            .map(|r| r.mined_blocks())
            .unwrap_or(0);
        IncentiveCalculator::new(self.config.incentives).total_dividends(mined)
    }

    pub fn current_dividends_for_voters(&self) -> u64 {
        let mined = self
            .state
            .current_round()
            .map(|r| r.mined_blocks())
            .unwrap_or(0);
        IncentiveCalculator::new(self.config.incentives).voters_dividends(mined)
    }
}
