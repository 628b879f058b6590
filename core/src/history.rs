//! Cumulative candidate records and per-term snapshots

use crate::hash::MinerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a candidate has accumulated across terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInHistory {
    pub public_key: MinerId,
    pub produced_blocks: u64,
    pub missed_time_slots: u64,
    pub continual_appointment_count: u64,
    pub reappointment_count: u64,
    pub current_alias: String,
    pub terms: BTreeSet<u64>,
}

impl CandidateInHistory {
    pub fn new(public_key: MinerId) -> Self {
        Self {
            public_key,
            ..Default::default()
        }
    }

    pub fn with_alias(public_key: MinerId, alias: impl Into<String>) -> Self {
        Self {
            public_key,
            current_alias: alias.into(),
            ..Default::default()
        }
    }

    pub fn served_in(&self, term_number: u64) -> bool {
        self.terms.contains(&term_number)
    }
}

/// Vote weight of one candidate at the end of a term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInTerm {
    pub public_key: MinerId,
    pub votes: u64,
}

/// Frozen summary of a finished term. Written once per term number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSnapshot {
    pub term_number: u64,
    pub end_round_number: u64,
    pub total_blocks: u64,
    pub candidates_snapshot: Vec<CandidateInTerm>,
}

impl TermSnapshot {
    pub fn votes_of(&self, miner: &MinerId) -> u64 {
        self.candidates_snapshot
            .iter()
            .find(|c| &c.public_key == miner)
            .map(|c| c.votes)
            .unwrap_or(0)
    }
}

/// Tickets obtained by a candidate in elections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tickets {
    pub public_key: MinerId,
    pub obtained_tickets: u64,
}

impl Tickets {
    pub fn new(public_key: MinerId, obtained_tickets: u64) -> Self {
        Self {
            public_key,
            obtained_tickets,
        }
    }
}
