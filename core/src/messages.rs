//! Transient consensus messages
//!
//! Nothing here is persisted. These types travel between the node driving
//! consensus and the validator, command and information generators, and
//! make up the payloads of generated system transactions.

use crate::hash::{Address, Hash, MinerId};
use crate::round::Round;
use crate::term::Term;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a miner is expected to do in its next slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behaviour {
    InitialTerm,
    PackageOutValue,
    NextRound,
    NextTerm,
}

impl fmt::Display for Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Behaviour::InitialTerm => "InitialTerm",
            Behaviour::PackageOutValue => "PackageOutValue",
            Behaviour::NextRound => "NextRound",
            Behaviour::NextTerm => "NextTerm",
        };
        f.write_str(name)
    }
}

/// Commit of the sender's own slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToPackage {
    pub round_id: i64,
    pub out_value: Hash,
    pub signature: Hash,
}

/// Reveal of the sender's previous commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToBroadcast {
    pub round_id: i64,
    pub in_value: Hash,
}

/// Round transition payload
///
/// `current_round` is the ending round with any corrections; `next_round`
/// is the full definition of the round that begins. `None` means the
/// second round of the term already stored at term start is reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forwarding {
    pub current_age: u64,
    pub current_round: Round,
    pub next_round: Option<Round>,
}

/// Consensus header information proposed by a miner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DPoSInformation {
    pub sender: Address,
    pub sender_public_key: MinerId,
    pub will_update_consensus: bool,
    pub behaviour: Behaviour,
    pub current_round: Option<Round>,
    pub forwarding: Option<Forwarding>,
    pub new_term: Option<Term>,
    pub miners_list: Vec<MinerId>,
}

impl DPoSInformation {
    pub fn new(sender_public_key: MinerId, behaviour: Behaviour) -> Self {
        Self {
            sender: sender_public_key.address(),
            sender_public_key,
            will_update_consensus: false,
            behaviour,
            current_round: None,
            forwarding: None,
            new_term: None,
            miners_list: Vec::new(),
        }
    }
}

/// Trigger supplied by the node when it asks for new consensus information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DPoSExtraInformation {
    pub public_key: MinerId,
    pub timestamp: DateTime<Utc>,
    pub change_term: bool,

    /// Miner list used at genesis
    pub initial_miners: Vec<MinerId>,
    pub chain_id: i32,

    /// Commitment for the slot being produced
    pub out_value: Option<Hash>,

    /// Preimage of `out_value`, used to derive the slot signature
    pub current_in_value: Option<Hash>,

    /// Preimage of the previous round's commitment
    pub in_value: Option<Hash>,

    pub new_term: Option<Term>,
    pub forwarding: Option<Forwarding>,
}

/// Counting milliseconds that never elapse
pub const INFINITE_MILLISECONDS: u64 = u64::MAX;

/// Node-local decision of what to propose next and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DPoSCommand {
    pub behaviour: Behaviour,
    pub counting_milliseconds: u64,
    pub timeout_milliseconds: u64,
}

impl DPoSCommand {
    pub fn is_infinite(&self) -> bool {
        self.counting_milliseconds == INFINITE_MILLISECONDS
    }
}

/// Result of a read-only consensus check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// System transaction surface of the consensus contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusCall {
    InitialTerm(Term),
    NextTerm(Term),
    NextRound(Forwarding),
    PackageOutValue(ToPackage),
    BroadcastInValue(ToBroadcast),
    SnapshotForTerm {
        term_number: u64,
        last_round_number: u64,
    },
    SnapshotForMiners {
        term_number: u64,
        last_round_number: u64,
    },
    SendDividends {
        term_number: u64,
        last_round_number: u64,
    },
}

impl ConsensusCall {
    pub fn method_name(&self) -> &'static str {
        match self {
            ConsensusCall::InitialTerm(_) => "InitialTerm",
            ConsensusCall::NextTerm(_) => "NextTerm",
            ConsensusCall::NextRound(_) => "NextRound",
            ConsensusCall::PackageOutValue(_) => "PackageOutValue",
            ConsensusCall::BroadcastInValue(_) => "BroadcastInValue",
            ConsensusCall::SnapshotForTerm { .. } => "SnapshotForTerm",
            ConsensusCall::SnapshotForMiners { .. } => "SnapshotForMiners",
            ConsensusCall::SendDividends { .. } => "SendDividends",
        }
    }
}

/// Generated system transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub ref_block_number: u64,
    pub ref_block_prefix: [u8; 4],
    pub call: ConsensusCall,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
}

impl TransactionList {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn method_names(&self) -> Vec<&'static str> {
        self.transactions
            .iter()
            .map(|tx| tx.call.method_name())
            .collect()
    }
}
