//! DPoS Core Library
//!
//! Data model shared by the consensus crates: rounds, terms, candidate
//! history, transient messages and the typed state accessor.

pub mod hash;
pub mod history;
pub mod messages;
pub mod round;
pub mod state;
pub mod term;

// Re-export main types
pub use hash::{Address, Hash, MinerId};
pub use history::{CandidateInHistory, CandidateInTerm, TermSnapshot, Tickets};
pub use messages::{
    Behaviour, ConsensusCall, DPoSCommand, DPoSExtraInformation, DPoSInformation, Forwarding,
    ToBroadcast, ToPackage, Transaction, TransactionList, ValidationResult, INFINITE_MILLISECONDS,
};
pub use round::{MinerInRound, Round};
pub use state::{ConsensusState, MemoryState, StagedState};
pub use term::{Miners, Term};
