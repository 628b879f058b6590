//! Consensus error types
//!
//! Hard failures abort the whole system transaction. Soft failures and the
//! success value travel through [`Outcome`].

use thiserror::Error;

/// Reasons a consensus transaction is aborted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Payload built against a different round than the stored one
    #[error("Round id mismatch: expected {expected}, got {actual}")]
    RoundIdMismatch { expected: i64, actual: i64 },

    /// Round information missing from state
    #[error("Round information not found: {0}")]
    RoundNotFound(u64),

    #[error("Failed to update round number to {0}")]
    RoundNumberUpdateFailed(u64),

    #[error("Failed to update term number to {0}")]
    TermNumberUpdateFailed(u64),

    #[error("Failed to add round {0}")]
    RoundAddFailed(u64),

    #[error("Failed to update round {0}")]
    RoundUpdateFailed(u64),

    /// Forwarded round replaces the miner set with the wrong number of miners
    #[error("Miner set of {actual} does not match producer number {expected}")]
    MinersMismatch { expected: usize, actual: usize },

    #[error("Miners of term {0} already set")]
    MinersAlreadySet(u64),

    /// Sender has no slot in the current round
    #[error("Miner {0} is not in the current round")]
    NotAMiner(String),

    #[error("Transaction was not sent by {0}")]
    SenderMismatch(String),

    #[error("Out value of {0} already filled")]
    OutValueAlreadyFilled(String),

    #[error("Out value of {0} is empty")]
    OutValueMissing(String),

    #[error("Signature of {0} is empty")]
    SignatureMissing(String),

    /// Revealed value does not hash to the published commitment
    #[error("Revealed in value of {0} does not match its out value")]
    InvalidReveal(String),

    #[error("Consensus already initialized")]
    AlreadyInitialized,

    #[error("Consensus not initialized")]
    NotInitialized,

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Failed to encode payload: {0}")]
    Encode(String),
}

/// Type alias for consensus results
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Mining interval cannot be zero")]
    ZeroMiningInterval,

    #[error("Producer number cannot be zero")]
    ZeroProducerNumber,

    #[error("Alias limit cannot be zero")]
    ZeroAliasLimit,

    #[error("Time overflow margin {margin}ms must be below the mining interval {interval}ms times producer number")]
    MarginTooLarge { margin: u64, interval: u64 },

    #[error("Days each term cannot be zero")]
    ZeroDaysEachTerm,

    #[error("Invalid incentives: {0}")]
    Incentives(#[from] dpos_economics::IncentiveError),

    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Result of a state-mutating consensus call
///
/// `SoftFail` is a no-op that the caller may ignore, typically a retried
/// end-of-term step. `Abort` reverts every write of the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    SoftFail(String),
    Abort(ConsensusError),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_soft_fail(&self) -> bool {
        matches!(self, Outcome::SoftFail(_))
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Outcome::Abort(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::SoftFail(message) => Outcome::SoftFail(message),
            Outcome::Abort(error) => Outcome::Abort(error),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// Failure message, if any
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::SoftFail(message) => Some(message.clone()),
            Outcome::Abort(error) => Some(error.to_string()),
        }
    }
}

impl<T> From<ConsensusResult<T>> for Outcome<T> {
    fn from(result: ConsensusResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(error) => Outcome::Abort(error),
        }
    }
}
