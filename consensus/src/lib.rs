//! DPoS Consensus
//!
//! Round-robin block production among elected miners. Miners commit to a
//! secret each slot, reveal it in the next round, and the revealed values
//! decide the order of the round after. Every N days the miner set is
//! replaced by the election winners and the term's dividends are paid out.

pub mod clock;
pub mod codec;
pub mod collaborators;
pub mod command;
pub mod commit_reveal;
pub mod config;
pub mod contract;
pub mod errors;
pub mod information;
pub mod irreversible;
pub mod processor;
pub mod scheduler;
pub mod validator;
pub mod views;

pub use clock::RoundClock;
pub use collaborators::{DividendContract, DividendLedger, InlineCall, TokenContract, TokenLedger};
pub use command::CommandGenerator;
pub use config::{ConsensusConfig, TokenConfig};
pub use contract::ConsensusContract;
pub use errors::{ConfigError, ConsensusError, ConsensusResult, Outcome};
pub use information::InformationGenerator;
pub use processor::{ConsensusEvent, ExecutionContext, RoundProcessor};
pub use scheduler::{MiningScheduler, ScheduledMining};
pub use validator::ConsensusValidator;
pub use views::ConsensusViews;

pub use dpos_core;
pub use dpos_economics;
