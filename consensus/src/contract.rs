//! Consensus contract
//!
//! The system-transaction surface invoked by the execution engine. Views
//! take serialized payloads and never mutate. [`ConsensusContract::execute`]
//! runs one state-changing call against a staged copy of the state and
//! commits it only when the call did not abort; calls to the dividend and
//! token collaborators are dispatched after the commit.

use crate::codec;
use crate::collaborators::{dispatch, DividendContract, DividendLedger, InlineCall, TokenContract, TokenLedger};
use crate::command::CommandGenerator;
use crate::config::ConsensusConfig;
use crate::errors::{ConfigError, ConsensusError, ConsensusResult, Outcome};
use crate::information::InformationGenerator;
use crate::processor::{ConsensusEvent, ExecutionContext, RoundProcessor};
use crate::validator::ConsensusValidator;
use crate::views::ConsensusViews;
use chrono::{DateTime, Utc};
use dpos_core::{
    ConsensusCall, ConsensusState, DPoSCommand, DPoSExtraInformation, DPoSInformation, MemoryState,
    MinerId, StagedState, Transaction, TransactionList, ValidationResult,
};
use log::warn;

pub struct ConsensusContract<S = MemoryState, D = DividendLedger, T = TokenLedger>
where
    S: ConsensusState,
    D: DividendContract,
    T: TokenContract,
{
    config: ConsensusConfig,
    state: S,
    dividends: D,
    token: T,
}

impl ConsensusContract {
    /// Contract over fresh in-memory state and ledgers
    pub fn in_memory(config: ConsensusConfig) -> Result<Self, ConfigError> {
        Self::new(config, MemoryState::new(), DividendLedger::new(), TokenLedger::new())
    }
}

impl<S, D, T> ConsensusContract<S, D, T>
where
    S: ConsensusState,
    D: DividendContract,
    T: TokenContract,
{
    pub fn new(config: ConsensusConfig, state: S, dividends: D, token: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            dividends,
            token,
        })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Direct state access for collaborators outside consensus, such as elections
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn dividends(&self) -> &D {
        &self.dividends
    }

    pub fn token(&self) -> &T {
        &self.token
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn views(&self) -> ConsensusViews<'_, S> {
        ConsensusViews::new(&self.state, &self.config)
    }

    /// Validate serialized [`DPoSInformation`]
    pub fn validate_consensus(&self, consensus_information: &[u8]) -> ValidationResult {
        match codec::decode::<DPoSInformation>(consensus_information) {
            Ok(information) => self.validate_information(&information),
            Err(e) => ValidationResult::fail(e.to_string()),
        }
    }

    pub fn validate_information(&self, information: &DPoSInformation) -> ValidationResult {
        ConsensusValidator::new(&self.state, &self.config).validate(information)
    }

    pub fn get_consensus_command(&self, public_key: &MinerId, timestamp: DateTime<Utc>) -> DPoSCommand {
        CommandGenerator::new(&self.state, &self.config).get_consensus_command(public_key, timestamp)
    }

    /// Build consensus information from serialized [`DPoSExtraInformation`]
    pub fn get_new_consensus_information(&self, extra_information: &[u8]) -> ConsensusResult<DPoSInformation> {
        let extra: DPoSExtraInformation = codec::decode(extra_information)?;
        self.new_consensus_information(&extra)
    }

    pub fn new_consensus_information(&self, extra: &DPoSExtraInformation) -> ConsensusResult<DPoSInformation> {
        InformationGenerator::new(&self.state, &self.config).get_new_consensus_information(extra)
    }

    pub fn generate_consensus_transactions(
        &self,
        ref_block_height: u64,
        ref_block_prefix: [u8; 4],
        extra_information: &[u8],
    ) -> ConsensusResult<TransactionList> {
        let extra: DPoSExtraInformation = codec::decode(extra_information)?;
        self.consensus_transactions(ref_block_height, ref_block_prefix, &extra)
    }

    pub fn consensus_transactions(
        &self,
        ref_block_height: u64,
        ref_block_prefix: [u8; 4],
        extra: &DPoSExtraInformation,
    ) -> ConsensusResult<TransactionList> {
        InformationGenerator::new(&self.state, &self.config).generate_consensus_transactions(
            ref_block_height,
            ref_block_prefix,
            extra,
        )
    }

    /// Execute one system transaction atomically
    pub fn execute(&mut self, context: &ExecutionContext, call: &ConsensusCall) -> Outcome<Vec<ConsensusEvent>> {
        let mut staged = StagedState::new(&mut self.state);
        let mut processor = RoundProcessor::new(&mut staged, &self.config, context);
        let outcome = processor.execute(call);
        let (inline_calls, events) = processor.into_effects();

        match outcome {
            Outcome::Abort(error) => {
                warn!("reverting {}: {}", call.method_name(), error);
                Outcome::Abort(error)
            }
            Outcome::SoftFail(message) => Outcome::SoftFail(message),
            Outcome::Ok(()) => {
                staged.commit();
                self.dispatch_all(&inline_calls);
                Outcome::Ok(events)
            }
        }
    }

    /// Execute a generated transaction
    pub fn execute_transaction(
        &mut self,
        transaction: &Transaction,
        timestamp: DateTime<Utc>,
        block_height: u64,
        sender: &MinerId,
    ) -> Outcome<Vec<ConsensusEvent>> {
        if transaction.from != sender.address() {
            return Outcome::Abort(ConsensusError::SenderMismatch(sender.to_string()));
        }
        let context = ExecutionContext::new(sender.clone(), timestamp, block_height);
        self.execute(&context, &transaction.call)
    }

    fn dispatch_all(&mut self, inline_calls: &[InlineCall]) {
        for call in inline_calls {
            dispatch(call, &mut self.dividends, &mut self.token);
        }
    }
}
