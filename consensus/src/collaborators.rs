//! External contracts called by the consensus processor
//!
//! The processor never calls these directly. It records [`InlineCall`]s
//! while executing and the contract dispatches them once the transaction's
//! state changes have been committed.

use dpos_core::Address;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Call to another contract issued by a consensus transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InlineCall {
    InitializeToken {
        symbol: String,
        name: String,
        total_supply: u64,
        decimals: u32,
        issuer: Address,
    },
    KeepWeights {
        term_number: u64,
    },
    AddDividends {
        term_number: u64,
        amount: u64,
    },
    SendDividends {
        to: Address,
        amount: u64,
    },
}

pub trait DividendContract {
    /// Freeze voter weights of a finished term
    fn keep_weights(&mut self, term_number: u64);

    /// Voters' bucket of a finished term
    fn add_dividends(&mut self, term_number: u64, amount: u64);

    fn send_dividends(&mut self, to: &Address, amount: u64);
}

pub trait TokenContract {
    fn initialize(&mut self, symbol: &str, name: &str, total_supply: u64, decimals: u32, issuer: &Address);
}

/// Route a recorded call to its collaborator
pub fn dispatch<D, T>(call: &InlineCall, dividends: &mut D, token: &mut T)
where
    D: DividendContract,
    T: TokenContract,
{
    debug!("dispatching {:?}", call);
    match call {
        InlineCall::InitializeToken {
            symbol,
            name,
            total_supply,
            decimals,
            issuer,
        } => token.initialize(symbol, name, *total_supply, *decimals, issuer),
        InlineCall::KeepWeights { term_number } => dividends.keep_weights(*term_number),
        InlineCall::AddDividends {
            term_number,
            amount,
        } => dividends.add_dividends(*term_number, *amount),
        InlineCall::SendDividends { to, amount } => dividends.send_dividends(to, *amount),
    }
}

/// In-memory dividend book
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendLedger {
    pub kept_weights: Vec<u64>,
    pub voter_dividends: BTreeMap<u64, u64>,
    pub balances: BTreeMap<Address, u64>,
}

impl DividendLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn total_sent(&self) -> u64 {
        self.balances.values().sum()
    }
}

impl DividendContract for DividendLedger {
    fn keep_weights(&mut self, term_number: u64) {
        self.kept_weights.push(term_number);
    }

    fn add_dividends(&mut self, term_number: u64, amount: u64) {
        *self.voter_dividends.entry(term_number).or_insert(0) += amount;
    }

    fn send_dividends(&mut self, to: &Address, amount: u64) {
        *self.balances.entry(to.clone()).or_insert(0) += amount;
    }
}

/// Token metadata recorded at genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub total_supply: u64,
    pub decimals: u32,
    pub issuer: Option<Address>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.symbol.is_some()
    }
}

impl TokenContract for TokenLedger {
    fn initialize(&mut self, symbol: &str, name: &str, total_supply: u64, decimals: u32, issuer: &Address) {
        self.symbol = Some(symbol.to_string());
        self.name = Some(name.to_string());
        self.total_supply = total_supply;
        self.decimals = decimals;
        self.issuer = Some(issuer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_core::MinerId;

    #[test]
    fn test_dispatch_routes_calls() {
        let mut dividends = DividendLedger::new();
        let mut token = TokenLedger::new();
        let miner = MinerId::new("aa").address();

        dispatch(&InlineCall::KeepWeights { term_number: 1 }, &mut dividends, &mut token);
        dispatch(
            &InlineCall::SendDividends {
                to: miner.clone(),
                amount: 40,
            },
            &mut dividends,
            &mut token,
        );
        dispatch(
            &InlineCall::SendDividends {
                to: miner.clone(),
                amount: 2,
            },
            &mut dividends,
            &mut token,
        );

        assert_eq!(dividends.kept_weights, vec![1]);
        assert_eq!(dividends.balance_of(&miner), 42);
        assert!(!token.is_initialized());
    }
}
