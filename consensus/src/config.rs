//! Consensus configuration
//!
//! One immutable [`ConsensusConfig`] is threaded through every component.
//! It can be built in code or loaded from a TOML file; missing keys fall
//! back to the defaults below.
//!
//! ```toml
//! mining_interval_milliseconds = 4000
//! producer_number = 17
//! aliases = ["Alice", "Bob"]
//!
//! [incentives]
//! voters = 20
//! ```

use crate::errors::ConfigError;
use dpos_economics::IncentiveRatios;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Token minted at genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub symbol: String,
    pub name: String,
    pub total_supply: u64,
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: "ELF".to_string(),
            name: "Native Token".to_string(),
            total_supply: dpos_economics::constants::TOTAL_SUPPLY,
            decimals: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Delay before the first round of the chain starts
    pub initial_waiting_milliseconds: u64,

    pub mining_interval_milliseconds: u64,

    /// Number of active miners per term
    pub producer_number: usize,

    /// Trailing window of rounds scanned for recent misses
    pub fork_detection_round_number: u64,

    /// Length of generated aliases
    pub alias_limit: usize,

    /// Aliases handed out to the initial miners, in miner order
    pub aliases: Vec<String>,

    /// A round is over once the clock is this close to its extra block slot
    pub time_overflow_margin_milliseconds: u64,

    /// Term length in days; terms only change on request when unset
    pub days_each_term: Option<u64>,

    /// Distance between the current height and the reference block of generated transactions
    pub ref_block_offset: u64,

    pub token: TokenConfig,
    pub incentives: IncentiveRatios,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            initial_waiting_milliseconds: 8000,
            mining_interval_milliseconds: 4000,
            producer_number: 17,
            fork_detection_round_number: 3,
            alias_limit: 5,
            aliases: [
                "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
                "Juliet", "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec",
            ]
            .iter()
            .map(|a| a.to_string())
            .collect(),
            time_overflow_margin_milliseconds: 4000,
            days_each_term: None,
            ref_block_offset: 4,
            token: TokenConfig::default(),
            incentives: IncentiveRatios::default(),
        }
    }
}

impl ConsensusConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ConsensusConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mining_interval_milliseconds == 0 {
            return Err(ConfigError::ZeroMiningInterval);
        }
        if self.producer_number == 0 {
            return Err(ConfigError::ZeroProducerNumber);
        }
        if self.alias_limit == 0 {
            return Err(ConfigError::ZeroAliasLimit);
        }
        if self.time_overflow_margin_milliseconds
            > self.mining_interval_milliseconds * self.producer_number as u64
        {
            return Err(ConfigError::MarginTooLarge {
                margin: self.time_overflow_margin_milliseconds,
                interval: self.mining_interval_milliseconds,
            });
        }
        if self.days_each_term == Some(0) {
            return Err(ConfigError::ZeroDaysEachTerm);
        }
        self.incentives.validate()?;
        Ok(())
    }

    /// Alias for the miner at `index`, or the key prefix when the list runs out
    pub fn alias_for(&self, index: usize, public_key: &dpos_core::MinerId) -> String {
        self.aliases
            .get(index)
            .cloned()
            .unwrap_or_else(|| public_key.short(self.alias_limit))
    }
}
