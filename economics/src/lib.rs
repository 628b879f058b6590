//! DPoS Economics Module
//!
//! Splits the tokens released per mined block between voters, active
//! miners and backup nodes.

pub mod incentives;

pub use incentives::{
    share, split_evenly, DividendBreakdown, IncentiveCalculator, IncentiveError, IncentiveRatios,
};

/// Economic constants
pub mod constants {
    /// Smallest token unit (8 decimal places)
    pub const TOKEN_UNIT: u64 = 100_000_000;

    /// Default release per mined block
    pub const TOKEN_PER_BLOCK: u64 = 10_000;

    /// Default total supply minted at genesis
    pub const TOTAL_SUPPLY: u64 = 1_000_000_000 * TOKEN_UNIT;
}
