//! Block production incentives
//!
//! Every mined block releases `token_per_block` units. The release is split
//! into buckets by percentage: voters, miners' basic reward, miners' vote
//! share, reappointment bonus and backup nodes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("Incentive ratios must sum to 100, got {0}")]
    RatiosNotWhole(u64),

    #[error("Token per block must be positive")]
    ZeroTokenPerBlock,
}

/// Bucket percentages, each in whole percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncentiveRatios {
    pub token_per_block: u64,
    pub voters: u64,
    pub miners_basic: u64,
    pub miners_votes: u64,
    pub miners_reappointment: u64,
    pub backup_nodes: u64,
}

impl Default for IncentiveRatios {
    fn default() -> Self {
        Self {
            token_per_block: crate::constants::TOKEN_PER_BLOCK,
            voters: 20,
            miners_basic: 50,
            miners_votes: 10,
            miners_reappointment: 10,
            backup_nodes: 10,
        }
    }
}

impl IncentiveRatios {
    pub fn total_percent(&self) -> u64 {
        self.voters + self.miners_basic + self.miners_votes + self.miners_reappointment + self.backup_nodes
    }

    pub fn validate(&self) -> Result<(), IncentiveError> {
        if self.token_per_block == 0 {
            return Err(IncentiveError::ZeroTokenPerBlock);
        }
        let total = self.total_percent();
        if total != 100 {
            return Err(IncentiveError::RatiosNotWhole(total));
        }
        Ok(())
    }
}

/// Amounts of every bucket for a given number of mined blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendBreakdown {
    pub voters: u64,
    pub miners_basic: u64,
    pub miners_votes: u64,
    pub miners_reappointment: u64,
    pub backup_nodes: u64,
}

impl DividendBreakdown {
    pub fn sum(&self) -> u64 {
        self.voters + self.miners_basic + self.miners_votes + self.miners_reappointment + self.backup_nodes
    }
}

pub struct IncentiveCalculator {
    ratios: IncentiveRatios,
}

impl IncentiveCalculator {
    pub fn new(ratios: IncentiveRatios) -> Self {
        Self { ratios }
    }

    pub fn ratios(&self) -> &IncentiveRatios {
        &self.ratios
    }

    /// Total released for `mined_blocks`
    pub fn total_dividends(&self, mined_blocks: u64) -> u64 {
        mined_blocks.saturating_mul(self.ratios.token_per_block)
    }

    fn bucket(&self, mined_blocks: u64, percent: u64) -> u64 {
        share(self.total_dividends(mined_blocks), percent, 100)
    }

    pub fn voters_dividends(&self, mined_blocks: u64) -> u64 {
        self.bucket(mined_blocks, self.ratios.voters)
    }

    /// Basic reward bucket of all active miners together
    pub fn miners_basic_reward(&self, mined_blocks: u64) -> u64 {
        self.bucket(mined_blocks, self.ratios.miners_basic)
    }

    /// Basic reward of one active miner
    pub fn miner_basic_reward(&self, mined_blocks: u64, producer_number: usize) -> u64 {
        split_evenly(self.miners_basic_reward(mined_blocks), producer_number)
    }

    pub fn miners_votes_reward(&self, mined_blocks: u64) -> u64 {
        self.bucket(mined_blocks, self.ratios.miners_votes)
    }

    pub fn reappointment_reward(&self, mined_blocks: u64) -> u64 {
        self.bucket(mined_blocks, self.ratios.miners_reappointment)
    }

    pub fn backup_nodes_reward(&self, mined_blocks: u64) -> u64 {
        self.bucket(mined_blocks, self.ratios.backup_nodes)
    }

    pub fn breakdown(&self, mined_blocks: u64) -> DividendBreakdown {
        DividendBreakdown {
            voters: self.voters_dividends(mined_blocks),
            miners_basic: self.miners_basic_reward(mined_blocks),
            miners_votes: self.miners_votes_reward(mined_blocks),
            miners_reappointment: self.reappointment_reward(mined_blocks),
            backup_nodes: self.backup_nodes_reward(mined_blocks),
        }
    }

    /// `basic + votes * tickets / totalTickets + reappointment * continual / totalContinual`
    pub fn miner_reward(
        &self,
        mined_blocks: u64,
        producer_number: usize,
        tickets: u64,
        total_tickets: u64,
        continual_appointments: u64,
        total_continual_appointments: u64,
    ) -> u64 {
        let basic = self.miner_basic_reward(mined_blocks, producer_number);
        let votes = share(self.miners_votes_reward(mined_blocks), tickets, total_tickets);
        let reappointment = share(
            self.reappointment_reward(mined_blocks),
            continual_appointments,
            total_continual_appointments,
        );
        basic + votes + reappointment
    }

    /// Equal share of the backup bucket
    pub fn backup_node_reward(&self, mined_blocks: u64, backup_count: usize) -> u64 {
        split_evenly(self.backup_nodes_reward(mined_blocks), backup_count)
    }
}

/// `amount * part / total`, zero when `total` is zero
pub fn share(amount: u64, part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (amount as u128 * part as u128 / total as u128) as u64
}

pub fn split_evenly(amount: u64, count: usize) -> u64 {
    if count == 0 {
        0
    } else {
        amount / count as u64
    }
}
