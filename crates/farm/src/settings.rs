//! Settings.
//!
//! The economic parameters of a farm instance.

use serde::{Deserialize, Serialize};

use crate::sol::FarmData;

/// What the pool refresh does when rewards accrue while nothing is staked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroStakePolicy {
    /// Accrue nothing for the period. The rewards of those blocks are not distributed.
    #[default]
    Skip,
    /// Abort the rollup step with a division-by-zero panic.
    Fail,
}

/// Settings of a farm instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmSettings {
    /// The fixed-point scale of reward-per-share quantities.
    pub accuracy_scale: u64,
    /// The reward distributed per block before any rate update.
    pub initial_reward_per_block: u64,
    /// The reward-per-share accumulator at deployment.
    pub initial_accumulated_rewards_per_share: u64,
    /// The pool total at deployment.
    pub initial_total_staked_balance: u64,
    /// The maximum number of actions folded by one rollup call.
    pub max_actions_per_rollup: usize,
    /// The accrual policy for an empty pool.
    pub zero_stake_policy: ZeroStakePolicy,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            accuracy_scale: 1_000_000,
            initial_reward_per_block: 5,
            initial_accumulated_rewards_per_share: 0,
            initial_total_staked_balance: 0,
            max_actions_per_rollup: 4,
            zero_stake_policy: ZeroStakePolicy::Skip,
        }
    }
}

impl FarmSettings {
    /// The root slot contents at deployment.
    #[must_use]
    pub fn initial_farm_data(&self) -> FarmData {
        FarmData {
            accumulatedRewardsPerShare: self.initial_accumulated_rewards_per_share,
            totalStakedBalance: self.initial_total_staked_balance,
        }
    }
}
