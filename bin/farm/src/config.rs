use config::{Config, ConfigError, Environment};
use farm_core::settings::{FarmSettings, ZeroStakePolicy};
use farm_utils::LogFormat;
use serde::Deserialize;

/// Settings for the farm CLI.
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Where the farm backup is kept between invocations.
    pub state_path: String,
    /// The format for logging.
    pub log_format: LogFormat,
    /// The fixed-point scale of reward-per-share quantities.
    pub accuracy_scale: u64,
    /// The reward per block at deployment.
    pub initial_reward_per_block: u64,
    /// The accumulator at deployment.
    pub initial_accumulated_rewards_per_share: u64,
    /// The pool total at deployment.
    pub initial_total_staked_balance: u64,
    /// The maximum number of actions folded per rollup.
    pub max_actions_per_rollup: usize,
    /// The accrual policy for an empty pool.
    pub zero_stake_policy: ZeroStakePolicy,
}

impl Settings {
    /// Create a new Settings instance from environment variables.
    pub fn new() -> Result<Self, ConfigError> {
        let defaults = FarmSettings::default();
        let config = Config::builder()
            .set_default("state_path", "farm.json")?
            .set_default("log_format", "Minimal")?
            .set_default("accuracy_scale", defaults.accuracy_scale)?
            .set_default("initial_reward_per_block", defaults.initial_reward_per_block)?
            .set_default(
                "initial_accumulated_rewards_per_share",
                defaults.initial_accumulated_rewards_per_share,
            )?
            .set_default("initial_total_staked_balance", defaults.initial_total_staked_balance)?
            .set_default("max_actions_per_rollup", defaults.max_actions_per_rollup.to_string())?
            .set_default("zero_stake_policy", "Skip")?
            .add_source(Environment::with_prefix("FARM"))
            .build()?;

        config.try_deserialize()
    }

    /// The economic parameters for a new deployment.
    pub fn farm_settings(&self) -> FarmSettings {
        FarmSettings {
            accuracy_scale: self.accuracy_scale,
            initial_reward_per_block: self.initial_reward_per_block,
            initial_accumulated_rewards_per_share: self.initial_accumulated_rewards_per_share,
            initial_total_staked_balance: self.initial_total_staked_balance,
            max_actions_per_rollup: self.max_actions_per_rollup,
            zero_stake_policy: self.zero_stake_policy,
        }
    }
}
