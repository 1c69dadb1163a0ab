//! Rollup Engine.
//!
//! Folds pending actions, oldest first, through the reward accumulator and the offchain store.
//! Every write goes to the store's staging area; committing or discarding the step is the
//! caller's decision, so a failed fold never touches the committed root.

use tracing::{debug, info};

use crate::{
    actions::{LoggedAction, PendingAction},
    errors::FarmPanic,
    math,
    offchain::OffchainState,
    receipts::ActionReceipt,
    settings::{FarmSettings, ZeroStakePolicy},
    sol::DelegatorRecord,
};

/// The result of a successful fold, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupOutcome {
    /// The height the pool was last refreshed at.
    pub last_update_height: u32,
    /// One receipt per folded action.
    pub actions: Vec<ActionReceipt>,
}

/// Applies actions to a borrowed [`OffchainState`] for the duration of one rollup step.
#[derive(Debug)]
pub struct RollupEngine<'a> {
    store: &'a mut OffchainState,
    settings: &'a FarmSettings,
    reward_per_block: u64,
    last_update_height: u32,
}

impl<'a> RollupEngine<'a> {
    /// Creates an engine over `store` starting from the given pool meta.
    pub fn new(
        store: &'a mut OffchainState,
        settings: &'a FarmSettings,
        reward_per_block: u64,
        last_update_height: u32,
    ) -> Self {
        Self { store, settings, reward_per_block, last_update_height }
    }

    /// Folds `actions` in order at `height`.
    pub fn fold(mut self, height: u32, actions: &[LoggedAction]) -> Result<RollupOutcome, FarmPanic> {
        let mut receipts = Vec::with_capacity(actions.len());
        for (position, logged) in actions.iter().enumerate() {
            debug!("applying action {} of {}", position + 1, actions.len());
            self.refresh_pool(height)?;
            let receipt = self.apply(&logged.action)?;
            receipts.push(ActionReceipt { actions_hash: logged.actions_hash, ..receipt });
        }
        Ok(RollupOutcome { last_update_height: self.last_update_height, actions: receipts })
    }

    /// Accrues the rewards of the blocks since the last refresh into the accumulator.
    pub fn refresh_pool(&mut self, height: u32) -> Result<(), FarmPanic> {
        if height < self.last_update_height {
            return Err(FarmPanic::HeightRegression { last: self.last_update_height, current: height });
        }
        let elapsed = u64::from(height - self.last_update_height);
        self.last_update_height = height;
        if elapsed == 0 {
            return Ok(());
        }

        let mut farm_data = self.store.farm_data();
        if farm_data.totalStakedBalance == 0 && self.settings.zero_stake_policy == ZeroStakePolicy::Skip
        {
            debug!("skip accrual of {} blocks, nothing staked", elapsed);
            return Ok(());
        }

        let delta = math::accrue(
            self.reward_per_block,
            elapsed,
            farm_data.totalStakedBalance,
            self.settings.accuracy_scale,
        )?;
        debug!(
            "accrue {} blocks * {} reward over {} staked: +{} per share",
            elapsed, self.reward_per_block, farm_data.totalStakedBalance, delta
        );
        farm_data.accrue(delta)?;
        self.store.set_farm_data(farm_data);
        Ok(())
    }

    /// Settles the rewards of the action's address and applies its balance effect.
    pub fn apply(&mut self, action: &PendingAction) -> Result<ActionReceipt, FarmPanic> {
        let address = action.address();
        let mut farm_data = self.store.farm_data();
        let record = self.store.delegator(&address);

        // Settle against the refreshed accumulator.
        let user_reward = math::settle(
            farm_data.accumulatedRewardsPerShare,
            record.accumulatedRewardPerShareStart,
            record.balance,
            self.settings.accuracy_scale,
        )?;

        let balance = match action {
            PendingAction::Deposit { amount, .. } => {
                info!("├── Delegator({}): + {} staked", address, amount);
                farm_data.add_stake(*amount)?;
                math::add(record.balance, *amount)?
            }
            PendingAction::Withdraw { .. } => {
                info!("├── Delegator({}): - {} staked", address, record.balance);
                farm_data.remove_stake(record.balance)?;
                0
            }
            PendingAction::Claim { .. } => record.balance,
        };
        info!("├── Delegator({}): {} reward settled", address, user_reward);

        self.store.set_delegator(
            address,
            DelegatorRecord::new(farm_data.accumulatedRewardsPerShare, balance),
        );
        let receipt = ActionReceipt {
            action: *action,
            actions_hash: Default::default(),
            user_reward,
            balance,
            total_staked_balance: farm_data.totalStakedBalance,
            accumulated_rewards_per_share: farm_data.accumulatedRewardsPerShare,
        };
        self.store.set_farm_data(farm_data);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::{address, Address};

    use crate::{actions::ActionLog, sol::FarmData};

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");

    fn settings(policy: ZeroStakePolicy) -> FarmSettings {
        FarmSettings { accuracy_scale: 100, zero_stake_policy: policy, ..FarmSettings::default() }
    }

    #[test]
    fn refresh_accrues_elapsed_blocks() {
        let settings = settings(ZeroStakePolicy::Skip);
        let mut store = OffchainState::new(FarmData { accumulatedRewardsPerShare: 3, totalStakedBalance: 2 });
        let mut engine = RollupEngine::new(&mut store, &settings, 5, 0);

        engine.refresh_pool(1).unwrap();
        engine.refresh_pool(1).unwrap();
        assert_eq!(store.farm_data().accumulatedRewardsPerShare, 253);
    }

    #[test]
    fn refresh_rejects_height_regression() {
        let settings = settings(ZeroStakePolicy::Skip);
        let mut store = OffchainState::new(FarmData::default());
        let mut engine = RollupEngine::new(&mut store, &settings, 5, 10);

        assert_eq!(engine.refresh_pool(9), Err(FarmPanic::HeightRegression { last: 10, current: 9 }));
    }

    #[test]
    fn empty_pool_follows_policy() {
        let skip = settings(ZeroStakePolicy::Skip);
        let mut store = OffchainState::new(FarmData::default());
        RollupEngine::new(&mut store, &skip, 5, 0).refresh_pool(3).unwrap();
        assert_eq!(store.farm_data(), FarmData::default());

        let fail = settings(ZeroStakePolicy::Fail);
        let mut store = OffchainState::new(FarmData::default());
        let result = RollupEngine::new(&mut store, &fail, 5, 0).refresh_pool(3);
        assert_eq!(result, Err(FarmPanic::DivisionByZero));
    }

    #[test]
    fn fold_applies_actions_in_order() {
        let settings = settings(ZeroStakePolicy::Skip);
        let mut log = ActionLog::new();
        log.dispatch(PendingAction::Deposit { address: ALICE, amount: 100 });
        log.dispatch(PendingAction::Withdraw { address: ALICE });
        let pending = log.pending_since(Default::default()).unwrap();

        let mut store = OffchainState::new(FarmData::default());
        let outcome = RollupEngine::new(&mut store, &settings, 5, 0).fold(4, &pending).unwrap();

        assert_eq!(outcome.last_update_height, 4);
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.actions[0].total_staked_balance, 100);
        assert_eq!(outcome.actions[1].balance, 0);
        assert_eq!(outcome.actions[1].actions_hash, log.head());
        assert_eq!(store.delegator(&ALICE).balance, 0);
        assert_eq!(store.farm_data().totalStakedBalance, 0);
    }

    #[test]
    fn withdraw_beyond_pool_total_is_fatal() {
        let settings = settings(ZeroStakePolicy::Skip);
        let mut store = OffchainState::new(FarmData::default());
        store.set_delegator(ALICE, DelegatorRecord::new(0, 50));
        let mut engine = RollupEngine::new(&mut store, &settings, 5, 0);

        assert_eq!(engine.apply(&PendingAction::Withdraw { address: ALICE }), Err(FarmPanic::Underflow));
    }
}
