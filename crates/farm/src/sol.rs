//! Solidity types.
//!
//! This module contains the ABI-encodable records that are committed to by the offchain state root
//! and the actions hash chain.

use alloy_primitives::B256;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

use crate::{errors::FarmPanic, math};

sol! {
    /// @notice The root-keyed pool counters.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct FarmData {
        /// @notice The reward-per-share accumulator, scaled by the accuracy factor.
        uint64 accumulatedRewardsPerShare;
        /// @notice The sum of all staked balances.
        uint64 totalStakedBalance;
    }

    /// @notice The per-address stake record.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct DelegatorRecord {
        /// @notice The accumulator reading at the last applied action.
        uint64 accumulatedRewardPerShareStart;
        /// @notice The staked balance.
        uint64 balance;
    }

    /// @notice The offchain state committed to by the root hash.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct OffchainStateContainer {
        uint64 accumulatedRewardsPerShare;
        uint64 totalStakedBalance;
        bytes32 delegatorsRoot;
    }

    /// @notice The kind of a pending action.
    #[derive(Debug, PartialEq, Eq)]
    enum ActionKind {
        /// @notice Adds to the stake.
        Deposit,
        /// @notice Exits the full stake.
        Withdraw,
        /// @notice Settles rewards only.
        Claim
    }

    /// @notice A pending action as hashed into the actions chain.
    #[derive(Debug, PartialEq, Eq)]
    struct ActionContainer {
        ActionKind kind;
        address account;
        uint64 amount;
    }

    /// @notice The public input of a reward-rate permission certificate.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct PermissionInput {
        /// @notice The permission is valid strictly below this height.
        uint32 permissionUntilBlockHeight;
        /// @notice The account the permission was issued for.
        address account;
    }

    /// @notice The fixed-width pair persisted by the host between calls.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct CheckpointContainer {
        bytes32 root;
        bytes32 actionsHash;
    }
}

impl FarmData {
    /// Adds a reward-per-share increase to the accumulator.
    pub fn accrue(&mut self, delta_per_share: u64) -> Result<(), FarmPanic> {
        self.accumulatedRewardsPerShare =
            math::add(self.accumulatedRewardsPerShare, delta_per_share)?;
        Ok(())
    }

    /// Adds a deposit to the pool total.
    pub fn add_stake(&mut self, amount: u64) -> Result<(), FarmPanic> {
        self.totalStakedBalance = math::add(self.totalStakedBalance, amount)?;
        Ok(())
    }

    /// Removes an exiting balance from the pool total.
    pub fn remove_stake(&mut self, amount: u64) -> Result<(), FarmPanic> {
        self.totalStakedBalance = math::sub(self.totalStakedBalance, amount)?;
        Ok(())
    }

    /// Builds the container hashed into the state root.
    #[must_use]
    pub fn container(&self, delegators_root: B256) -> OffchainStateContainer {
        OffchainStateContainer {
            accumulatedRewardsPerShare: self.accumulatedRewardsPerShare,
            totalStakedBalance: self.totalStakedBalance,
            delegatorsRoot: delegators_root,
        }
    }
}

impl DelegatorRecord {
    /// Creates a record starting at the given accumulator reading.
    #[must_use]
    pub fn new(accumulated_reward_per_share_start: u64, balance: u64) -> Self {
        Self { accumulatedRewardPerShareStart: accumulated_reward_per_share_start, balance }
    }
}
