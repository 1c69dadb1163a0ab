//! Receipts.
//!
//! The outputs of a rollup: what each folded action did, and the checkpoint pair the host persists.

use alloy_primitives::B256;
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::{actions::PendingAction, sol::CheckpointContainer};

/// The pair of commitments the host substrate persists between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The offchain state root.
    pub root: B256,
    /// The actions hash consumed so far.
    pub actions_hash: B256,
}

impl Checkpoint {
    /// The fixed-width encoding of the pair.
    #[must_use]
    pub fn abi_encode(&self) -> Vec<u8> {
        CheckpointContainer { root: self.root, actionsHash: self.actions_hash }.abi_encode()
    }

    /// Decodes the fixed-width encoding of the pair.
    pub fn abi_decode(bytes: &[u8]) -> Result<Self, alloy_sol_types::Error> {
        let container = CheckpointContainer::abi_decode(bytes)?;
        Ok(Self { root: container.root, actions_hash: container.actionsHash })
    }
}

/// The effect of one folded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// The applied action.
    pub action: PendingAction,
    /// The actions hash right after this action.
    pub actions_hash: B256,
    /// The reward settled for the action's address.
    pub user_reward: u64,
    /// The delegator balance after the action.
    pub balance: u64,
    /// The pool total after the action.
    pub total_staked_balance: u64,
    /// The reward-per-share accumulator the action was settled against.
    pub accumulated_rewards_per_share: u64,
}

/// The result of a committed rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupReceipt {
    /// The height the rollup ran at.
    pub height: u32,
    /// The checkpoint before the rollup.
    pub old: Checkpoint,
    /// The checkpoint after the rollup.
    pub new: Checkpoint,
    /// The folded actions, in application order.
    pub actions: Vec<ActionReceipt>,
}
