//! Actions.
//!
//! This module contains the pending user intents and the append-only, hash-chained log that holds
//! them until a rollup consumes them.

use alloy_primitives::{keccak256, Address, Keccak256, B256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::FarmPanic,
    sol::{ActionContainer, ActionKind},
};

/// The checkpoint of an empty action log.
pub const INITIAL_ACTIONS_HASH: B256 = B256::ZERO;

/// A user intent waiting to be applied by the next rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    /// Stake `amount` for `address`.
    Deposit {
        /// The staker.
        address: Address,
        /// The amount added to the stake.
        amount: u64,
    },
    /// Exit the full stake of `address`.
    Withdraw {
        /// The staker.
        address: Address,
    },
    /// Settle the rewards of `address` without changing its stake.
    Claim {
        /// The staker.
        address: Address,
    },
}

impl PendingAction {
    /// The address the action applies to.
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            PendingAction::Deposit { address, .. }
            | PendingAction::Withdraw { address }
            | PendingAction::Claim { address } => *address,
        }
    }

    /// The ABI-encodable form hashed into the actions chain.
    #[must_use]
    pub fn sol(&self) -> ActionContainer {
        let (kind, amount) = match self {
            PendingAction::Deposit { amount, .. } => (ActionKind::Deposit, *amount),
            PendingAction::Withdraw { .. } => (ActionKind::Withdraw, 0),
            PendingAction::Claim { .. } => (ActionKind::Claim, 0),
        };
        ActionContainer { kind, account: self.address(), amount }
    }

    /// Hash of the encoded action.
    #[must_use]
    pub fn hash(&self) -> B256 {
        keccak256(self.sol().abi_encode())
    }
}

/// An action together with the chain head right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedAction {
    /// The dispatched action.
    pub action: PendingAction,
    /// The actions hash once this action is included.
    pub actions_hash: B256,
}

/// Extends an actions hash with one more action.
#[must_use]
pub fn chain(previous: B256, action: &PendingAction) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(previous);
    hasher.update(action.hash());
    hasher.finalize()
}

/// The append-only log of dispatched actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    entries: Vec<LoggedAction>,
}

impl ActionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain head over every dispatched action.
    #[must_use]
    pub fn head(&self) -> B256 {
        self.entries.last().map_or(INITIAL_ACTIONS_HASH, |entry| entry.actions_hash)
    }

    /// The number of dispatched actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no action was ever dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an action and returns the new chain head.
    ///
    /// Every call records a distinct action, identical actions are not merged.
    pub fn dispatch(&mut self, action: PendingAction) -> B256 {
        let actions_hash = chain(self.head(), &action);
        debug!("dispatch {:?} -> {}", action, actions_hash);
        self.entries.push(LoggedAction { action, actions_hash });
        actions_hash
    }

    /// Returns every action recorded after `checkpoint`, oldest first.
    ///
    /// The checkpoint is searched from the head, where a rollup's checkpoint usually sits.
    pub fn pending_since(&self, checkpoint: B256) -> Result<&[LoggedAction], FarmPanic> {
        if checkpoint == INITIAL_ACTIONS_HASH {
            return Ok(&self.entries);
        }
        let position = self
            .entries
            .iter()
            .rposition(|entry| entry.actions_hash == checkpoint)
            .ok_or(FarmPanic::UnknownActionsHash { hash: checkpoint })?;
        Ok(&self.entries[position + 1..])
    }

    /// Rebuilds a log from its actions, recomputing the chain.
    #[must_use]
    pub fn from_actions(actions: impl IntoIterator<Item = PendingAction>) -> Self {
        let mut log = Self::new();
        for action in actions {
            log.dispatch(action);
        }
        log
    }

    /// Iterates over the logged actions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LoggedAction> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::address;

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const BOB: Address = address!("00000000000000000000000000000000000000b0");

    #[test]
    fn empty_log_has_initial_head() {
        let log = ActionLog::new();
        assert_eq!(log.head(), INITIAL_ACTIONS_HASH);
        assert!(log.pending_since(INITIAL_ACTIONS_HASH).unwrap().is_empty());
    }

    #[test]
    fn dispatch_extends_the_chain() {
        let mut log = ActionLog::new();
        let first = log.dispatch(PendingAction::Deposit { address: ALICE, amount: 10 });
        let second = log.dispatch(PendingAction::Claim { address: ALICE });

        assert_eq!(first, chain(INITIAL_ACTIONS_HASH, &PendingAction::Deposit { address: ALICE, amount: 10 }));
        assert_eq!(second, chain(first, &PendingAction::Claim { address: ALICE }));
        assert_eq!(log.head(), second);
    }

    #[test]
    fn identical_actions_are_distinct_entries() {
        let mut log = ActionLog::new();
        let action = PendingAction::Claim { address: BOB };
        let first = log.dispatch(action);
        let second = log.dispatch(action);

        assert_ne!(first, second);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn pending_since_returns_suffix_in_order() {
        let mut log = ActionLog::new();
        let checkpoint = log.dispatch(PendingAction::Deposit { address: ALICE, amount: 1 });
        log.dispatch(PendingAction::Deposit { address: BOB, amount: 2 });
        log.dispatch(PendingAction::Withdraw { address: ALICE });

        let pending: Vec<_> =
            log.pending_since(checkpoint).unwrap().into_iter().map(|entry| entry.action).collect();
        assert_eq!(
            pending,
            vec![
                PendingAction::Deposit { address: BOB, amount: 2 },
                PendingAction::Withdraw { address: ALICE },
            ]
        );
        assert!(log.pending_since(log.head()).unwrap().is_empty());
    }

    #[test]
    fn pending_since_borrows_the_log_tail() {
        let mut log = ActionLog::new();
        for amount in 0..8 {
            log.dispatch(PendingAction::Deposit { address: ALICE, amount });
        }
        let checkpoint = log.iter().nth(5).unwrap().actions_hash;

        let pending = log.pending_since(checkpoint).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].action, PendingAction::Deposit { address: ALICE, amount: 6 });
        assert_eq!(pending.last().unwrap().actions_hash, log.head());
        assert!(std::ptr::eq(pending.as_ptr(), &log.entries[6]));
        assert_eq!(log.pending_since(INITIAL_ACTIONS_HASH).unwrap().len(), 8);
    }

    #[test]
    fn pending_since_rejects_unknown_checkpoint() {
        let log = ActionLog::new();
        let unknown = B256::repeat_byte(7);
        assert_eq!(log.pending_since(unknown), Err(FarmPanic::UnknownActionsHash { hash: unknown }));
    }

    #[test]
    fn kinds_hash_differently() {
        let withdraw = PendingAction::Withdraw { address: ALICE };
        let claim = PendingAction::Claim { address: ALICE };
        assert_ne!(withdraw.hash(), claim.hash());
        assert_eq!(withdraw.address(), ALICE);
    }

    #[test]
    fn rebuilt_log_has_same_head() {
        let mut log = ActionLog::new();
        log.dispatch(PendingAction::Deposit { address: ALICE, amount: 5 });
        log.dispatch(PendingAction::Withdraw { address: ALICE });

        let rebuilt = ActionLog::from_actions(log.iter().map(|entry| entry.action));
        assert_eq!(rebuilt, log);
    }
}
