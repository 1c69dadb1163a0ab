//! Backups.
//!
//! Snapshots of a farm that can be written to disk and restored later. A snapshot carries the
//! pool meta, the checkpoint pair, the full action log and the committed offchain store.

use std::{fs, path::Path};

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    actions::{ActionLog, PendingAction},
    context::Authorizer,
    errors::FarmPanic,
    farm::Farm,
    offchain::OffchainState,
    receipts::Checkpoint,
    settings::FarmSettings,
    sol::{DelegatorRecord, FarmData},
};

/// Errors that can occur while saving or restoring a [`FarmBackup`].
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum BackupError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed backup: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backup store root {actual} does not match checkpoint root {expected}")]
    RootMismatch { expected: B256, actual: B256 },

    #[error("inconsistent backup: {0}")]
    Inconsistent(#[from] FarmPanic),
}

/// The committed contents of an offchain store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreBackup {
    /// The root slot.
    pub farm_data: FarmData,
    /// Every delegator record.
    pub delegators: Vec<(Address, DelegatorRecord)>,
}

/// A serializable snapshot of a [`Farm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmBackup {
    /// The settings of the farm.
    pub settings: FarmSettings,
    /// The admin.
    pub admin: Address,
    /// The reward per block.
    pub reward_per_block: u64,
    /// The height of the last pool refresh.
    pub last_update_height: u32,
    /// The persisted commitments.
    pub checkpoint: Checkpoint,
    /// Every dispatched action, oldest first.
    pub actions: Vec<PendingAction>,
    /// The offchain store, if provisioned.
    pub store: Option<StoreBackup>,
}

impl FarmBackup {
    /// Writes the backup as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BackupError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("saved farm backup to {}", path.as_ref().display());
        Ok(())
    }

    /// Reads a JSON backup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BackupError> {
        let json = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl<A: Authorizer> Farm<A> {
    /// Takes a snapshot of the committed state.
    #[must_use]
    pub fn backup(&self) -> FarmBackup {
        FarmBackup {
            settings: self.settings.clone(),
            admin: self.admin,
            reward_per_block: self.reward_per_block,
            last_update_height: self.last_update_height,
            checkpoint: self.checkpoint(),
            actions: self.actions.iter().map(|entry| entry.action).collect(),
            store: self.store.as_ref().map(|store| StoreBackup {
                farm_data: store.farm_data(),
                delegators: store
                    .delegators()
                    .map(|(address, record)| (*address, record.clone()))
                    .collect(),
            }),
        }
    }

    /// Restores a farm from a snapshot, checking it against its own checkpoint.
    pub fn restore(backup: FarmBackup, authorizer: A) -> Result<Self, BackupError> {
        let actions = ActionLog::from_actions(backup.actions);
        actions.pending_since(backup.checkpoint.actions_hash)?;

        let store = backup
            .store
            .map(|store| OffchainState::from_parts(store.farm_data, store.delegators));
        if let Some(store) = &store {
            let actual = store.root();
            if actual != backup.checkpoint.root {
                return Err(BackupError::RootMismatch { expected: backup.checkpoint.root, actual });
            }
        }

        info!("restored farm at root {}", backup.checkpoint.root);
        Ok(Self {
            settings: backup.settings,
            authorizer,
            admin: backup.admin,
            reward_per_block: backup.reward_per_block,
            last_update_height: backup.last_update_height,
            root: backup.checkpoint.root,
            actions_hash: backup.checkpoint.actions_hash,
            actions,
            store,
        })
    }
}
