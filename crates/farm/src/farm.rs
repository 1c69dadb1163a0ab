//! Farm.
//!
//! This module contains the public operation surface of the farm: it validates preconditions,
//! dispatches actions into the log and drives the rollup engine.

use alloy_primitives::{Address, B256};
use tracing::{debug, info, warn};

use crate::{
    actions::{ActionLog, LoggedAction, PendingAction, INITIAL_ACTIONS_HASH},
    context::{Authorizer, ExecutionContext, SenderAuthorizer},
    errors::{FarmError, FarmPanic, FarmRevert},
    events::{EventSink, FarmEvent},
    offchain::OffchainState,
    receipts::{Checkpoint, RollupReceipt},
    rollup::RollupEngine,
    settings::FarmSettings,
    sol::{DelegatorRecord, FarmData},
    verifier::{PermissionCertificate, PermissionVerifier},
};

/// The admin of a farm that has not been started yet.
pub const DEFAULT_ADMIN: Address = Address::ZERO;

/// A staking farm whose ledger lives in an [`OffchainState`] committed to by a single root.
#[derive(Debug, Clone)]
pub struct Farm<A: Authorizer = SenderAuthorizer> {
    /// The economic parameters.
    pub(crate) settings: FarmSettings,
    /// Decides who may dispatch actions for an address.
    pub(crate) authorizer: A,
    /// The admin, [`DEFAULT_ADMIN`] until the farm is started.
    pub(crate) admin: Address,
    /// The reward distributed per block.
    pub(crate) reward_per_block: u64,
    /// The height the pool accumulator was last refreshed at.
    pub(crate) last_update_height: u32,
    /// The committed offchain state root.
    pub(crate) root: B256,
    /// The actions hash consumed by the last rollup.
    pub(crate) actions_hash: B256,
    /// Every dispatched action.
    pub(crate) actions: ActionLog,
    /// The offchain store, if one is provisioned for this instance.
    pub(crate) store: Option<OffchainState>,
}

impl<A: Authorizer> Farm<A> {
    /// Deploys a farm with a freshly provisioned offchain store.
    pub fn new(settings: FarmSettings, authorizer: A) -> Self {
        let store = OffchainState::new(settings.initial_farm_data());
        let root = store.root();
        info!("deployed farm with root {}", root);
        Self {
            reward_per_block: settings.initial_reward_per_block,
            settings,
            authorizer,
            admin: DEFAULT_ADMIN,
            last_update_height: 0,
            root,
            actions_hash: INITIAL_ACTIONS_HASH,
            actions: ActionLog::new(),
            store: Some(store),
        }
    }

    /// Sets the admin and starts accruing rewards from the current height.
    ///
    /// Can only be called once. The new admin must not be [`DEFAULT_ADMIN`].
    pub fn start_farm(&mut self, ctx: &ExecutionContext, new_admin: Address) -> Result<(), FarmError> {
        info!("START_FARM(admin: {}, height: {})", new_admin, ctx.height);
        if self.admin != DEFAULT_ADMIN {
            return Err(FarmRevert::AlreadyInitialized { admin: self.admin }.into());
        }
        if new_admin == DEFAULT_ADMIN {
            return Err(FarmRevert::InvalidAdmin { admin: new_admin }.into());
        }
        self.admin = new_admin;
        self.last_update_height = ctx.height;
        Ok(())
    }

    /// Dispatches a deposit of `amount` for `address`.
    pub fn deposit(
        &mut self,
        ctx: &ExecutionContext,
        address: Address,
        amount: u64,
    ) -> Result<B256, FarmError> {
        self.dispatch(ctx, PendingAction::Deposit { address, amount })
    }

    /// Dispatches a full withdrawal for `address`.
    pub fn withdraw(&mut self, ctx: &ExecutionContext, address: Address) -> Result<B256, FarmError> {
        self.dispatch(ctx, PendingAction::Withdraw { address })
    }

    /// Dispatches a reward claim for `address`.
    pub fn claim(&mut self, ctx: &ExecutionContext, address: Address) -> Result<B256, FarmError> {
        self.dispatch(ctx, PendingAction::Claim { address })
    }

    /// Authorizes and appends an action to the log. No balance changes until the next rollup.
    fn dispatch(&mut self, ctx: &ExecutionContext, action: PendingAction) -> Result<B256, FarmError> {
        info!("DISPATCH({:?})", action);
        self.authorizer.authorize(ctx, action.address())?;
        Ok(self.actions.dispatch(action))
    }

    /// Updates the reward per block under a verified, height-bounded permission.
    pub fn update_rewards_per_block<V: PermissionVerifier>(
        &mut self,
        ctx: &ExecutionContext,
        verifier: &V,
        certificate: &PermissionCertificate,
        new_reward_per_block: u64,
    ) -> Result<(), FarmError> {
        info!("UPDATE_REWARDS_PER_BLOCK({} -> {})", self.reward_per_block, new_reward_per_block);

        debug!("verify permission certificate");
        verifier.verify(certificate).map_err(|err| {
            warn!("permission certificate rejected: {}", err);
            FarmRevert::InvalidProof
        })?;

        debug!("check permission has not expired");
        let until = certificate.permission_until_block_height();
        if ctx.height >= until {
            return Err(FarmRevert::AuthorizationExpired { height: ctx.height, until }.into());
        }

        self.reward_per_block = new_reward_per_block;
        Ok(())
    }

    /// Folds the oldest pending actions into a new root and actions hash.
    ///
    /// At most [`FarmSettings::max_actions_per_rollup`] actions are folded per call. Returns
    /// `Ok(None)` without touching any state when nothing is pending or no offchain store is
    /// provisioned. On error, nothing is committed.
    pub fn rollup<S: EventSink>(
        &mut self,
        ctx: &ExecutionContext,
        sink: &mut S,
    ) -> Result<Option<RollupReceipt>, FarmError> {
        let Some(store) = self.store.as_mut() else {
            warn!("skipping rollup, no offchain state provisioned for this farm");
            return Ok(None);
        };

        let pending = self.actions.pending_since(self.actions_hash)?;
        if pending.is_empty() {
            info!("skipping rollup, no pending actions");
            return Ok(None);
        }

        debug!("check offchain store matches the committed root");
        let store_root = store.root();
        if store_root != self.root {
            return Err(
                FarmPanic::StateRootMismatch { expected: self.root, actual: store_root }.into()
            );
        }

        let batch = &pending[..pending.len().min(self.settings.max_actions_per_rollup.max(1))];
        info!(
            "ROLLUP(height: {}, actions: {} of {} pending)",
            ctx.height,
            batch.len(),
            pending.len()
        );

        let engine =
            RollupEngine::new(store, &self.settings, self.reward_per_block, self.last_update_height);
        let outcome = match engine.fold(ctx.height, batch) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("rollup aborted, discarding staged writes: {}", err);
                store.discard();
                return Err(err.into());
            }
        };

        // Commit the store, the actions hash and the root together.
        let old = Checkpoint { root: self.root, actions_hash: self.actions_hash };
        let new = Checkpoint {
            root: store.commit(),
            actions_hash: batch.last().map_or(self.actions_hash, |entry| entry.actions_hash),
        };
        self.root = new.root;
        self.actions_hash = new.actions_hash;
        self.last_update_height = outcome.last_update_height;
        info!("└── root {} -> {}", old.root, new.root);

        for receipt in &outcome.actions {
            sink.emit(FarmEvent::TotalStakedBalance(receipt.total_staked_balance));
            sink.emit(FarmEvent::UserReward {
                address: receipt.action.address(),
                reward: receipt.user_reward,
            });
        }

        Ok(Some(RollupReceipt { height: ctx.height, old, new, actions: outcome.actions }))
    }

    /// The persisted pair of commitments.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint { root: self.root, actions_hash: self.actions_hash }
    }

    /// Actions dispatched but not yet rolled up, oldest first.
    pub fn pending_actions(&self) -> Result<&[LoggedAction], FarmPanic> {
        self.actions.pending_since(self.actions_hash)
    }

    /// The committed root slot, if a store is provisioned.
    #[must_use]
    pub fn farm_data(&self) -> Option<FarmData> {
        self.store.as_ref().map(OffchainState::farm_data)
    }

    /// The committed record of `address`, if a store is provisioned.
    #[must_use]
    pub fn delegator(&self, address: &Address) -> Option<DelegatorRecord> {
        self.store.as_ref().map(|store| store.delegator(address))
    }

    /// The provisioned offchain store.
    #[must_use]
    pub fn store(&self) -> Option<&OffchainState> {
        self.store.as_ref()
    }

    /// Removes the offchain store from this instance. Rollups become no-ops until a store is
    /// attached again.
    pub fn detach_store(&mut self) -> Option<OffchainState> {
        self.store.take()
    }

    /// Provisions an offchain store. Its contents must match the committed root.
    pub fn attach_store(&mut self, store: OffchainState) -> Result<(), FarmPanic> {
        let actual = store.root();
        if actual != self.root {
            return Err(FarmPanic::StateRootMismatch { expected: self.root, actual });
        }
        self.store = Some(store);
        Ok(())
    }

    /// The admin, [`DEFAULT_ADMIN`] before the farm is started.
    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// The reward distributed per block.
    #[must_use]
    pub fn reward_per_block(&self) -> u64 {
        self.reward_per_block
    }

    /// The height the accumulator was last refreshed at.
    #[must_use]
    pub fn last_update_height(&self) -> u32 {
        self.last_update_height
    }

    /// The settings of this farm.
    #[must_use]
    pub fn settings(&self) -> &FarmSettings {
        &self.settings
    }

    /// The full action log.
    #[must_use]
    pub fn action_log(&self) -> &ActionLog {
        &self.actions
    }
}
