#![allow(dead_code)]

use alloy_primitives::{keccak256, Address};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use farm_core::{
    context::ExecutionContext,
    events::FarmEvent,
    farm::Farm,
    settings::{FarmSettings, ZeroStakePolicy},
    signing::permission_message,
    sol::{DelegatorRecord, FarmData, PermissionInput},
    verifier::PermissionCertificate,
};

/// Creates a signer from a string key.
///
/// The key is hashed using keccak256 to generate the private key.
#[must_use]
pub fn signer(key: &str) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&keccak256(key)).unwrap()
}

/// Test environment containing the farm and its participants.
pub struct FarmTestContext {
    /// The farm under test.
    pub farm: Farm,
    /// The admin signer.
    pub admin: PrivateKeySigner,
    /// The first delegator.
    pub alice: PrivateKeySigner,
    /// The second delegator.
    pub bob: PrivateKeySigner,
    /// Events emitted by rollups.
    pub events: Vec<FarmEvent>,
}

/// The settings of the reference deployment: scale 100, 5 reward per block, accumulator 3 and
/// pool total 2 at deployment.
#[must_use]
pub fn test_settings() -> FarmSettings {
    FarmSettings {
        accuracy_scale: 100,
        initial_reward_per_block: 5,
        initial_accumulated_rewards_per_share: 3,
        initial_total_staked_balance: 2,
        max_actions_per_rollup: 4,
        zero_stake_policy: ZeroStakePolicy::Skip,
    }
}

/// Deploys a farm with `settings` without starting it.
#[must_use]
pub fn deploy(settings: FarmSettings) -> FarmTestContext {
    FarmTestContext {
        farm: Farm::new(settings, Default::default()),
        admin: signer("admin"),
        alice: signer("alice"),
        bob: signer("bob"),
        events: Vec::new(),
    }
}

/// Deploys a farm with [`test_settings`] and starts it at height 0.
#[must_use]
pub fn setup() -> FarmTestContext {
    let mut test = deploy(test_settings());
    let admin = test.admin.address();
    test.farm.start_farm(&ctx(0, admin), admin).unwrap();
    test
}

/// Creates an execution context.
#[must_use]
pub fn ctx(height: u32, sender: Address) -> ExecutionContext {
    ExecutionContext::new(height, sender)
}

/// Signs a reward-rate permission valid below `until`.
pub fn permission(signer: &PrivateKeySigner, until: u32) -> PermissionCertificate {
    let input = PermissionInput { permissionUntilBlockHeight: until, account: signer.address() };
    let signature = signer.sign_message_sync(&permission_message(&input)).unwrap();
    PermissionCertificate { input, proof: signature.as_bytes().to_vec() }
}

impl FarmTestContext {
    /// Rolls up at `height`, recording events.
    pub fn rollup(&mut self, height: u32) -> Option<farm_core::receipts::RollupReceipt> {
        let sender = self.admin.address();
        self.farm.rollup(&ctx(height, sender), &mut self.events).unwrap()
    }

    /// Rolls up repeatedly at `height` until nothing is pending.
    pub fn drain(&mut self, height: u32) -> usize {
        let mut rollups = 0;
        while self.rollup(height).is_some() {
            rollups += 1;
        }
        rollups
    }

    /// Deposits `amount` for `signer`, signed by the signer.
    pub fn deposit(&mut self, height: u32, signer: &PrivateKeySigner, amount: u64) {
        self.farm.deposit(&ctx(height, signer.address()), signer.address(), amount).unwrap();
    }

    /// Withdraws for `signer`, signed by the signer.
    pub fn withdraw(&mut self, height: u32, signer: &PrivateKeySigner) {
        self.farm.withdraw(&ctx(height, signer.address()), signer.address()).unwrap();
    }

    /// Claims for `signer`, signed by the signer.
    pub fn claim(&mut self, height: u32, signer: &PrivateKeySigner) {
        self.farm.claim(&ctx(height, signer.address()), signer.address()).unwrap();
    }

    /// The rewards settled for `address`, in event order.
    pub fn rewards_of(&self, address: Address) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|event| match event {
                FarmEvent::UserReward { address: a, reward } if *a == address => Some(*reward),
                _ => None,
            })
            .collect()
    }
}

/// Asserts the committed record of `address`.
pub fn assert_delegator(test: &FarmTestContext, address: Address, start: u64, balance: u64) {
    let record = test.farm.delegator(&address).unwrap();
    assert_eq!(record, DelegatorRecord::new(start, balance), "delegator {address}");
}

/// Asserts the committed root slot.
pub fn assert_farm_data(test: &FarmTestContext, accumulated: u64, total: u64) {
    let farm_data = test.farm.farm_data().unwrap();
    assert_eq!(
        farm_data,
        FarmData { accumulatedRewardsPerShare: accumulated, totalStakedBalance: total }
    );
}

/// Asserts that the pool total is the seeded total plus every delegator balance.
pub fn assert_conservation(test: &FarmTestContext) {
    let store = test.farm.store().unwrap();
    let staked: u64 = store.delegators().map(|(_, record)| record.balance).sum();
    let seeded = test.farm.settings().initial_total_staked_balance;
    assert_eq!(store.farm_data().totalStakedBalance, seeded + staked);
}
