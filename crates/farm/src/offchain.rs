//! Offchain State.
//!
//! The authenticated store of one farm instance: a delegator map and a single root-keyed
//! [`FarmData`] slot, both committed to by one root hash. Writes are staged and only become part
//! of the committed contents, and thus of the root, on [`OffchainState::commit`].

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolValue;
use tracing::debug;

use crate::{
    merkle::{MerkleProof, MerkleStorage},
    sol::{DelegatorRecord, FarmData},
    storage::Storage,
};

/// The authenticated key/value store backing a farm.
#[derive(Debug, Clone)]
pub struct OffchainState {
    /// The committed delegator records.
    delegators: MerkleStorage<Address, DelegatorRecord>,
    /// The committed root slot.
    farm_data: FarmData,
    /// Delegator writes staged since the last commit.
    staged_delegators: BTreeMap<Address, DelegatorRecord>,
    /// Root slot write staged since the last commit.
    staged_farm_data: Option<FarmData>,
}

impl OffchainState {
    /// Creates a store holding `farm_data` in its root slot and no delegators.
    #[must_use]
    pub fn new(farm_data: FarmData) -> Self {
        Self {
            delegators: MerkleStorage::new(),
            farm_data,
            staged_delegators: BTreeMap::new(),
            staged_farm_data: None,
        }
    }

    /// Rebuilds a store from committed contents.
    #[must_use]
    pub fn from_parts(
        farm_data: FarmData,
        delegators: impl IntoIterator<Item = (Address, DelegatorRecord)>,
    ) -> Self {
        let mut state = Self::new(farm_data);
        for (address, record) in delegators {
            state.delegators.insert(address, record);
        }
        state
    }

    /// The root commitment over the committed contents.
    ///
    /// Staged writes do not affect the root until they are committed.
    #[must_use]
    pub fn root(&self) -> B256 {
        let container = self.farm_data.container(self.delegators.root());
        keccak256(container.abi_encode())
    }

    /// Reads the root slot, including a staged write.
    #[must_use]
    pub fn farm_data(&self) -> FarmData {
        self.staged_farm_data.clone().unwrap_or_else(|| self.farm_data.clone())
    }

    /// Stages a write of the root slot.
    pub fn set_farm_data(&mut self, farm_data: FarmData) {
        self.staged_farm_data = Some(farm_data);
    }

    /// Reads a delegator record, including staged writes.
    ///
    /// Addresses that were never written read as the zero record.
    #[must_use]
    pub fn delegator(&self, address: &Address) -> DelegatorRecord {
        match self.staged_delegators.get(address) {
            Some(record) => record.clone(),
            None => self.delegators.get_or_default(address),
        }
    }

    /// Stages a write of a delegator record.
    pub fn set_delegator(&mut self, address: Address, record: DelegatorRecord) {
        self.staged_delegators.insert(address, record);
    }

    /// Whether any writes are staged.
    #[must_use]
    pub fn has_staged(&self) -> bool {
        self.staged_farm_data.is_some() || !self.staged_delegators.is_empty()
    }

    /// Materializes all staged writes and returns the new root.
    pub fn commit(&mut self) -> B256 {
        debug!(
            "commit {} delegator writes, farm data staged: {}",
            self.staged_delegators.len(),
            self.staged_farm_data.is_some()
        );
        if let Some(farm_data) = self.staged_farm_data.take() {
            self.farm_data = farm_data;
        }
        for (address, record) in std::mem::take(&mut self.staged_delegators) {
            self.delegators.insert(address, record);
        }
        self.root()
    }

    /// Drops all staged writes. The root is unchanged.
    pub fn discard(&mut self) {
        self.staged_farm_data = None;
        self.staged_delegators.clear();
    }

    /// Iterates over the committed delegator records.
    pub fn delegators(&self) -> impl Iterator<Item = (&Address, &DelegatorRecord)> {
        self.delegators.iter()
    }

    /// The root of the committed delegator map.
    #[must_use]
    pub fn delegators_root(&self) -> B256 {
        self.delegators.root()
    }

    /// A merkle proof of the committed record of `address` against [`Self::delegators_root`].
    #[must_use]
    pub fn delegator_proof(&self, address: &Address) -> MerkleProof<Address, DelegatorRecord> {
        self.delegators.proof(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::address;

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");

    fn genesis() -> FarmData {
        FarmData { accumulatedRewardsPerShare: 3, totalStakedBalance: 2 }
    }

    #[test]
    fn staged_writes_are_visible_but_uncommitted() {
        let mut state = OffchainState::new(genesis());
        let root = state.root();

        state.set_delegator(ALICE, DelegatorRecord::new(3, 30));
        state.set_farm_data(FarmData { accumulatedRewardsPerShare: 3, totalStakedBalance: 32 });

        assert_eq!(state.delegator(&ALICE), DelegatorRecord::new(3, 30));
        assert_eq!(state.farm_data().totalStakedBalance, 32);
        assert!(state.has_staged());
        assert_eq!(state.root(), root);
    }

    #[test]
    fn commit_materializes_writes_into_the_root() {
        let mut state = OffchainState::new(genesis());
        let root = state.root();

        state.set_delegator(ALICE, DelegatorRecord::new(3, 30));
        let new_root = state.commit();

        assert_ne!(new_root, root);
        assert_eq!(state.root(), new_root);
        assert!(!state.has_staged());

        let proof = state.delegator_proof(&ALICE);
        assert_eq!(proof.value, Some(DelegatorRecord::new(3, 30)));
        assert!(MerkleStorage::verify_proof(state.delegators_root(), &proof).is_ok());
    }

    #[test]
    fn discard_leaves_root_and_contents_unchanged() {
        let mut state = OffchainState::new(genesis());
        let root = state.root();

        state.set_delegator(ALICE, DelegatorRecord::new(3, 30));
        state.set_farm_data(FarmData::default());
        state.discard();

        assert_eq!(state.root(), root);
        assert_eq!(state.delegator(&ALICE), DelegatorRecord::default());
        assert_eq!(state.farm_data(), genesis());
    }

    #[test]
    fn rebuilt_store_has_same_root() {
        let mut state = OffchainState::new(genesis());
        state.set_delegator(ALICE, DelegatorRecord::new(1, 2));
        let root = state.commit();

        let rebuilt = OffchainState::from_parts(
            state.farm_data(),
            state.delegators().map(|(address, record)| (*address, record.clone())),
        );
        assert_eq!(rebuilt.root(), root);
    }
}
