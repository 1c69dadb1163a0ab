//! Storage traits shared by the merkle store and the offchain state.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;

/// Storage trait providing the key/value operations of the offchain store.
pub trait Storage<K: StorageKey, V: StorageValue> {
    /// Creates a new empty storage.
    fn new() -> Self;

    /// Insert a value at the given key.
    fn insert(&mut self, key: K, value: V);

    /// Remove a value at the given key.
    fn remove(&mut self, key: &K);

    /// Get a value at the given key.
    fn get(&self, key: &K) -> Option<&V>;

    /// Get a copy of the value at the given key, or the default value if the key is unset.
    fn get_or_default(&self, key: &K) -> V
    where
        V: Default,
    {
        self.get(key).cloned().unwrap_or_default()
    }
}

/// Trait for types that can be used as keys in a [`crate::merkle::MerkleStorage`].
pub trait StorageKey: Clone + Eq + std::hash::Hash + Ord {
    /// Converts the key to a [U256] index for the merkle tree.
    fn index(&self) -> U256;

    /// Returns the number of bits in the index space.
    fn bits() -> usize;
}

/// Trait for types that can be used as values in a [`crate::merkle::MerkleStorage`].
pub trait StorageValue: SolValue + Clone {}

impl<T: SolValue + Clone> StorageValue for T {}

impl StorageKey for Address {
    fn index(&self) -> U256 {
        U256::from_be_slice(self.as_slice())
    }

    fn bits() -> usize {
        160
    }
}

impl StorageKey for U256 {
    fn index(&self) -> U256 {
        *self
    }

    fn bits() -> usize {
        256
    }
}
