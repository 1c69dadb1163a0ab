//! Merkelized Storage.
//!
//! This module contains the [`MerkleStorage`] data structure, a sparse merkle tree that keeps all
//! non-empty leaves in memory and commits to them with a single root hash.

use std::{collections::BTreeMap, marker::PhantomData, ops::Bound};

use alloy_primitives::{keccak256, Keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{Storage, StorageKey, StorageValue};

/// Merkle tree with key type K and value type V.
///
/// The tree has `2^K::bits()` leaves. Empty subtrees hash to precomputed zero hashes, so only the
/// populated paths are ever hashed.
#[derive(Debug, Clone)]
pub struct MerkleStorage<K: StorageKey, V: StorageValue, H: MerkleTreeHasher = Keccak256> {
    /// Non-empty leaves (index -> (key, value)).
    leaves: BTreeMap<U256, (K, V)>,
    /// Precomputed zero hashes for each layer.
    zero_hashes: Vec<B256>,
    _hasher: PhantomData<H>,
}

/// Errors that can occur during [`MerkleStorage`] operations.
#[derive(Debug, Error, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum MerkleStorageError {
    #[error("Invalid merkle proof provided")]
    InvalidMerkleProof,

    #[error("Invalid merkle proof length: {actual} != {expected}")]
    InvalidMerkleProofLength { expected: usize, actual: usize },
}

/// A merkle proof for a key-value pair in the [`MerkleStorage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof<K: StorageKey, V: StorageValue, H: MerkleTreeHasher = Keccak256> {
    /// The key being accessed.
    pub key: K,
    /// The current value at the key (`None` if the leaf is empty).
    pub value: Option<V>,
    /// The sibling hashes from the leaf up to the root.
    pub proof: Vec<B256>,
    #[serde(skip)]
    _hasher: PhantomData<H>,
}

impl<K: StorageKey, V: StorageValue, H: MerkleTreeHasher> MerkleProof<K, V, H> {
    /// Construct a proof from its parts.
    pub fn new(key: K, value: Option<V>, proof: Vec<B256>) -> Self {
        Self { key, value, proof, _hasher: PhantomData }
    }
}

/// Trait for types that can be used as the hasher in a [`MerkleStorage`].
pub trait MerkleTreeHasher {
    /// Returns the hash of the value.
    fn hash<V: StorageValue>(value: &V) -> B256;

    /// Returns the hash of a pair of child nodes.
    fn hash_pair(left: &B256, right: &B256) -> B256;
}

impl MerkleTreeHasher for Keccak256 {
    fn hash<V: StorageValue>(value: &V) -> B256 {
        keccak256(value.abi_encode())
    }

    fn hash_pair(left: &B256, right: &B256) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize()
    }
}

impl<K: StorageKey, V: StorageValue, H: MerkleTreeHasher> MerkleStorage<K, V, H> {
    /// Returns the merkle root over all leaves.
    #[must_use]
    pub fn root(&self) -> B256 {
        self.node(K::bits(), U256::ZERO)
    }

    /// Returns the number of non-empty leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Iterates over the stored key/value pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.leaves.values().map(|(key, value)| (key, value))
    }

    /// Generate a merkle proof for the value at the given key.
    ///
    /// Proofs for empty leaves prove non-membership.
    #[must_use]
    pub fn proof(&self, key: &K) -> MerkleProof<K, V, H> {
        let mut index = key.index();
        let mut siblings = Vec::with_capacity(K::bits());
        for layer in 0..K::bits() {
            siblings.push(self.node(layer, index ^ U256::ONE));
            index >>= 1;
        }
        let value = self.leaves.get(&key.index()).map(|(_, value)| value.clone());
        MerkleProof::new(key.clone(), value, siblings)
    }

    /// Verify a merkle proof against a root.
    pub fn verify_proof(root: B256, proof: &MerkleProof<K, V, H>) -> Result<(), MerkleStorageError> {
        if proof.proof.len() != K::bits() {
            return Err(MerkleStorageError::InvalidMerkleProofLength {
                expected: K::bits(),
                actual: proof.proof.len(),
            });
        }

        let mut current = proof.value.as_ref().map_or(B256::ZERO, |value| H::hash(value));
        let mut index = proof.key.index();
        for sibling in &proof.proof {
            current = if index & U256::ONE == U256::ZERO {
                H::hash_pair(&current, sibling)
            } else {
                H::hash_pair(sibling, &current)
            };
            index >>= 1;
        }

        if current != root {
            return Err(MerkleStorageError::InvalidMerkleProof);
        }
        Ok(())
    }

    /// Hash of the node at `(layer, index)`, where layer 0 holds the leaves.
    fn node(&self, layer: usize, index: U256) -> B256 {
        if self.is_subtree_empty(layer, index) {
            return self.zero_hashes[layer];
        }
        if layer == 0 {
            return self.leaves.get(&index).map_or(B256::ZERO, |(_, value)| H::hash(value));
        }
        let left = self.node(layer - 1, index << 1);
        let right = self.node(layer - 1, (index << 1) | U256::ONE);
        H::hash_pair(&left, &right)
    }

    /// Whether the subtree rooted at `(layer, index)` holds no leaves.
    fn is_subtree_empty(&self, layer: usize, index: U256) -> bool {
        if layer >= 256 {
            return self.leaves.is_empty();
        }
        let start = index << layer;
        let end = match start.checked_add(U256::ONE << layer) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        self.leaves.range((Bound::Included(start), end)).next().is_none()
    }

    fn compute_zero_hashes() -> Vec<B256> {
        let mut zero_hashes = vec![B256::ZERO; K::bits() + 1];
        for layer in 1..=K::bits() {
            zero_hashes[layer] = H::hash_pair(&zero_hashes[layer - 1], &zero_hashes[layer - 1]);
        }
        zero_hashes
    }
}

impl<K: StorageKey, V: StorageValue, H: MerkleTreeHasher> Default for MerkleStorage<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StorageKey, V: StorageValue, H: MerkleTreeHasher> Storage<K, V> for MerkleStorage<K, V, H> {
    fn new() -> Self {
        Self { leaves: BTreeMap::new(), zero_hashes: Self::compute_zero_hashes(), _hasher: PhantomData }
    }

    fn insert(&mut self, key: K, value: V) {
        self.leaves.insert(key.index(), (key, value));
    }

    fn remove(&mut self, key: &K) {
        self.leaves.remove(&key.index());
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.leaves.get(&key.index()).map(|(_, value)| value)
    }
}
