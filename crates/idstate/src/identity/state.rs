//! Identity state: the hash binding the three tree roots.

use serde::{Deserialize, Serialize};

use crate::crypto::field::Hash;
use crate::crypto::poseidon::hash_elems;
use crate::error::Result;
use crate::merkle::MerkleTree;
use crate::storage::Storage;

/// `Hash(claimsRoot, revocationRoot, rootsRoot)`.
pub fn compose_state(claims_root: &Hash, revocation_root: &Hash, roots_root: &Hash) -> Result<Hash> {
    hash_elems(&[*claims_root, *revocation_root, *roots_root])
}

/// Record a superseded claims root in the roots tree.
///
/// Called once per claims-tree mutation, before the new state is
/// composed. The value stored is zero.
///
/// # Errors
///
/// `DuplicateKey` if the root was already recorded.
pub fn record_root_transition<S: Storage>(
    roots: &mut MerkleTree<S>,
    prior_claims_root: &Hash,
) -> Result<Hash> {
    roots.add(*prior_claims_root, Hash::ZERO)
}

/// Snapshot of an identity's roots and the state they compose to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub state: Hash,
    pub claims_root: Hash,
    pub revocation_root: Hash,
    pub roots_root: Hash,
}

impl TreeState {
    pub fn new(claims_root: Hash, revocation_root: Hash, roots_root: Hash) -> Result<Self> {
        Ok(Self {
            state: compose_state(&claims_root, &revocation_root, &roots_root)?,
            claims_root,
            revocation_root,
            roots_root,
        })
    }

    /// Snapshot the working roots of three trees.
    pub fn of_trees<S: Storage>(
        claims: &MerkleTree<S>,
        revocations: &MerkleTree<S>,
        roots: &MerkleTree<S>,
    ) -> Result<Self> {
        Self::new(claims.root(), revocations.root(), roots.root())
    }

    /// Whether `state` really is the composition of the three roots.
    pub fn is_consistent(&self) -> Result<bool> {
        Ok(compose_state(&self.claims_root, &self.revocation_root, &self.roots_root)? == self.state)
    }
}
