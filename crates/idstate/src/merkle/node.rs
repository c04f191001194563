//! Tree nodes and their hashes.

use serde::{Deserialize, Serialize};

use crate::crypto::field::Hash;
use crate::crypto::poseidon::hash_elems;
use crate::error::{IdentityError, Result};

/// A node of a sparse Merkle tree.
///
/// Leaves hash three elements `(key, value, 1)` and middle nodes two
/// `(left, right)`. The hash domain includes the input count, so the two
/// kinds can never be confused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Empty,
    Leaf { key: Hash, value: Hash },
    Middle { left: Hash, right: Hash },
}

/// Hash of a leaf holding `(key, value)`.
pub fn leaf_key(key: &Hash, value: &Hash) -> Result<Hash> {
    hash_elems(&[*key, *value, Hash::from_u64(1)])
}

impl Node {
    /// The hash this node is stored and referenced under.
    pub fn key(&self) -> Result<Hash> {
        match self {
            Node::Empty => Ok(Hash::ZERO),
            Node::Leaf { key, value } => leaf_key(key, value),
            Node::Middle { left, right } => hash_elems(&[*left, *right]),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| IdentityError::SerializationError(format!("tree node: {e}")))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| IdentityError::StorageError(format!("corrupt tree node: {e}")))
    }
}
