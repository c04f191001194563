//! Inclusion and non-inclusion proofs.

use serde::{Deserialize, Serialize};

use crate::crypto::field::Hash;
use crate::crypto::poseidon::hash_elems;
use crate::error::{IdentityError, Result};
use crate::merkle::node::leaf_key;

/// The leaf found where the searched key's path ended, when that leaf
/// belongs to a different key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAux {
    pub key: Hash,
    pub value: Hash,
}

/// A Merkle proof for one key.
///
/// `siblings[i]` is the sibling at depth `i`, root side first. A
/// non-existence proof either ends at an empty subtree (`node_aux` is
/// `None`) or at another key's leaf (`node_aux` names it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    pub existence: bool,
    pub siblings: Vec<Hash>,
    pub node_aux: Option<NodeAux>,
}

impl MerkleProof {
    /// Number of levels walked before the path ended.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Siblings padded with zeros to `len`. A proof longer than `len`
    /// is returned unpadded.
    pub fn padded_siblings(&self, len: usize) -> Vec<Hash> {
        let mut out = self.siblings.clone();
        if out.len() < len {
            out.resize(len, Hash::ZERO);
        }
        out
    }

    /// Recompute the root this proof commits to for `(key, value)`.
    ///
    /// # Errors
    ///
    /// `InvalidProof` when a non-existence proof names `key` itself as
    /// the diverging leaf.
    pub fn root_from_proof(&self, key: &Hash, value: &Hash) -> Result<Hash> {
        let mut mid = if self.existence {
            leaf_key(key, value)?
        } else if let Some(aux) = &self.node_aux {
            if aux.key == *key {
                return Err(IdentityError::InvalidProof(
                    "non-existence proof names the searched key as its diverging leaf".into(),
                ));
            }
            leaf_key(&aux.key, &aux.value)?
        } else {
            Hash::ZERO
        };

        for (lvl, sibling) in self.siblings.iter().enumerate().rev() {
            mid = if key.bit(lvl) {
                hash_elems(&[*sibling, mid])?
            } else {
                hash_elems(&[mid, *sibling])?
            };
        }
        Ok(mid)
    }

    /// Check the proof against `root`. For non-existence proofs `value`
    /// is ignored.
    pub fn verify(&self, root: &Hash, key: &Hash, value: &Hash) -> bool {
        matches!(self.root_from_proof(key, value), Ok(r) if r == *root)
    }
}

/// Free-standing form of [`MerkleProof::verify`].
pub fn verify_proof(root: &Hash, proof: &MerkleProof, key: &Hash, value: &Hash) -> bool {
    proof.verify(root, key, value)
}
