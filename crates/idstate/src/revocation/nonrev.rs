//! Revocation tree operations and non-revocation proofs.

use serde::{Deserialize, Serialize};

use crate::crypto::field::Hash;
use crate::error::Result;
use crate::merkle::{MerkleProof, MerkleTree};
use crate::storage::Storage;

/// A revocation nonce as a tree key.
pub fn nonce_key(nonce: u64) -> Hash {
    Hash::from_u64(nonce)
}

/// Mark `nonce` revoked. The stored value is zero.
///
/// # Errors
///
/// `DuplicateKey` if the nonce is already revoked.
pub fn revoke<S: Storage>(revocations: &mut MerkleTree<S>, nonce: u64) -> Result<Hash> {
    let root = revocations.add(nonce_key(nonce), Hash::ZERO)?;
    log::debug!("revoked nonce {nonce}");
    Ok(root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationStatus {
    NotRevoked,
    Revoked,
}

impl RevocationStatus {
    pub fn from_proof(proof: &MerkleProof) -> Self {
        if proof.existence {
            RevocationStatus::Revoked
        } else {
            RevocationStatus::NotRevoked
        }
    }
}

/// A revocation-tree proof for one nonce, bound to the root it was made
/// against. Trusting it also requires trusting that root, i.e. that it is
/// the revocation root of a known identity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevocationProof {
    pub nonce: u64,
    pub root: Hash,
    pub proof: MerkleProof,
}

impl NonRevocationProof {
    pub fn status(&self) -> RevocationStatus {
        RevocationStatus::from_proof(&self.proof)
    }

    /// Check the proof against its root.
    pub fn verify(&self) -> bool {
        self.proof.verify(&self.root, &nonce_key(self.nonce), &Hash::ZERO)
    }
}

/// Prove whether `nonce` is in the revocation tree at `root`.
pub fn prove_not_revoked<S: Storage>(
    revocations: &MerkleTree<S>,
    nonce: u64,
    root: &Hash,
) -> Result<NonRevocationProof> {
    let (proof, _) = revocations.generate_proof(&nonce_key(nonce), root)?;
    Ok(NonRevocationProof {
        nonce,
        root: *root,
        proof,
    })
}
