//! Tree-anchored issuance: the claim becomes a leaf of the claims tree.

use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::crypto::field::Hash;
use crate::error::Result;
use crate::merkle::MerkleTree;
use crate::storage::Storage;

/// Result of anchoring a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredClaim {
    pub claims_root: Hash,
    pub hi: Hash,
    pub hv: Hash,
}

/// Add `claim` to `claims` under its `(Hi, Hv)`.
///
/// The caller still has to record the prior claims root and recompose the
/// identity state.
///
/// # Errors
///
/// `DuplicateKey` if a claim with the same index is already anchored.
pub fn issue_anchored<S: Storage>(claims: &mut MerkleTree<S>, claim: &Claim) -> Result<AnchoredClaim> {
    let (hi, hv) = claim.hi_hv()?;
    let claims_root = claims.add(hi, hv)?;
    log::debug!("anchored claim hi={hi:?} nonce={}", claim.revocation_nonce());
    Ok(AnchoredClaim { claims_root, hi, hv })
}
