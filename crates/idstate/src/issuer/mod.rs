//! Claim issuance in its two modes.

pub mod anchored;
pub mod signed;

use crate::claim::Claim;
use crate::crypto::signing::StateSigner;
use crate::error::Result;
use crate::merkle::MerkleTree;
use crate::storage::Storage;

pub use anchored::{issue_anchored, AnchoredClaim};
pub use signed::{issue_signed, verify_signed, SignedClaim};

/// How a claim is issued.
pub enum IssuanceMode<'a, S: Storage, K: StateSigner + ?Sized> {
    /// Add the claim to the claims tree. The identity state changes and a
    /// signed state transition must follow.
    TreeAnchored { claims: &'a mut MerkleTree<S> },
    /// Sign the claim hash. No tree or state changes.
    SignatureOnly { signer: &'a K },
}

#[derive(Debug, Clone)]
pub enum Issued {
    Anchored(AnchoredClaim),
    Signed(SignedClaim),
}

/// Issue `claim` in the given mode.
pub fn issue<S: Storage, K: StateSigner + ?Sized>(
    mode: IssuanceMode<'_, S, K>,
    claim: &Claim,
) -> Result<Issued> {
    match mode {
        IssuanceMode::TreeAnchored { claims } => issue_anchored(claims, claim).map(Issued::Anchored),
        IssuanceMode::SignatureOnly { signer } => issue_signed(claim, signer).map(Issued::Signed),
    }
}
