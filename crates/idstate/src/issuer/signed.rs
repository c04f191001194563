//! Signature-only issuance: no tree changes, just a signature over the
//! claim hash.

use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::crypto::keys::PublicKey;
use crate::crypto::signing::{self, Signature, StateSigner};
use crate::error::{IdentityError, Result};

/// A claim together with its issuer's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedClaim {
    pub claim: Claim,
    pub signature: Signature,
    pub issuer_key: PublicKey,
}

impl SignedClaim {
    /// Check the signature against the embedded issuer key.
    pub fn verify(&self) -> bool {
        verify_signed(&self.claim, &self.signature, &self.issuer_key)
    }

    /// Check the signature against an expected issuer key.
    pub fn verify_with(&self, issuer_key: &PublicKey) -> bool {
        self.issuer_key == *issuer_key && self.verify()
    }
}

/// Sign `Hash(Hi, Hv)` of `claim`.
pub fn issue_signed<K: StateSigner + ?Sized>(claim: &Claim, signer: &K) -> Result<SignedClaim> {
    let message = claim.claim_hash()?;
    let signature = signer.sign_poseidon(&message)?;
    let issuer_key = signer
        .public_key()
        .map_err(|e| IdentityError::SigningFailure(e.to_string()))?;
    log::debug!("signed claim nonce={}", claim.revocation_nonce());
    Ok(SignedClaim {
        claim: *claim,
        signature,
        issuer_key,
    })
}

/// True iff `signature` was made over this exact claim by `issuer_key`.
pub fn verify_signed(claim: &Claim, signature: &Signature, issuer_key: &PublicKey) -> bool {
    match claim.claim_hash() {
        Ok(message) => signing::verify(issuer_key, &message, signature),
        Err(_) => false,
    }
}
