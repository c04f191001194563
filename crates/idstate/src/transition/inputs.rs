//! The state-transition bundle handed to the external circuit.
//!
//! Field order of [`StateTransitionInputs::to_field_elements`]:
//!
//! ```text
//! id
//! old.state  old.claims_root  old.revocation_root  old.roots_root
//! new_state
//! is_old_state_genesis                      (0 or 1)
//! auth_claim                                (8 slots)
//! inclusion proof: existence, siblings      (1 + depth)
//! non-revocation proof: existence, siblings (1 + depth)
//! signature R8x  R8y  S
//! ```
//!
//! Siblings are root side first and zero-padded to the tree depth.
//! Changing this order breaks every circuit that consumes the bundle.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::claim::Claim;
use crate::crypto::field::Hash;
use crate::crypto::keys::PublicKey;
use crate::crypto::signing::{verify_strict, Signature};
use crate::error::{IdentityError, Result};
use crate::identity::aggregate::binds_auth_key;
use crate::identity::id::Id;
use crate::identity::state::TreeState;
use crate::merkle::MerkleProof;
use crate::revocation::nonce_key;
use crate::transition::signer::transition_hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransitionInputs {
    pub id: Id,
    pub old_tree_state: TreeState,
    pub new_state: Hash,
    pub is_old_state_genesis: bool,
    pub auth_claim: Claim,
    pub auth_claim_inclusion_proof: MerkleProof,
    pub auth_claim_non_revocation_proof: MerkleProof,
    pub signature: Signature,
    /// Depth the proofs are padded to.
    pub tree_depth: usize,
}

fn proof_fields(proof: &MerkleProof, depth: usize, out: &mut Vec<Hash>) {
    out.push(Hash::from_u64(u64::from(proof.existence)));
    out.extend(proof.padded_siblings(depth));
}

fn decimals(values: impl IntoIterator<Item = Hash>) -> Vec<String> {
    values.into_iter().map(|h| h.to_decimal()).collect()
}

impl StateTransitionInputs {
    /// Number of field elements for a given depth.
    pub fn field_count(depth: usize) -> usize {
        20 + 2 * depth
    }

    /// The ordered field list consumed by the circuit.
    pub fn to_field_elements(&self) -> Vec<Hash> {
        let mut out = Vec::with_capacity(Self::field_count(self.tree_depth));
        out.push(self.id.to_hash());
        out.push(self.old_tree_state.state);
        out.push(self.old_tree_state.claims_root);
        out.push(self.old_tree_state.revocation_root);
        out.push(self.old_tree_state.roots_root);
        out.push(self.new_state);
        out.push(Hash::from_u64(u64::from(self.is_old_state_genesis)));
        out.extend(self.auth_claim.to_field_elements());
        proof_fields(&self.auth_claim_inclusion_proof, self.tree_depth, &mut out);
        proof_fields(&self.auth_claim_non_revocation_proof, self.tree_depth, &mut out);
        out.push(self.signature.r8x);
        out.push(self.signature.r8y);
        out.push(self.signature.s);
        out
    }

    /// The circuit's JSON input object. Every number is a decimal string.
    pub fn inputs_marshal(&self) -> Result<String> {
        let depth = self.tree_depth;
        let nonrev = &self.auth_claim_non_revocation_proof;
        let (no_aux, aux_hi, aux_hv) = match &nonrev.node_aux {
            Some(aux) => (Hash::ZERO, aux.key, aux.value),
            None => (Hash::from_u64(1), Hash::ZERO, Hash::ZERO),
        };
        let value: Value = json!({
            "userID": self.id.to_hash().to_decimal(),
            "oldUserState": self.old_tree_state.state.to_decimal(),
            "newUserState": self.new_state.to_decimal(),
            "isOldStateGenesis": if self.is_old_state_genesis { "1" } else { "0" },
            "claimsTreeRoot": self.old_tree_state.claims_root.to_decimal(),
            "revTreeRoot": self.old_tree_state.revocation_root.to_decimal(),
            "rootsTreeRoot": self.old_tree_state.roots_root.to_decimal(),
            "authClaim": decimals(self.auth_claim.to_field_elements()),
            "authClaimMtp": decimals(self.auth_claim_inclusion_proof.padded_siblings(depth)),
            "authClaimNonRevMtp": decimals(nonrev.padded_siblings(depth)),
            "authClaimNonRevMtpNoAux": no_aux.to_decimal(),
            "authClaimNonRevMtpAuxHi": aux_hi.to_decimal(),
            "authClaimNonRevMtpAuxHv": aux_hv.to_decimal(),
            "signatureR8x": self.signature.r8x.to_decimal(),
            "signatureR8y": self.signature.r8y.to_decimal(),
            "signatureS": self.signature.s.to_decimal(),
        });
        serde_json::to_string(&value).map_err(|e| IdentityError::SerializationError(e.to_string()))
    }

    /// Re-check the bundle: `auth_key` is the key the auth claim commits
    /// to, the signature over `Hash(old, new)` is by that key, the auth
    /// claim is in the old claims tree and absent from the old revocation
    /// tree.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` for a bad signature or a key the auth claim does
    /// not commit to, `InvalidProof` for a proof that does not hold.
    pub fn verify(&self, auth_key: &PublicKey) -> Result<()> {
        if !binds_auth_key(&self.auth_claim, auth_key) {
            return Err(IdentityError::InvalidSignature);
        }
        let message = transition_hash(&self.old_tree_state.state, &self.new_state)?;
        verify_strict(auth_key, &message, &self.signature)?;

        let (hi, hv) = self.auth_claim.hi_hv()?;
        let inclusion = &self.auth_claim_inclusion_proof;
        if !inclusion.existence || !inclusion.verify(&self.old_tree_state.claims_root, &hi, &hv) {
            return Err(IdentityError::InvalidProof(
                "auth claim is not in the old claims tree".into(),
            ));
        }

        let nonrev = &self.auth_claim_non_revocation_proof;
        let nonce = nonce_key(self.auth_claim.revocation_nonce());
        if nonrev.existence || !nonrev.verify(&self.old_tree_state.revocation_root, &nonce, &Hash::ZERO) {
            return Err(IdentityError::InvalidProof(
                "auth claim is revoked in the old revocation tree".into(),
            ));
        }

        if !self.old_tree_state.is_consistent()? {
            return Err(IdentityError::InconsistentTreeState(
                "old state does not match its roots".into(),
            ));
        }
        Ok(())
    }
}
