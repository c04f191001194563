//! Signing a state transition and assembling its bundle.

use crate::claim::Claim;
use crate::crypto::field::Hash;
use crate::crypto::poseidon::hash_elems;
use crate::crypto::signing::StateSigner;
use crate::error::{IdentityError, Result};
use crate::identity::id::Id;
use crate::identity::state::TreeState;
use crate::merkle::MerkleProof;
use crate::transition::inputs::StateTransitionInputs;

/// The message signed for a transition: `Hash(old_state, new_state)`.
pub fn transition_hash(old_state: &Hash, new_state: &Hash) -> Result<Hash> {
    hash_elems(&[*old_state, *new_state])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// The old state is the genesis state.
    Genesis,
    Incremental,
}

/// The auth claim and its proofs against the old state.
#[derive(Debug, Clone)]
pub struct AuthEvidence {
    pub claim: Claim,
    pub inclusion: MerkleProof,
    pub non_revocation: MerkleProof,
}

/// Signs transitions for one identity.
#[derive(Debug, Clone)]
pub struct StateTransitionSigner {
    id: Id,
    genesis_state: Hash,
    tree_depth: usize,
}

impl StateTransitionSigner {
    pub fn new(id: Id, genesis_state: Hash, tree_depth: usize) -> Self {
        Self {
            id,
            genesis_state,
            tree_depth,
        }
    }

    pub fn phase(&self, old: &TreeState) -> TransitionPhase {
        if old.state == self.genesis_state {
            TransitionPhase::Genesis
        } else {
            TransitionPhase::Incremental
        }
    }

    /// Sign the move from `old` to `new` and assemble the bundle.
    ///
    /// `applied_to` is the claims root the mutation actually started from.
    ///
    /// # Errors
    ///
    /// `InconsistentTreeState` if the mutation did not start from
    /// `old.claims_root`, `new` does not compose, or nothing changed;
    /// `SigningFailure` if the signer rejects the message.
    pub fn sign<K: StateSigner + ?Sized>(
        &self,
        signer: &K,
        old: &TreeState,
        applied_to: &Hash,
        new: &TreeState,
        auth: AuthEvidence,
    ) -> Result<StateTransitionInputs> {
        if *applied_to != old.claims_root {
            return Err(IdentityError::InconsistentTreeState(format!(
                "mutation applied to claims root {applied_to}, expected {}",
                old.claims_root
            )));
        }
        if !new.is_consistent()? {
            return Err(IdentityError::InconsistentTreeState(
                "new state does not match its roots".into(),
            ));
        }
        if new.state == old.state {
            return Err(IdentityError::InconsistentTreeState(
                "transition does not change the state".into(),
            ));
        }

        let message = transition_hash(&old.state, &new.state)?;
        let signature = signer.sign_poseidon(&message).map_err(|e| match e {
            IdentityError::SigningFailure(_) => e,
            other => IdentityError::SigningFailure(other.to_string()),
        })?;

        Ok(StateTransitionInputs {
            id: self.id,
            old_tree_state: *old,
            new_state: new.state,
            is_old_state_genesis: self.phase(old) == TransitionPhase::Genesis,
            auth_claim: auth.claim,
            auth_claim_inclusion_proof: auth.inclusion,
            auth_claim_non_revocation_proof: auth.non_revocation,
            signature,
            tree_depth: self.tree_depth,
        })
    }
}
