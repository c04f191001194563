//! An identity: three trees, the auth claim, and the transition protocol.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::claim::{Claim, ClaimCodec, ClaimOptions, SchemaHash, SlotData};
use crate::config::IdentityConfig;
use crate::crypto::field::Hash;
use crate::crypto::keys::PublicKey;
use crate::crypto::signing::StateSigner;
use crate::error::{IdentityError, Result};
use crate::identity::id::Id;
use crate::identity::state::{record_root_transition, TreeState};
use crate::issuer::{issue_anchored, issue_signed, SignedClaim};
use crate::merkle::{MerkleProof, MerkleTree};
use crate::revocation::{self, NonRevocationProof, RevocationStatus};
use crate::storage::{IdentityRecord, Storage};
use crate::transition::{AuthEvidence, StateTransitionInputs, StateTransitionSigner};

/// Backing stores for the three trees of one identity.
#[derive(Debug)]
pub struct TreeStores<S> {
    pub claims: S,
    pub revocations: S,
    pub roots: S,
}

impl<S: Default> Default for TreeStores<S> {
    fn default() -> Self {
        Self {
            claims: S::default(),
            revocations: S::default(),
            roots: S::default(),
        }
    }
}

struct Trees<S: Storage> {
    claims: MerkleTree<S>,
    revocations: MerkleTree<S>,
    roots: MerkleTree<S>,
    current: TreeState,
    transitions: u64,
}

impl<S: Storage> Trees<S> {
    /// Put all three trees back at `self.current`, dropping staged writes
    /// and undoing any tree that committed ahead of a failed sibling.
    fn rewind(&mut self) {
        let current = self.current;
        self.claims.rewind(current.claims_root);
        self.revocations.rewind(current.revocation_root);
        self.roots.rewind(current.roots_root);
    }

    fn commit(&mut self) -> Result<()> {
        self.claims.commit()?;
        self.revocations.commit()?;
        self.roots.commit()
    }
}

/// A self-certifying identity.
///
/// All mutations run under one write lock, so the claims mutation, the
/// roots-tree record and the state recomposition of a transition are
/// atomic with respect to readers. Proof queries take the read lock.
pub struct Identity<S: Storage> {
    id: Id,
    config: IdentityConfig,
    genesis: TreeState,
    auth_claim: Claim,
    auth_key: PublicKey,
    created_at: chrono::DateTime<Utc>,
    signer: StateTransitionSigner,
    trees: RwLock<Trees<S>>,
}

/// Build the auth claim binding `auth_key` under `nonce`.
pub fn auth_claim(auth_key: &PublicKey, nonce: u64) -> Result<Claim> {
    ClaimCodec::new().encode(
        &SchemaHash::auth(),
        &ClaimOptions {
            revocation_nonce: nonce,
            index_data: Some((SlotData::from(auth_key.x()), SlotData::from(auth_key.y()))),
            ..Default::default()
        },
    )
}

/// Whether `claim` is an auth claim committing to `auth_key`.
pub fn binds_auth_key(claim: &Claim, auth_key: &PublicKey) -> bool {
    claim.schema_hash() == SchemaHash::auth() && claim.index_data() == (auth_key.x(), auth_key.y())
}

impl<S: Storage> Identity<S> {
    /// Create an identity whose claims tree holds only the auth claim.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a bad config, `InconsistentTreeState` if any of
    /// the stores already holds a tree.
    pub fn genesis(
        config: IdentityConfig,
        auth_key: &PublicKey,
        auth_nonce: u64,
        stores: TreeStores<S>,
    ) -> Result<Self> {
        config.validate()?;
        let depth = config.tree_depth;
        let mut claims = MerkleTree::new(stores.claims, depth)?;
        let revocations = MerkleTree::new(stores.revocations, depth)?;
        let roots = MerkleTree::new(stores.roots, depth)?;
        if [&claims, &revocations, &roots]
            .iter()
            .any(|t| !t.root().is_zero())
        {
            return Err(IdentityError::InconsistentTreeState(
                "genesis requires empty trees".into(),
            ));
        }

        let auth = auth_claim(auth_key, auth_nonce)?;
        issue_anchored(&mut claims, &auth)?;
        let genesis = TreeState::of_trees(&claims, &revocations, &roots)?;
        let id = Id::from_genesis(config.id_type, &genesis.state);

        let mut trees = Trees {
            claims,
            revocations,
            roots,
            current: genesis,
            transitions: 0,
        };
        trees.commit()?;
        log::info!("created identity {id} with genesis state {}", genesis.state);

        Ok(Self {
            id,
            signer: StateTransitionSigner::new(id, genesis.state, depth),
            config,
            genesis,
            auth_claim: auth,
            auth_key: *auth_key,
            created_at: Utc::now(),
            trees: RwLock::new(trees),
        })
    }

    /// Reopen an identity from its record.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the record was created with another tree depth,
    /// `InvalidId` if the record's id does not derive from its genesis,
    /// `InvalidKey` if the auth claim does not commit to the auth key,
    /// `InconsistentTreeState` if the record's states do not compose.
    pub fn open(config: IdentityConfig, record: IdentityRecord, stores: TreeStores<S>) -> Result<Self> {
        config.validate()?;
        if record.config.tree_depth != config.tree_depth {
            return Err(IdentityError::InvalidConfig(format!(
                "identity uses tree depth {}, config has {}",
                record.config.tree_depth, config.tree_depth
            )));
        }
        if Id::from_genesis(record.id.id_type(), &record.genesis.state) != record.id {
            return Err(IdentityError::InvalidId(
                "identifier does not derive from the genesis state".into(),
            ));
        }
        if !binds_auth_key(&record.auth_claim, &record.auth_key) {
            return Err(IdentityError::InvalidKey(
                "auth claim does not commit to the recorded auth key".into(),
            ));
        }
        if !record.genesis.is_consistent()? || !record.current.is_consistent()? {
            return Err(IdentityError::InconsistentTreeState(
                "recorded state does not match its roots".into(),
            ));
        }

        let depth = config.tree_depth;
        let current = record.current;
        let trees = Trees {
            claims: MerkleTree::open_at(stores.claims, depth, current.claims_root)?,
            revocations: MerkleTree::open_at(stores.revocations, depth, current.revocation_root)?,
            roots: MerkleTree::open_at(stores.roots, depth, current.roots_root)?,
            current,
            transitions: record.transitions,
        };
        log::debug!("opened identity {} at state {}", record.id, current.state);

        Ok(Self {
            id: record.id,
            signer: StateTransitionSigner::new(record.id, record.genesis.state, depth),
            config,
            genesis: record.genesis,
            auth_claim: record.auth_claim,
            auth_key: record.auth_key,
            created_at: record.created_at,
            trees: RwLock::new(trees),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Trees<S>>> {
        self.trees
            .read()
            .map_err(|_| IdentityError::StorageError("identity lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Trees<S>>> {
        self.trees
            .write()
            .map_err(|_| IdentityError::StorageError("identity lock poisoned".into()))
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Run one transition. `mutate` changes the trees; the prior claims
    /// root it started from is passed in. Either all three trees commit or
    /// all three are rewound to the current state, including trees whose
    /// commit already went through.
    fn transition<K, F>(&self, signer: &K, what: &str, mutate: F) -> Result<StateTransitionInputs>
    where
        K: StateSigner + ?Sized,
        F: FnOnce(&mut Trees<S>) -> Result<Hash>,
    {
        let signer_key = signer
            .public_key()
            .map_err(|e| IdentityError::SigningFailure(e.to_string()))?;
        if signer_key != self.auth_key {
            return Err(IdentityError::SigningFailure(
                "signer does not hold the identity's auth key".into(),
            ));
        }

        let mut trees = self.write()?;
        let (inputs, new) = match self.prepare(&mut trees, signer, mutate) {
            Ok(prepared) => prepared,
            Err(e) => {
                trees.rewind();
                log::warn!("{what} for {} discarded: {e}", self.id);
                return Err(e);
            }
        };
        if let Err(e) = trees.commit() {
            trees.rewind();
            log::warn!("{what} for {} failed to commit: {e}", self.id);
            return Err(e);
        }
        trees.current = new;
        trees.transitions += 1;
        log::info!(
            "{what} for {}: state {} -> {}",
            self.id,
            inputs.old_tree_state.state,
            inputs.new_state
        );
        Ok(inputs)
    }

    fn prepare<K, F>(
        &self,
        trees: &mut Trees<S>,
        signer: &K,
        mutate: F,
    ) -> Result<(StateTransitionInputs, TreeState)>
    where
        K: StateSigner + ?Sized,
        F: FnOnce(&mut Trees<S>) -> Result<Hash>,
    {
        let old = trees.current;
        let (hi, _) = self.auth_claim.hi_hv()?;
        let (inclusion, _) = trees.claims.generate_proof(&hi, &old.claims_root)?;
        let nonce = self.auth_claim.revocation_nonce();
        let non_revocation = revocation::prove_not_revoked(&trees.revocations, nonce, &old.revocation_root)?;
        if non_revocation.status() == RevocationStatus::Revoked {
            return Err(IdentityError::SigningFailure(
                "auth claim is revoked".into(),
            ));
        }

        let applied_to = mutate(trees)?;
        let new = TreeState::of_trees(&trees.claims, &trees.revocations, &trees.roots)?;
        let inputs = self.signer.sign(
            signer,
            &old,
            &applied_to,
            &new,
            AuthEvidence {
                claim: self.auth_claim,
                inclusion,
                non_revocation: non_revocation.proof,
            },
        )?;
        Ok((inputs, new))
    }

    /// Anchor `claim` in the claims tree and sign the resulting transition.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the claim's index is already anchored,
    /// `SigningFailure` if the signer fails or is not the auth key.
    /// Nothing is committed on error.
    pub fn issue_claim<K: StateSigner + ?Sized>(
        &self,
        claim: &Claim,
        signer: &K,
    ) -> Result<StateTransitionInputs> {
        self.transition(signer, "claim issuance", |trees| {
            let prior = trees.claims.root();
            issue_anchored(&mut trees.claims, claim)?;
            record_root_transition(&mut trees.roots, &prior)?;
            Ok(prior)
        })
    }

    /// Revoke `nonce` and sign the resulting transition. The claims tree is
    /// unchanged, so no root is recorded.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the nonce is already revoked.
    pub fn revoke_claim<K: StateSigner + ?Sized>(
        &self,
        nonce: u64,
        signer: &K,
    ) -> Result<StateTransitionInputs> {
        self.transition(signer, "revocation", |trees| {
            revocation::revoke(&mut trees.revocations, nonce)?;
            Ok(trees.claims.root())
        })
    }

    /// Sign `claim` without touching any tree.
    pub fn issue_signed<K: StateSigner + ?Sized>(&self, claim: &Claim, signer: &K) -> Result<SignedClaim> {
        issue_signed(claim, signer)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub fn genesis_state(&self) -> &TreeState {
        &self.genesis
    }

    pub fn auth_claim(&self) -> &Claim {
        &self.auth_claim
    }

    pub fn auth_key(&self) -> &PublicKey {
        &self.auth_key
    }

    pub fn current_state(&self) -> Result<TreeState> {
        Ok(self.read()?.current)
    }

    pub fn transitions(&self) -> Result<u64> {
        Ok(self.read()?.transitions)
    }

    /// Proof for claim index `hi` in the claims tree at `root`.
    pub fn claim_proof(&self, hi: &Hash, root: &Hash) -> Result<(MerkleProof, Hash)> {
        self.read()?.claims.generate_proof(hi, root)
    }

    /// Revocation-tree proof for `nonce` at `root`.
    pub fn non_revocation_proof(&self, nonce: u64, root: &Hash) -> Result<NonRevocationProof> {
        revocation::prove_not_revoked(&self.read()?.revocations, nonce, root)
    }

    /// Proof that `claims_root` was recorded in the roots tree at `roots_root`.
    pub fn root_proof(&self, claims_root: &Hash, roots_root: &Hash) -> Result<MerkleProof> {
        Ok(self.read()?.roots.generate_proof(claims_root, roots_root)?.0)
    }

    /// Every anchored `(Hi, Hv)` at `claims_root`.
    pub fn anchored_claims(&self, claims_root: &Hash) -> Result<Vec<(Hash, Hash)>> {
        self.read()?.claims.leaves(claims_root)
    }

    /// Snapshot for persistence.
    pub fn record(&self) -> Result<IdentityRecord> {
        let trees = self.read()?;
        Ok(IdentityRecord::new(
            self.id,
            self.config.clone(),
            self.genesis,
            trees.current,
            self.auth_claim,
            self.auth_key,
            trees.transitions,
            self.created_at,
        ))
    }
}
