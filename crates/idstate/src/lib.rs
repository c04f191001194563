//! idstate: self-certifying identity state.
//!
//! An identity is the hash of three sparse Merkle tree roots: the claims
//! it has issued, the revocation nonces it has revoked, and every claims
//! root it has ever had. Claims are issued either by anchoring them in
//! the claims tree (which moves the identity to a new, signed state) or by
//! signing them directly. Every transition produces the field-ordered
//! bundle an external state-transition circuit consumes.

pub mod claim;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod merkle;
pub mod revocation;
pub mod storage;
pub mod time;
pub mod transition;

#[cfg(test)]
mod proptests;

// Re-export primary types
pub use claim::{Claim, ClaimCodec, ClaimOptions, SchemaHash, SlotData, Subject, SubjectPosition};
pub use config::IdentityConfig;
pub use crypto::{Hash, PrivateKey, PublicKey, Signature, StateSigner};
pub use error::{IdentityError, Result};
pub use identity::{Id, IdType, Identity, TreeState, TreeStores};
pub use issuer::{IssuanceMode, Issued, SignedClaim};
pub use merkle::{MerkleProof, MerkleTree};
pub use revocation::{NonRevocationProof, RevocationStatus};
pub use storage::{FileStorage, IdentityRecord, MemoryStorage, Storage};
pub use transition::{StateTransitionInputs, StateTransitionSigner, TransitionPhase};
