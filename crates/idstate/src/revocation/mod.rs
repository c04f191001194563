//! Revocation and non-revocation proofs.

pub mod nonrev;

pub use nonrev::{nonce_key, prove_not_revoked, revoke, NonRevocationProof, RevocationStatus};
