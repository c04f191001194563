//! Key derivation using HKDF-SHA256.
//!
//! Turns a passphrase-stretched secret into purpose-bound sub-keys, and
//! lets tests and demos derive reproducible signing keys from a seed.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::crypto::keys::PrivateKey;
use crate::error::{IdentityError, Result};

/// Derive a 32-byte child key from input key material and a context string.
pub fn derive_key(ikm: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}

/// Derive a Baby Jubjub signing key from a seed and context.
pub fn derive_private_key(seed: &[u8; 32], context: &str) -> Result<PrivateKey> {
    let derived = derive_key(seed, context)?;
    Ok(PrivateKey::from_bytes(derived))
}

/// Context for the sub-key that encrypts an identity's auth key at rest.
pub fn keystore_context(id: &str) -> String {
    format!("idstate/keystore/{id}")
}

/// Context for a named issuing key.
pub fn issuer_context(label: &str) -> String {
    format!("idstate/issuer/{label}")
}
