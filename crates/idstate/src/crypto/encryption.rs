//! Sealing of key material at rest.
//!
//! A passphrase is stretched with Argon2id, narrowed to a purpose-bound
//! sub-key with HKDF, and used to encrypt with ChaCha20-Poly1305.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroize;

use crate::crypto::derivation::derive_key;
use crate::crypto::random::random_bytes;
use crate::error::{IdentityError, Result};

const ARGON2_M_COST: u32 = 19 * 1024; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Ciphertext plus everything except the passphrase needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Stretch a passphrase into a 32-byte key with Argon2id.
pub fn derive_passphrase_key(passphrase: &[u8], salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| IdentityError::DerivationFailed(format!("Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("Argon2 hash: {e}")))?;
    Ok(output)
}

fn sealing_key(passphrase: &[u8], salt: &[u8; 16], context: &str) -> Result<[u8; 32]> {
    let mut stretched = derive_passphrase_key(passphrase, salt)?;
    let key = derive_key(&stretched, context);
    stretched.zeroize();
    key
}

/// Encrypt `plaintext` under a passphrase, bound to `context`.
pub fn seal(passphrase: &[u8], context: &str, plaintext: &[u8]) -> Result<Sealed> {
    let salt: [u8; 16] = random_bytes();
    let nonce: [u8; 12] = random_bytes();
    let mut key = sealing_key(passphrase, &salt, context)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key)
        .map_err(|e| IdentityError::EncryptionFailed(format!("cipher init: {e}")));
    key.zeroize();
    let ciphertext = cipher?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| IdentityError::EncryptionFailed(format!("encrypt: {e}")))?;
    Ok(Sealed {
        salt,
        nonce,
        ciphertext,
    })
}

/// Decrypt a [`Sealed`] blob. A wrong passphrase or context, or any
/// tampering, fails with `InvalidPassphrase`.
pub fn open(passphrase: &[u8], context: &str, sealed: &Sealed) -> Result<Vec<u8>> {
    let mut key = sealing_key(passphrase, &sealed.salt, context)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&key)
        .map_err(|e| IdentityError::DecryptionFailed(format!("cipher init: {e}")));
    key.zeroize();
    cipher?
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| IdentityError::InvalidPassphrase)
}
