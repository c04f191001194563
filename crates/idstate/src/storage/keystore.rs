//! Encrypted auth key file (`idkey-v1`).
//!
//! The private key is sealed under a passphrase; the public key and the
//! identity it belongs to are kept in plaintext so `show` needs no
//! passphrase.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "idkey-v1",
//!     "encryption": {
//!         "algorithm": "chacha20-poly1305",
//!         "kdf": "argon2id+hkdf-sha256",
//!         "salt": "<base64-16-bytes>",
//!         "nonce": "<base64-12-bytes>"
//!     },
//!     "encrypted_key": "<base64-ciphertext>",
//!     "public_key": { "point": { "x": "...", "y": "..." } },
//!     "id": "<base58 identifier>"
//! }
//! ```

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::derivation::keystore_context;
use crate::crypto::encryption::{self, Sealed};
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{IdentityError, Result};
use crate::identity::id::Id;
use crate::storage::write_atomic;

// ── File format constants ─────────────────────────────────────────────────────

const KEY_VERSION: u32 = 1;
const KEY_FORMAT: &str = "idkey-v1";
const KEY_ALGORITHM: &str = "chacha20-poly1305";
const KEY_KDF: &str = "argon2id+hkdf-sha256";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    pub format: String,
    pub encryption: EncryptionMetadata,
    pub encrypted_key: String,
    pub public_key: PublicKey,
    pub id: Id,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub algorithm: String,
    pub kdf: String,
    pub salt: String,
    pub nonce: String,
}

fn decode_fixed<const N: usize>(b64: &str, what: &str) -> Result<[u8; N]> {
    let raw = STANDARD
        .decode(b64)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("invalid {what} base64: {e}")))?;
    raw.try_into()
        .map_err(|_| IdentityError::InvalidFileFormat(format!("{what} must be {N} bytes")))
}

fn read_key_file(path: &Path) -> Result<KeyFile> {
    let bytes = std::fs::read(path)?;
    let file: KeyFile = serde_json::from_slice(&bytes)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("failed to parse key file: {e}")))?;
    if file.version != KEY_VERSION || file.format != KEY_FORMAT {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported key file version={} format={}",
            file.version, file.format
        )));
    }
    Ok(file)
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Seal `key` under `passphrase` and write it to `path` atomically.
///
/// # Errors
///
/// `DerivationFailed` or `EncryptionFailed` from the sealing step, `Io`
/// for filesystem errors.
pub fn save_key(path: &Path, key: &PrivateKey, id: &Id, passphrase: &str) -> Result<()> {
    let mut raw = key.to_bytes();
    let sealed = encryption::seal(
        passphrase.as_bytes(),
        &keystore_context(&id.to_base58()),
        &raw,
    );
    raw.zeroize();
    let sealed = sealed?;

    let file = KeyFile {
        version: KEY_VERSION,
        format: KEY_FORMAT.to_string(),
        encryption: EncryptionMetadata {
            algorithm: KEY_ALGORITHM.to_string(),
            kdf: KEY_KDF.to_string(),
            salt: STANDARD.encode(sealed.salt),
            nonce: STANDARD.encode(sealed.nonce),
        },
        encrypted_key: STANDARD.encode(&sealed.ciphertext),
        public_key: key.public_key()?,
        id: *id,
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| IdentityError::SerializationError(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Load and decrypt the key at `path`.
///
/// # Errors
///
/// `InvalidPassphrase` on a wrong passphrase, `InvalidKey` if the
/// decrypted key does not match the stored public key,
/// `InvalidFileFormat` for malformed files.
pub fn load_key(path: &Path, passphrase: &str) -> Result<PrivateKey> {
    let file = read_key_file(path)?;
    let sealed = Sealed {
        salt: decode_fixed(&file.encryption.salt, "salt")?,
        nonce: decode_fixed(&file.encryption.nonce, "nonce")?,
        ciphertext: STANDARD.decode(&file.encrypted_key).map_err(|e| {
            IdentityError::InvalidFileFormat(format!("invalid ciphertext base64: {e}"))
        })?,
    };

    let mut plaintext = encryption::open(
        passphrase.as_bytes(),
        &keystore_context(&file.id.to_base58()),
        &sealed,
    )?;
    let bytes: std::result::Result<[u8; 32], _> = plaintext.as_slice().try_into();
    plaintext.zeroize();
    let mut bytes =
        bytes.map_err(|_| IdentityError::InvalidKey("private key must be 32 bytes".into()))?;
    let key = PrivateKey::from_bytes(bytes);
    bytes.zeroize();

    if key.public_key()? != file.public_key {
        return Err(IdentityError::InvalidKey(
            "decrypted key does not match stored public key".into(),
        ));
    }
    Ok(key)
}

/// Read the public half of a key file without the passphrase.
pub fn read_key_public(path: &Path) -> Result<(PublicKey, Id)> {
    let file = read_key_file(path)?;
    Ok((file.public_key, file.id))
}
