//! Cryptographic primitives for idstate.
//!
//! This module provides:
//! - BN254 scalar field elements and their 32-byte encoding
//! - Poseidon hashing over that field
//! - Baby Jubjub curve arithmetic and EdDSA-Poseidon signatures
//! - HKDF-SHA256 key derivation
//! - Argon2id + ChaCha20-Poly1305 sealing of key material at rest
//! - Cryptographically secure random number generation

pub mod babyjub;
pub mod derivation;
pub mod encryption;
pub mod field;
pub mod keys;
pub mod poseidon;
pub mod random;
pub mod signing;

pub use field::{Fr, Hash};
pub use keys::{PrivateKey, PublicKey};
pub use poseidon::hash_elems;
pub use signing::{Signature, StateSigner};
