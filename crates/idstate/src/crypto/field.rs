//! BN254 scalar field elements and their canonical 32-byte encoding.
//!
//! Tree keys, tree values, claim slots and identity states all live in
//! the same prime field. [`Hash`] is the little-endian byte form that is
//! stored, hashed into paths and serialized; [`Fr`] is the arithmetic form.

use std::fmt;

use halo2curves_axiom::ff::PrimeField;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{IdentityError, Result};

pub use halo2curves_axiom::bn256::Fr;

/// Order of the BN254 scalar field.
pub static MODULUS: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"21888242871839275222246405745257275088548364400416034343698204186575808495617",
        10,
    )
    .expect("valid field modulus literal")
});

/// A field element in canonical little-endian form.
///
/// Every constructor that accepts external input checks the value is
/// below the modulus, so a `Hash` always converts back to an `Fr`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub(crate) [u8; 32]);

impl Hash {
    /// The zero element. Also the root of an empty tree.
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Encode an `Fr`.
    pub fn from_fr(fr: &Fr) -> Self {
        let repr = fr.to_repr();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(repr.as_ref());
        Self(bytes)
    }

    /// Decode into an `Fr`.
    pub fn to_fr(&self) -> Result<Fr> {
        Option::from(Fr::from_bytes(&self.0)).ok_or_else(|| {
            IdentityError::EncodingError(format!("{} exceeds the field modulus", self.to_hex()))
        })
    }

    /// Wrap little-endian bytes, rejecting values at or above the modulus.
    pub fn from_bytes_le(bytes: [u8; 32]) -> Result<Self> {
        let hash = Self(bytes);
        hash.to_fr()?;
        Ok(hash)
    }

    /// Encode a small integer.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// Encode an arbitrary unsigned integer.
    pub fn from_biguint(value: &BigUint) -> Result<Self> {
        if value >= &*MODULUS {
            return Err(IdentityError::EncodingError(format!(
                "{value} exceeds the field modulus"
            )));
        }
        let le = value.to_bytes_le();
        let mut bytes = [0u8; 32];
        bytes[..le.len()].copy_from_slice(&le);
        Ok(Self(bytes))
    }

    /// Parse a base-10 string.
    pub fn from_decimal(s: &str) -> Result<Self> {
        let value = BigUint::parse_bytes(s.trim().as_bytes(), 10)
            .ok_or_else(|| IdentityError::EncodingError(format!("invalid decimal: {s:?}")))?;
        Self::from_biguint(&value)
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.0)
    }

    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Hex of the little-endian bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Bit `n` of the little-endian encoding. Selects the child at depth `n`.
    pub fn bit(&self, n: usize) -> bool {
        n < 256 && (self.0[n / 8] >> (n % 8)) & 1 == 1
    }
}

impl From<Fr> for Hash {
    fn from(fr: Fr) -> Self {
        Self::from_fr(&fr)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_decimal(&s).map_err(serde::de::Error::custom)
    }
}
