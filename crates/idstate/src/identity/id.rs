//! Genesis-derived identifiers.
//!
//! Layout (31 bytes): `type (2) ‖ genesis (27) ‖ checksum (2)`.
//! `genesis` is the tail of the little-endian genesis state encoding and
//! `checksum` is the big-endian 16-bit sum of the 29 preceding bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::field::Hash;
use crate::error::{IdentityError, Result};

pub const ID_LEN: usize = 31;
const TYPE_LEN: usize = 2;
const GENESIS_LEN: usize = 27;
const CHECKSUM_OFFSET: usize = TYPE_LEN + GENESIS_LEN;

/// Two-byte derivation scheme tag carried in every identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdType(pub [u8; 2]);

impl IdType {
    pub const DEFAULT: IdType = IdType([0x00, 0x00]);
}

impl Default for IdType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id([u8; ID_LEN]);

fn checksum(body: &[u8]) -> [u8; 2] {
    let sum = body
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    sum.to_be_bytes()
}

impl Id {
    /// Derive the identifier of an identity from its genesis state.
    pub fn from_genesis(id_type: IdType, genesis_state: &Hash) -> Self {
        let mut bytes = [0u8; ID_LEN];
        bytes[..TYPE_LEN].copy_from_slice(&id_type.0);
        bytes[TYPE_LEN..CHECKSUM_OFFSET].copy_from_slice(&genesis_state.as_bytes()[32 - GENESIS_LEN..]);
        let sum = checksum(&bytes[..CHECKSUM_OFFSET]);
        bytes[CHECKSUM_OFFSET..].copy_from_slice(&sum);
        Self(bytes)
    }

    /// Parse raw bytes, checking the checksum.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ID_LEN] = bytes.try_into().map_err(|_| {
            IdentityError::InvalidId(format!("expected {ID_LEN} bytes, got {}", bytes.len()))
        })?;
        if checksum(&bytes[..CHECKSUM_OFFSET]) != bytes[CHECKSUM_OFFSET..] {
            return Err(IdentityError::InvalidId("checksum mismatch".into()));
        }
        Ok(Self(bytes))
    }

    pub fn from_base58(s: &str) -> Result<Self> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| IdentityError::InvalidId(format!("invalid base58: {e}")))?;
        Self::from_bytes(&raw)
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// The identifier as a field element (little-endian integer of its bytes).
    pub fn to_hash(&self) -> Hash {
        let mut bytes = [0u8; 32];
        bytes[..ID_LEN].copy_from_slice(&self.0);
        Hash(bytes)
    }

    /// Inverse of [`Id::to_hash`], as read back out of a claim slot.
    pub fn from_hash(hash: &Hash) -> Result<Self> {
        let bytes = hash.as_bytes();
        if bytes[ID_LEN] != 0 {
            return Err(IdentityError::InvalidId("slot value wider than an id".into()));
        }
        Self::from_bytes(&bytes[..ID_LEN])
    }

    pub fn id_type(&self) -> IdType {
        IdType([self.0[0], self.0[1]])
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_base58())
    }
}

impl FromStr for Id {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Id::from_base58(&s).map_err(serde::de::Error::custom)
    }
}
