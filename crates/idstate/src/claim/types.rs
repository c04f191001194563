//! The encoded claim: four index slots and four value slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::claim::codec::{
    SubjectPosition, EXPIRATION_OFFSET, FLAGS_OFFSET, FLAG_EXPIRABLE, FLAG_UPDATABLE,
    SUBJECT_INDEX, SUBJECT_MASK, SUBJECT_VALUE, VERSION_OFFSET,
};
use crate::claim::schema::SchemaHash;
use crate::crypto::field::Hash;
use crate::crypto::poseidon::hash_elems;
use crate::error::{IdentityError, Result};
use crate::identity::id::Id;
use crate::time::from_unix_seconds;

/// Slots per half of a claim.
pub const SLOTS: usize = 4;

/// A claim. Every slot is a valid field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    index: [Hash; SLOTS],
    value: [Hash; SLOTS],
}

impl Claim {
    pub(crate) fn from_slots(index: [Hash; SLOTS], value: [Hash; SLOTS]) -> Self {
        Self { index, value }
    }

    /// Index slots and value slots, in layout order.
    pub fn raw_slots(&self) -> ([Hash; SLOTS], [Hash; SLOTS]) {
        (self.index, self.value)
    }

    /// `(Hi, Hv)`: the Poseidon hashes of the index and value halves.
    /// This pair is the claim's key and value in a claims tree.
    pub fn hi_hv(&self) -> Result<(Hash, Hash)> {
        Ok((hash_elems(&self.index)?, hash_elems(&self.value)?))
    }

    pub fn hi(&self) -> Result<Hash> {
        hash_elems(&self.index)
    }

    /// `Hash(Hi, Hv)`, the message signed by signature-only issuance.
    pub fn claim_hash(&self) -> Result<Hash> {
        let (hi, hv) = self.hi_hv()?;
        hash_elems(&[hi, hv])
    }

    pub fn schema_hash(&self) -> SchemaHash {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.index[0].as_bytes()[..16]);
        SchemaHash(bytes)
    }

    fn flags(&self) -> u8 {
        self.index[0].as_bytes()[FLAGS_OFFSET]
    }

    /// `None` when the claim is about its issuer.
    pub fn subject_position(&self) -> Option<SubjectPosition> {
        match self.flags() & SUBJECT_MASK {
            SUBJECT_INDEX => Some(SubjectPosition::Index),
            SUBJECT_VALUE => Some(SubjectPosition::Value),
            _ => None,
        }
    }

    pub fn subject_id(&self) -> Result<Option<Id>> {
        match self.subject_position() {
            Some(SubjectPosition::Index) => Id::from_hash(&self.index[1]).map(Some),
            Some(SubjectPosition::Value) => Id::from_hash(&self.value[1]).map(Some),
            None => Ok(None),
        }
    }

    pub fn revocation_nonce(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.value[0].as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        if self.flags() & FLAG_EXPIRABLE == 0 {
            return None;
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.value[0].as_bytes()[EXPIRATION_OFFSET..EXPIRATION_OFFSET + 8]);
        from_unix_seconds(u64::from_le_bytes(bytes))
    }

    /// Whether the claim has expired at `at`. Claims without an
    /// expiration never expire.
    pub fn is_expired_at(&self, at: &DateTime<Utc>) -> bool {
        self.expiration().is_some_and(|exp| exp <= *at)
    }

    pub fn is_updatable(&self) -> bool {
        self.flags() & FLAG_UPDATABLE != 0
    }

    pub fn version(&self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.index[0].as_bytes()[VERSION_OFFSET..VERSION_OFFSET + 4]);
        u32::from_le_bytes(bytes)
    }

    pub fn index_data(&self) -> (Hash, Hash) {
        (self.index[2], self.index[3])
    }

    pub fn value_data(&self) -> (Hash, Hash) {
        (self.value[2], self.value[3])
    }

    /// All eight slots, index half first.
    pub fn to_field_elements(&self) -> Vec<Hash> {
        self.index.iter().chain(self.value.iter()).copied().collect()
    }
}

impl Serialize for Claim {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_field_elements().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Claim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let slots = Vec::<Hash>::deserialize(deserializer)?;
        if slots.len() != 2 * SLOTS {
            return Err(serde::de::Error::custom(IdentityError::EncodingError(format!(
                "claim must have {} slots, got {}",
                2 * SLOTS,
                slots.len()
            ))));
        }
        let mut index = [Hash::ZERO; SLOTS];
        let mut value = [Hash::ZERO; SLOTS];
        index.copy_from_slice(&slots[..SLOTS]);
        value.copy_from_slice(&slots[SLOTS..]);
        Ok(Claim { index, value })
    }
}
