//! Claim construction from an explicit option record.

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::claim::schema::{SchemaHash, SchemaRegistry};
use crate::claim::types::{Claim, SLOTS};
use crate::crypto::field::Hash;
use crate::error::Result;
use crate::identity::id::Id;
use crate::time::to_unix_seconds;

// ── Slot layout ───────────────────────────────────────────────────────────────

pub(crate) const FLAGS_OFFSET: usize = 16;
pub(crate) const VERSION_OFFSET: usize = 20;
pub(crate) const EXPIRATION_OFFSET: usize = 8;

pub(crate) const SUBJECT_MASK: u8 = 0b0000_0111;
pub(crate) const SUBJECT_SELF: u8 = 0b000;
pub(crate) const SUBJECT_INDEX: u8 = 0b010;
pub(crate) const SUBJECT_VALUE: u8 = 0b011;
pub(crate) const FLAG_EXPIRABLE: u8 = 0b0000_1000;
pub(crate) const FLAG_UPDATABLE: u8 = 0b0001_0000;

// ── Options ───────────────────────────────────────────────────────────────────

/// Which half of the claim carries the subject identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectPosition {
    /// Part of the index: one claim per (schema, subject, index data).
    #[default]
    Index,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: Id,
    pub position: SubjectPosition,
}

impl Subject {
    pub fn index(id: Id) -> Self {
        Self {
            id,
            position: SubjectPosition::Index,
        }
    }

    pub fn value(id: Id) -> Self {
        Self {
            id,
            position: SubjectPosition::Value,
        }
    }
}

/// One auxiliary data slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotData {
    #[default]
    Empty,
    Int(BigUint),
    /// Raw little-endian slot bytes.
    Bytes([u8; 32]),
}

impl SlotData {
    fn to_slot(&self) -> Result<Hash> {
        match self {
            SlotData::Empty => Ok(Hash::ZERO),
            SlotData::Int(value) => Hash::from_biguint(value),
            SlotData::Bytes(bytes) => Hash::from_bytes_le(*bytes),
        }
    }
}

impl From<u64> for SlotData {
    fn from(value: u64) -> Self {
        SlotData::Int(BigUint::from(value))
    }
}

impl From<BigUint> for SlotData {
    fn from(value: BigUint) -> Self {
        SlotData::Int(value)
    }
}

impl From<Hash> for SlotData {
    fn from(value: Hash) -> Self {
        SlotData::Bytes(*value.as_bytes())
    }
}

/// Everything a claim can carry besides its schema. Unset fields keep
/// their defaults: nonce 0, version 0, no expiration, no subject, empty
/// data slots, not updatable.
#[derive(Debug, Clone, Default)]
pub struct ClaimOptions {
    pub expiration: Option<DateTime<Utc>>,
    pub revocation_nonce: u64,
    pub subject: Option<Subject>,
    pub index_data: Option<(SlotData, SlotData)>,
    pub value_data: Option<(SlotData, SlotData)>,
    pub updatable: bool,
    pub version: u32,
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// Encodes claims, checking options against declared schema layouts.
#[derive(Debug, Clone, Default)]
pub struct ClaimCodec {
    registry: SchemaRegistry,
}

impl ClaimCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    /// Build a claim.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` if the options conflict with the schema's layout
    /// (data present where the layout forbids it, or missing where it is
    /// required). A data value at or above the field modulus is not a
    /// layout conflict: it fails with `EncodingError`, the same error
    /// [`Hash::from_biguint`] returns. `InvalidOptionCombination` for an
    /// expiration before the epoch.
    pub fn encode(&self, schema: &SchemaHash, options: &ClaimOptions) -> Result<Claim> {
        self.registry.check(schema, options)?;

        let mut index = [[0u8; 32]; SLOTS];
        let mut value = [[0u8; 32]; SLOTS];

        index[0][..16].copy_from_slice(&schema.0);
        index[0][VERSION_OFFSET..VERSION_OFFSET + 4].copy_from_slice(&options.version.to_le_bytes());
        value[0][..8].copy_from_slice(&options.revocation_nonce.to_le_bytes());

        let mut flags = SUBJECT_SELF;
        if let Some(subject) = &options.subject {
            let id_slot = *subject.id.to_hash().as_bytes();
            match subject.position {
                SubjectPosition::Index => {
                    flags = SUBJECT_INDEX;
                    index[1] = id_slot;
                }
                SubjectPosition::Value => {
                    flags = SUBJECT_VALUE;
                    value[1] = id_slot;
                }
            }
        }
        if let Some(at) = &options.expiration {
            flags |= FLAG_EXPIRABLE;
            let secs = to_unix_seconds(at)?;
            value[0][EXPIRATION_OFFSET..EXPIRATION_OFFSET + 8].copy_from_slice(&secs.to_le_bytes());
        }
        if options.updatable {
            flags |= FLAG_UPDATABLE;
        }
        index[0][FLAGS_OFFSET] = flags;

        if let Some((a, b)) = &options.index_data {
            index[2] = *a.to_slot()?.as_bytes();
            index[3] = *b.to_slot()?.as_bytes();
        }
        if let Some((a, b)) = &options.value_data {
            value[2] = *a.to_slot()?.as_bytes();
            value[3] = *b.to_slot()?.as_bytes();
        }

        let to_slots = |raw: [[u8; 32]; SLOTS]| -> Result<[Hash; SLOTS]> {
            let mut out = [Hash::ZERO; SLOTS];
            for (slot, bytes) in out.iter_mut().zip(raw) {
                *slot = Hash::from_bytes_le(bytes)?;
            }
            Ok(out)
        };
        let claim = Claim::from_slots(to_slots(index)?, to_slots(value)?);
        log::debug!(
            "encoded claim schema={} nonce={}",
            schema,
            options.revocation_nonce
        );
        Ok(claim)
    }
}
