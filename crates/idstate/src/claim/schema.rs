//! Schema hashes and declared claim layouts.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::claim::codec::ClaimOptions;
use crate::error::{IdentityError, Result};

/// Schema of the key-authorisation claim every identity is born with.
pub const AUTH_SCHEMA_HEX: &str = "ca938857241db9451ea329256b9c06e5";

/// 16-byte opaque identifier of a claim's semantic type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SchemaHash(pub [u8; 16]);

impl SchemaHash {
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s)
            .map_err(|e| IdentityError::EncodingError(format!("invalid schema hex {s:?}: {e}")))?;
        let bytes: [u8; 16] = raw.try_into().map_err(|_| {
            IdentityError::EncodingError(format!("schema hash must be 16 bytes: {s:?}"))
        })?;
        Ok(Self(bytes))
    }

    pub const fn auth() -> Self {
        Self([
            0xca, 0x93, 0x88, 0x57, 0x24, 0x1d, 0xb9, 0x45, 0x1e, 0xa3, 0x29, 0x25, 0x6b, 0x9c,
            0x06, 0xe5,
        ])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaHash({})", self.to_hex())
    }
}

impl Serialize for SchemaHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SchemaHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SchemaHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Whether an optional claim attribute may or must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Forbidden,
    #[default]
    Optional,
    Required,
}

impl Presence {
    fn check(self, present: bool, what: &str, schema: &SchemaHash) -> Result<()> {
        match (self, present) {
            (Presence::Forbidden, true) => Err(IdentityError::SchemaMismatch(format!(
                "schema {schema} does not allow {what}"
            ))),
            (Presence::Required, false) => Err(IdentityError::SchemaMismatch(format!(
                "schema {schema} requires {what}"
            ))),
            _ => Ok(()),
        }
    }
}

/// The attributes a schema declares for its claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaLayout {
    pub subject: Presence,
    pub index_data: Presence,
    pub value_data: Presence,
}

impl SchemaLayout {
    /// Layout of the auth claim: public key in the index data, no subject.
    pub fn auth() -> Self {
        Self {
            subject: Presence::Forbidden,
            index_data: Presence::Required,
            value_data: Presence::Optional,
        }
    }
}

/// Known schema layouts. Unregistered schemas accept any options.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    layouts: HashMap<SchemaHash, SchemaLayout>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SchemaHash::auth(), SchemaLayout::auth());
        registry
    }
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self {
            layouts: HashMap::new(),
        }
    }

    /// Declare (or replace) the layout of a schema.
    pub fn register(&mut self, schema: SchemaHash, layout: SchemaLayout) {
        self.layouts.insert(schema, layout);
    }

    pub fn layout(&self, schema: &SchemaHash) -> Option<&SchemaLayout> {
        self.layouts.get(schema)
    }

    /// Check an option record against the schema's declared layout.
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` when a forbidden attribute is set or a required
    /// one is missing.
    pub fn check(&self, schema: &SchemaHash, options: &ClaimOptions) -> Result<()> {
        let Some(layout) = self.layouts.get(schema) else {
            return Ok(());
        };
        layout
            .subject
            .check(options.subject.is_some(), "a subject", schema)?;
        layout
            .index_data
            .check(options.index_data.is_some(), "index data", schema)?;
        layout
            .value_data
            .check(options.value_data.is_some(), "value data", schema)
    }
}
