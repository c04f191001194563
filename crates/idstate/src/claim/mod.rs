//! Claim encoding.
//!
//! A claim is eight field-element slots. The index half identifies the
//! claim (schema, subject, index data) and the value half carries the
//! revocation nonce, expiration, value subject and value data. The pair
//! of half-hashes `(Hi, Hv)` is what goes into a claims tree.

pub mod codec;
pub mod schema;
pub mod types;

pub use codec::{ClaimCodec, ClaimOptions, SlotData, Subject, SubjectPosition};
pub use schema::{Presence, SchemaHash, SchemaLayout, SchemaRegistry, AUTH_SCHEMA_HEX};
pub use types::Claim;
