//! Identity record: everything except tree nodes and the private key
//! needed to reopen an identity.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::Claim;
use crate::config::IdentityConfig;
use crate::crypto::keys::PublicKey;
use crate::error::{IdentityError, Result};
use crate::identity::id::Id;
use crate::identity::state::TreeState;
use crate::storage::write_atomic;

const RECORD_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub version: u32,
    pub id: Id,
    pub config: IdentityConfig,
    pub genesis: TreeState,
    pub current: TreeState,
    pub auth_claim: Claim,
    pub auth_key: PublicKey,
    pub transitions: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IdentityRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Id,
        config: IdentityConfig,
        genesis: TreeState,
        current: TreeState,
        auth_claim: Claim,
        auth_key: PublicKey,
        transitions: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: RECORD_VERSION,
            id,
            config,
            genesis,
            current,
            auth_claim,
            auth_key,
            transitions,
            created_at,
            updated_at: Utc::now(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.current == self.genesis
    }
}

/// Write the record to `path` atomically.
pub fn save_record(record: &IdentityRecord, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| IdentityError::SerializationError(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// # Errors
///
/// `NotFound` if there is no record at `path`, `InvalidFileFormat` if it
/// cannot be parsed or has an unknown version.
pub fn load_record(path: &Path) -> Result<IdentityRecord> {
    if !path.exists() {
        return Err(IdentityError::NotFound(format!(
            "no identity record at {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    let record: IdentityRecord = serde_json::from_slice(&bytes)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("identity record: {e}")))?;
    if record.version != RECORD_VERSION {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported identity record version {}",
            record.version
        )));
    }
    Ok(record)
}
