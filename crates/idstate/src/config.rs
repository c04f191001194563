//! Identity configuration.
//!
//! One config applies to all three trees of an identity. It is stored as
//! `config.json` next to the identity record and can be edited by hand.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};
use crate::identity::id::IdType;

/// Default depth of the claims, revocation and roots trees.
pub const DEFAULT_TREE_DEPTH: usize = 32;

/// Smallest depth that can hold two diverging leaves.
pub const MIN_TREE_DEPTH: usize = 2;

/// Largest depth whose paths fit in the bits of a field element.
pub const MAX_TREE_DEPTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub tree_depth: usize,
    pub id_type: IdType,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            tree_depth: DEFAULT_TREE_DEPTH,
            id_type: IdType::DEFAULT,
        }
    }
}

impl IdentityConfig {
    pub fn with_tree_depth(mut self, depth: usize) -> Self {
        self.tree_depth = depth;
        self
    }

    /// # Errors
    ///
    /// `InvalidConfig` when the tree depth is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TREE_DEPTH..=MAX_TREE_DEPTH).contains(&self.tree_depth) {
            return Err(IdentityError::InvalidConfig(format!(
                "tree_depth must be in {MIN_TREE_DEPTH}..={MAX_TREE_DEPTH}, got {}",
                self.tree_depth
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| IdentityError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, else fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IdentityError::SerializationError(e.to_string()))?;
        crate::storage::write_atomic(path, json.as_bytes())
    }
}
