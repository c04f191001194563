//! Persistence: tree node stores, encrypted key files and identity records.
//!
//! # Directory layout
//!
//! The CLI keeps one directory per identity under `~/.idstate/`:
//!
//! ```text
//! ~/.idstate/
//! └── {name}/
//!     ├── config.json      IdentityConfig
//!     ├── identity.json    IdentityRecord
//!     ├── auth.key         encrypted auth key (idkey-v1)
//!     ├── claims.log       FileStorage for the claims tree
//!     ├── revocations.log  FileStorage for the revocation tree
//!     └── roots.log        FileStorage for the roots tree
//! ```
//!
//! # Modules
//!
//! - [`memory`]: in-memory node store.
//! - [`file_store`]: append-only node log.
//! - [`keystore`]: passphrase-encrypted auth key file.
//! - [`record`]: identity record save/load.

pub mod file_store;
pub mod keystore;
pub mod memory;
pub mod record;

use std::path::Path;

use crate::crypto::field::Hash;
use crate::error::Result;

pub use file_store::FileStorage;
pub use keystore::{load_key, read_key_public, save_key, KeyFile};
pub use memory::MemoryStorage;
pub use record::{load_record, save_record, IdentityRecord};

/// Content-addressed node store backing one sparse Merkle tree.
///
/// Writes are staged: `put_node` and `set_root` become durable only when
/// `commit` returns, and `discard` drops everything staged since the last
/// commit. Reads see staged writes. Nodes are never deleted, so every root
/// that was ever committed stays resolvable.
pub trait Storage: Send + Sync {
    /// Fetch the serialized node stored under `key`.
    fn get_node(&self, key: &Hash) -> Result<Option<Vec<u8>>>;

    fn put_node(&mut self, key: &Hash, node: &[u8]) -> Result<()>;

    /// The root recorded by the last `set_root`, staged or committed.
    fn get_root(&self) -> Result<Option<Hash>>;

    fn set_root(&mut self, root: &Hash) -> Result<()>;

    /// Make staged writes durable.
    ///
    /// # Errors
    ///
    /// `StorageError` or `Io` if the backend could not persist; staged
    /// writes are kept so the caller may retry or discard.
    fn commit(&mut self) -> Result<()>;

    fn discard(&mut self);
}

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
