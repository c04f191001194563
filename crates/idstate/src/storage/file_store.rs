//! Append-only node log.
//!
//! A log file is a header record followed by node and root records, all
//! bincode-encoded. `commit` appends everything staged and fsyncs. Reopening
//! replays the log; a torn tail record left by a crash is cut off.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::field::Hash;
use crate::error::{IdentityError, Result};
use crate::storage::Storage;

const LOG_MAGIC: &str = "idstate-nodes";
const LOG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
enum Record {
    Header { magic: String, version: u32 },
    Node { key: [u8; 32], bytes: Vec<u8> },
    Root { root: [u8; 32] },
}

fn encode(record: &Record, out: &mut Vec<u8>) -> Result<()> {
    bincode::serialize_into(out, record)
        .map_err(|e| IdentityError::SerializationError(format!("node log record: {e}")))
}

/// File-backed node store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    file: File,
    committed: HashMap<Hash, Vec<u8>>,
    pending: Vec<(Hash, Vec<u8>)>,
    pending_index: HashMap<Hash, usize>,
    root: Option<Hash>,
    pending_root: Option<Hash>,
}

impl FileStorage {
    /// Open or create the log at `path`.
    ///
    /// # Errors
    ///
    /// `InvalidFileFormat` if the file exists but is not a node log.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existing = if path.exists() {
            std::fs::read(&path)?
        } else {
            Vec::new()
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut committed = HashMap::new();
        let mut root = None;

        if existing.is_empty() {
            let mut buf = Vec::new();
            encode(
                &Record::Header {
                    magic: LOG_MAGIC.into(),
                    version: LOG_VERSION,
                },
                &mut buf,
            )?;
            file.write_all(&buf)?;
            file.sync_all()?;
        } else {
            let mut cursor = Cursor::new(existing.as_slice());
            match bincode::deserialize_from::<_, Record>(&mut cursor) {
                Ok(Record::Header { magic, version })
                    if magic == LOG_MAGIC && version == LOG_VERSION => {}
                _ => {
                    return Err(IdentityError::InvalidFileFormat(format!(
                        "{} is not an idstate node log",
                        path.display()
                    )))
                }
            }
            let mut valid_len = cursor.position();
            while (cursor.position() as usize) < existing.len() {
                match bincode::deserialize_from::<_, Record>(&mut cursor) {
                    Ok(Record::Node { key, bytes }) => {
                        committed.insert(Hash(key), bytes);
                    }
                    Ok(Record::Root { root: r }) => root = Some(Hash(r)),
                    Ok(Record::Header { .. }) => {
                        return Err(IdentityError::InvalidFileFormat(format!(
                            "{}: header record in log body",
                            path.display()
                        )))
                    }
                    Err(e) => {
                        log::warn!(
                            "{}: dropping torn tail at byte {valid_len}: {e}",
                            path.display()
                        );
                        break;
                    }
                }
                valid_len = cursor.position();
            }
            if (valid_len as usize) < existing.len() {
                file.set_len(valid_len)?;
            }
            log::debug!(
                "replayed {} nodes from {}",
                committed.len(),
                path.display()
            );
        }

        Ok(Self {
            path,
            file,
            committed,
            pending: Vec::new(),
            pending_index: HashMap::new(),
            root,
            pending_root: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn get_node(&self, key: &Hash) -> Result<Option<Vec<u8>>> {
        if let Some(&i) = self.pending_index.get(key) {
            return Ok(Some(self.pending[i].1.clone()));
        }
        Ok(self.committed.get(key).cloned())
    }

    fn put_node(&mut self, key: &Hash, node: &[u8]) -> Result<()> {
        if self.committed.contains_key(key) || self.pending_index.contains_key(key) {
            return Ok(());
        }
        self.pending_index.insert(*key, self.pending.len());
        self.pending.push((*key, node.to_vec()));
        Ok(())
    }

    fn get_root(&self) -> Result<Option<Hash>> {
        Ok(self.pending_root.or(self.root))
    }

    fn set_root(&mut self, root: &Hash) -> Result<()> {
        self.pending_root = Some(*root);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() && self.pending_root.is_none() {
            return Ok(());
        }
        let mut buf = Vec::new();
        for (key, bytes) in &self.pending {
            encode(
                &Record::Node {
                    key: key.0,
                    bytes: bytes.clone(),
                },
                &mut buf,
            )?;
        }
        if let Some(root) = &self.pending_root {
            encode(&Record::Root { root: root.0 }, &mut buf)?;
        }
        self.file.write_all(&buf)?;
        self.file.sync_all()?;

        self.pending_index.clear();
        self.committed.extend(self.pending.drain(..));
        if let Some(root) = self.pending_root.take() {
            self.root = Some(root);
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.pending.clear();
        self.pending_index.clear();
        self.pending_root = None;
    }
}
