//! In-memory node store.

use std::collections::HashMap;

use crate::crypto::field::Hash;
use crate::error::Result;
use crate::storage::Storage;

/// Node store held entirely in memory. Committed data lives as long as
/// the value does.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    committed: HashMap<Hash, Vec<u8>>,
    pending: HashMap<Hash, Vec<u8>>,
    root: Option<Hash>,
    pending_root: Option<Hash>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed nodes.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_node(&self, key: &Hash) -> Result<Option<Vec<u8>>> {
        Ok(self
            .pending
            .get(key)
            .or_else(|| self.committed.get(key))
            .cloned())
    }

    fn put_node(&mut self, key: &Hash, node: &[u8]) -> Result<()> {
        if !self.committed.contains_key(key) {
            self.pending.insert(*key, node.to_vec());
        }
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
        self.committed.extend(self.pending.drain());
        if let Some(root) = self.pending_root.take() {
            self.root = Some(root);
        }
        Ok(())
    }

    fn discard(&mut self) {
        self.pending.clear();
        self.pending_root = None;
    }
}
