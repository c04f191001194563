//! Sparse Merkle tree over field elements.
//!
//! Keys are routed by their little-endian bits: bit `i` picks the child at
//! depth `i` (0 = left, 1 = right). A leaf sits at the shallowest depth
//! where its path no longer collides with another key. Nodes are stored
//! content-addressed and never removed, so proofs and lookups work against
//! any root that was ever produced.

use crate::crypto::field::Hash;
use crate::error::{IdentityError, Result};
use crate::merkle::node::Node;
use crate::merkle::proof::{MerkleProof, NodeAux};
use crate::storage::Storage;

/// A sparse Merkle tree with a working root and a committed root.
///
/// Mutations move the working root. [`MerkleTree::commit`] publishes it;
/// [`MerkleTree::discard`] rolls back to the last published root.
#[derive(Debug)]
pub struct MerkleTree<S: Storage> {
    storage: S,
    max_levels: usize,
    root: Hash,
    committed_root: Hash,
}

impl<S: Storage> MerkleTree<S> {
    /// Open a tree over `storage`, resuming from its stored root.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `max_levels < 2`.
    pub fn new(storage: S, max_levels: usize) -> Result<Self> {
        if max_levels < 2 {
            return Err(IdentityError::InvalidConfig(format!(
                "tree depth must be at least 2, got {max_levels}"
            )));
        }
        let root = storage.get_root()?.unwrap_or(Hash::ZERO);
        Ok(Self {
            storage,
            max_levels,
            root,
            committed_root: root,
        })
    }

    /// Open a tree positioned at `root` rather than the store's last root.
    ///
    /// # Errors
    ///
    /// `StorageError` if the store does not hold the node for `root`.
    pub fn open_at(storage: S, max_levels: usize, root: Hash) -> Result<Self> {
        let mut tree = Self::new(storage, max_levels)?;
        tree.get_node(&root)?;
        tree.root = root;
        tree.committed_root = root;
        Ok(tree)
    }

    /// Current working root.
    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn committed_root(&self) -> Hash {
        self.committed_root
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ── Node access ───────────────────────────────────────────────────────────

    fn get_node(&self, key: &Hash) -> Result<Node> {
        if key.is_zero() {
            return Ok(Node::Empty);
        }
        match self.storage.get_node(key)? {
            Some(bytes) => Node::from_bytes(&bytes),
            None => Err(IdentityError::StorageError(format!(
                "missing tree node {key:?}"
            ))),
        }
    }

    fn add_node(&mut self, node: &Node) -> Result<Hash> {
        let key = node.key()?;
        if !matches!(node, Node::Empty) {
            self.storage.put_node(&key, &node.to_bytes()?)?;
        }
        Ok(key)
    }

    fn middle(&mut self, bit: bool, child: Hash, sibling: Hash) -> Result<Hash> {
        let node = if bit {
            Node::Middle {
                left: sibling,
                right: child,
            }
        } else {
            Node::Middle {
                left: child,
                right: sibling,
            }
        };
        self.add_node(&node)
    }

    fn set_root(&mut self, root: Hash) -> Result<Hash> {
        self.storage.set_root(&root)?;
        self.root = root;
        Ok(root)
    }

    // ── Mutation ──────────────────────────────────────────────────────────────

    /// Insert `key → value` and return the new working root.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if `key` already has a leaf, `TreeDepthExceeded` if
    /// the paths of `key` and an existing key agree on every level.
    pub fn add(&mut self, key: Hash, value: Hash) -> Result<Hash> {
        let leaf = Node::Leaf { key, value };
        let root = self.add_leaf(&leaf, &key, self.root, 0)?;
        log::debug!("tree add key={key:?} root={root:?}");
        self.set_root(root)
    }

    fn add_leaf(&mut self, leaf: &Node, key: &Hash, current: Hash, lvl: usize) -> Result<Hash> {
        if lvl > self.max_levels - 1 {
            return Err(IdentityError::TreeDepthExceeded(self.max_levels));
        }
        match self.get_node(&current)? {
            Node::Empty => self.add_node(leaf),
            Node::Leaf { key: old_key, .. } => {
                if old_key == *key {
                    return Err(IdentityError::DuplicateKey(key.to_string()));
                }
                self.push_leaf(leaf, key, &old_key, current, lvl)
            }
            Node::Middle { left, right } => {
                if key.bit(lvl) {
                    let next = self.add_leaf(leaf, key, right, lvl + 1)?;
                    self.middle(true, next, left)
                } else {
                    let next = self.add_leaf(leaf, key, left, lvl + 1)?;
                    self.middle(false, next, right)
                }
            }
        }
    }

    /// Split an existing leaf and a new one until their paths diverge.
    fn push_leaf(
        &mut self,
        leaf: &Node,
        key: &Hash,
        old_key: &Hash,
        old_hash: Hash,
        lvl: usize,
    ) -> Result<Hash> {
        if lvl > self.max_levels - 2 {
            return Err(IdentityError::TreeDepthExceeded(self.max_levels));
        }
        let new_bit = key.bit(lvl);
        if new_bit == old_key.bit(lvl) {
            let next = self.push_leaf(leaf, key, old_key, old_hash, lvl + 1)?;
            return self.middle(new_bit, next, Hash::ZERO);
        }
        let new_hash = self.add_node(leaf)?;
        self.middle(new_bit, new_hash, old_hash)
    }

    /// Replace the value of an existing key and return the new root.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if `key` has no leaf.
    pub fn update(&mut self, key: Hash, value: Hash) -> Result<Hash> {
        let root = self.update_leaf(&key, &value, self.root, 0)?;
        log::debug!("tree update key={key:?} root={root:?}");
        self.set_root(root)
    }

    fn update_leaf(&mut self, key: &Hash, value: &Hash, current: Hash, lvl: usize) -> Result<Hash> {
        if lvl > self.max_levels - 1 {
            return Err(IdentityError::KeyNotFound(key.to_string()));
        }
        match self.get_node(&current)? {
            Node::Leaf { key: k, .. } if k == *key => self.add_node(&Node::Leaf {
                key: *key,
                value: *value,
            }),
            Node::Middle { left, right } => {
                if key.bit(lvl) {
                    let next = self.update_leaf(key, value, right, lvl + 1)?;
                    self.middle(true, next, left)
                } else {
                    let next = self.update_leaf(key, value, left, lvl + 1)?;
                    self.middle(false, next, right)
                }
            }
            _ => Err(IdentityError::KeyNotFound(key.to_string())),
        }
    }

    /// Publish the working root.
    pub fn commit(&mut self) -> Result<()> {
        self.storage.set_root(&self.root)?;
        self.storage.commit()?;
        self.committed_root = self.root;
        Ok(())
    }

    /// Drop every mutation since the last commit.
    pub fn discard(&mut self) {
        self.storage.discard();
        self.root = self.committed_root;
    }

    /// Drop staged writes and reposition both roots at `root`, which must
    /// have been committed earlier. Later commits may have moved the
    /// committed root past it; nodes are never deleted, so it still resolves.
    pub fn rewind(&mut self, root: Hash) {
        self.storage.discard();
        self.root = root;
        self.committed_root = root;
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Look up `key` under `root`.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if no leaf holds `key`.
    pub fn get(&self, key: &Hash, root: &Hash) -> Result<Hash> {
        let mut next = *root;
        for lvl in 0..self.max_levels {
            match self.get_node(&next)? {
                Node::Empty => break,
                Node::Leaf { key: k, value } => {
                    if k == *key {
                        return Ok(value);
                    }
                    break;
                }
                Node::Middle { left, right } => {
                    next = if key.bit(lvl) { right } else { left };
                }
            }
        }
        Err(IdentityError::KeyNotFound(key.to_string()))
    }

    /// Build a proof for `key` under `root`. Returns the proof and the
    /// key's value (zero when absent). Absence is not an error.
    pub fn generate_proof(&self, key: &Hash, root: &Hash) -> Result<(MerkleProof, Hash)> {
        let mut siblings = Vec::new();
        let mut next = *root;
        for lvl in 0..self.max_levels {
            match self.get_node(&next)? {
                Node::Empty => {
                    return Ok((
                        MerkleProof {
                            existence: false,
                            siblings,
                            node_aux: None,
                        },
                        Hash::ZERO,
                    ))
                }
                Node::Leaf { key: k, value } => {
                    let proof = if k == *key {
                        MerkleProof {
                            existence: true,
                            siblings,
                            node_aux: None,
                        }
                    } else {
                        MerkleProof {
                            existence: false,
                            siblings,
                            node_aux: Some(NodeAux { key: k, value }),
                        }
                    };
                    let found = if proof.existence { value } else { Hash::ZERO };
                    return Ok((proof, found));
                }
                Node::Middle { left, right } => {
                    if key.bit(lvl) {
                        siblings.push(left);
                        next = right;
                    } else {
                        siblings.push(right);
                        next = left;
                    }
                }
            }
        }
        Err(IdentityError::TreeDepthExceeded(self.max_levels))
    }

    /// Every `(key, value)` under `root`, in left-to-right order.
    pub fn leaves(&self, root: &Hash) -> Result<Vec<(Hash, Hash)>> {
        let mut out = Vec::new();
        let mut stack = vec![*root];
        while let Some(hash) = stack.pop() {
            match self.get_node(&hash)? {
                Node::Empty => {}
                Node::Leaf { key, value } => out.push((key, value)),
                Node::Middle { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        Ok(out)
    }
}
