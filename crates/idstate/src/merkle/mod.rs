//! Sparse Merkle trees.

pub mod node;
pub mod proof;
pub mod tree;

pub use node::{leaf_key, Node};
pub use proof::{verify_proof, MerkleProof, NodeAux};
pub use tree::MerkleTree;
