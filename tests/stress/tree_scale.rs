//! Scale test: a tree with a few hundred leaves keeps every proof valid,
//! including proofs against every historical root.

use idstate::merkle::verify_proof;
use idstate::{Hash, IdentityError, MemoryStorage, MerkleTree};

fn key(i: u64) -> Hash {
    // Spread keys so paths diverge at varied depths.
    Hash::from_u64(i.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 8)
}

#[test]
fn stress_256_leaves_all_provable() {
    let mut tree = MerkleTree::new(MemoryStorage::new(), 64).unwrap();
    for i in 0..256u64 {
        tree.add(key(i), Hash::from_u64(i)).unwrap();
    }
    tree.commit().unwrap();
    let root = tree.root();

    for i in 0..256u64 {
        let (proof, value) = tree.generate_proof(&key(i), &root).unwrap();
        assert!(proof.existence, "leaf {i} should exist");
        assert_eq!(value, Hash::from_u64(i));
        assert!(verify_proof(&root, &proof, &key(i), &value));
    }
    assert_eq!(tree.leaves(&root).unwrap().len(), 256);

    for i in 256..320u64 {
        let (proof, value) = tree.generate_proof(&key(i), &root).unwrap();
        assert!(!proof.existence, "leaf {i} should be absent");
        assert!(verify_proof(&root, &proof, &key(i), &value));
    }
}

#[test]
fn stress_historical_roots_stay_resolvable() {
    let mut tree = MerkleTree::new(MemoryStorage::new(), 64).unwrap();
    let mut roots = Vec::new();
    for i in 0..64u64 {
        roots.push(tree.add(key(i), Hash::from_u64(i)).unwrap());
    }
    tree.commit().unwrap();

    for (n, root) in roots.iter().enumerate() {
        let n = n as u64;
        // Every key inserted up to this root is present, the next is not.
        let (proof, _) = tree.generate_proof(&key(n), root).unwrap();
        assert!(proof.existence);
        assert_eq!(tree.get(&key(0), root).unwrap(), Hash::ZERO);
        if n + 1 < 64 {
            let (proof, _) = tree.generate_proof(&key(n + 1), root).unwrap();
            assert!(!proof.existence);
        }
    }
}

#[test]
fn stress_shallow_tree_fills_up() {
    // Depth 4 routes on the low four bits; a fifth key sharing bits
    // with an existing one eventually cannot be placed.
    let mut tree = MerkleTree::new(MemoryStorage::new(), 4).unwrap();
    let mut placed = 0;
    let mut overflowed = false;
    for i in 0..32u64 {
        match tree.add(Hash::from_u64(i), Hash::ZERO) {
            Ok(_) => placed += 1,
            Err(IdentityError::TreeDepthExceeded(4)) => overflowed = true,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(overflowed);
    assert!(placed >= 4);
    for (k, _) in tree.leaves(&tree.root()).unwrap() {
        let (proof, value) = tree.generate_proof(&k, &tree.root()).unwrap();
        assert!(proof.verify(&tree.root(), &k, &value));
    }
}
