//! Property-based tests.
//!
//! Hashing and curve arithmetic are slow in debug builds, so case counts
//! are kept small.

use proptest::prelude::*;

use crate::claim::{ClaimCodec, ClaimOptions, SchemaHash, SlotData};
use crate::crypto::field::Hash;
use crate::crypto::keys::PrivateKey;
use crate::crypto::signing::{sign, verify};
use crate::identity::compose_state;
use crate::merkle::MerkleTree;
use crate::storage::MemoryStorage;

fn schema() -> SchemaHash {
    SchemaHash([7u8; 16])
}

fn tree() -> MerkleTree<MemoryStorage> {
    MerkleTree::new(MemoryStorage::new(), 32).unwrap()
}

// ==================== Claim Encoding ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Encoding the same options twice yields the same (Hi, Hv).
    #[test]
    fn hi_hv_deterministic(nonce in any::<u64>(), a in any::<u64>(), b in any::<u64>()) {
        let options = ClaimOptions {
            revocation_nonce: nonce,
            index_data: Some((SlotData::from(a), SlotData::from(b))),
            ..Default::default()
        };
        let codec = ClaimCodec::new();
        let first = codec.encode(&schema(), &options).unwrap().hi_hv().unwrap();
        let second = codec.encode(&schema(), &options).unwrap().hi_hv().unwrap();
        prop_assert_eq!(first, second);
    }

    /// Changing index data changes Hi.
    #[test]
    fn index_data_moves_hi(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        let codec = ClaimCodec::new();
        let encode = |x: u64| {
            codec
                .encode(&schema(), &ClaimOptions {
                    index_data: Some((SlotData::from(x), SlotData::Empty)),
                    ..Default::default()
                })
                .unwrap()
        };
        prop_assert_ne!(encode(a).hi().unwrap(), encode(b).hi().unwrap());
    }
}

// ==================== Sparse Merkle Tree ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Every inserted key proves against the final root; a wrong value does not.
    #[test]
    fn proof_roundtrip(keys in prop::collection::hash_set(1u64..1_000_000, 1..8)) {
        let mut t = tree();
        for &k in &keys {
            t.add(Hash::from_u64(k), Hash::from_u64(k ^ 0xABCD)).unwrap();
        }
        let root = t.root();
        for &k in &keys {
            let key = Hash::from_u64(k);
            let value = Hash::from_u64(k ^ 0xABCD);
            let (proof, found) = t.generate_proof(&key, &root).unwrap();
            prop_assert!(proof.existence);
            prop_assert_eq!(found, value);
            prop_assert!(proof.verify(&root, &key, &value));
            prop_assert!(!proof.verify(&root, &key, &Hash::from_u64(k ^ 0xABCE)));
        }
    }

    /// Absent keys get verifiable non-existence proofs.
    #[test]
    fn absent_key_proof(keys in prop::collection::hash_set(1u64..1_000, 1..8), probe in 1_000u64..2_000) {
        let mut t = tree();
        for &k in &keys {
            t.add(Hash::from_u64(k), Hash::ZERO).unwrap();
        }
        let root = t.root();
        let key = Hash::from_u64(probe);
        let (proof, _) = t.generate_proof(&key, &root).unwrap();
        prop_assert!(!proof.existence);
        prop_assert!(proof.verify(&root, &key, &Hash::ZERO));
    }

    /// The root depends only on the set of leaves.
    #[test]
    fn insertion_order_irrelevant(keys in prop::collection::vec(1u64..10_000, 1..8)) {
        let mut unique = keys.clone();
        unique.sort_unstable();
        unique.dedup();
        let mut forward = tree();
        let mut backward = tree();
        for &k in &unique {
            forward.add(Hash::from_u64(k), Hash::from_u64(k)).unwrap();
        }
        for &k in unique.iter().rev() {
            backward.add(Hash::from_u64(k), Hash::from_u64(k)).unwrap();
        }
        prop_assert_eq!(forward.root(), backward.root());
    }

    /// Adding any leaf changes the composed state.
    #[test]
    fn state_sensitive_to_claims(k in 1u64..1_000_000) {
        let mut t = tree();
        t.add(Hash::ZERO, Hash::from_u64(1)).unwrap();
        let before = compose_state(&t.root(), &Hash::ZERO, &Hash::ZERO).unwrap();
        t.add(Hash::from_u64(k), Hash::ZERO).unwrap();
        let after = compose_state(&t.root(), &Hash::ZERO, &Hash::ZERO).unwrap();
        prop_assert_ne!(before, after);
    }
}

// ==================== Signatures ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// A signature verifies for its message and for no other.
    #[test]
    fn signature_binds_message(seed in any::<[u8; 32]>(), m in any::<u64>(), other in any::<u64>()) {
        prop_assume!(m != other);
        let sk = PrivateKey::from_bytes(seed);
        let pk = sk.public_key().unwrap();
        let sig = sign(&sk, &Hash::from_u64(m)).unwrap();
        prop_assert!(verify(&pk, &Hash::from_u64(m), &sig));
        prop_assert!(!verify(&pk, &Hash::from_u64(other), &sig));
    }
}
