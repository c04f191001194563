//! Edge case tests: claim construction limits, identifier corruption,
//! proof tampering, revoked auth keys, tampered records and transition
//! bundles.

use chrono::{TimeZone, Utc};

use idstate::claim::{Presence, SchemaLayout, SchemaRegistry};
use idstate::crypto::signing::{sign, verify, verify_strict};
use idstate::{
    ClaimCodec, ClaimOptions, Hash, Id, IdType, Identity, IdentityConfig, IdentityError,
    MemoryStorage, MerkleTree, PrivateKey, SchemaHash, SlotData, Subject, TreeStores,
};

fn country_schema() -> SchemaHash {
    SchemaHash::from_hex("9b6c3ea3f301a241d9679af6aedccba9").unwrap()
}

fn claim(nonce: u64, data: u64) -> idstate::Claim {
    ClaimCodec::new()
        .encode(
            &country_schema(),
            &ClaimOptions {
                revocation_nonce: nonce,
                index_data: Some((SlotData::from(data), SlotData::Empty)),
                ..Default::default()
            },
        )
        .unwrap()
}

fn identity(key: &PrivateKey) -> Identity<MemoryStorage> {
    Identity::genesis(
        IdentityConfig::default(),
        &key.public_key().unwrap(),
        1,
        TreeStores::default(),
    )
    .unwrap()
}

// === Claim Edge Cases ===

#[test]
fn edge_auth_schema_rejects_subject() {
    let options = ClaimOptions {
        subject: Some(Subject::index(
            Id::from_base58("113TCVw5KMeMp99Qdvub9Mssfz7krL9jWNvbdB7Fd2").unwrap(),
        )),
        index_data: Some((SlotData::from(1u64), SlotData::from(2u64))),
        ..Default::default()
    };
    assert!(matches!(
        ClaimCodec::new().encode(&SchemaHash::auth(), &options),
        Err(IdentityError::SchemaMismatch(_))
    ));
}

#[test]
fn edge_forbidden_value_data() {
    let mut registry = SchemaRegistry::empty();
    registry.register(
        country_schema(),
        SchemaLayout {
            value_data: Presence::Forbidden,
            ..Default::default()
        },
    );
    let options = ClaimOptions {
        value_data: Some((SlotData::from(5u64), SlotData::Empty)),
        ..Default::default()
    };
    assert!(matches!(
        ClaimCodec::with_registry(registry).encode(&country_schema(), &options),
        Err(IdentityError::SchemaMismatch(_))
    ));
}

#[test]
fn edge_slot_value_at_modulus_rejected() {
    let modulus = idstate::crypto::field::MODULUS.clone();
    let options = ClaimOptions {
        value_data: Some((SlotData::from(modulus), SlotData::Empty)),
        ..Default::default()
    };
    assert!(matches!(
        ClaimCodec::new().encode(&country_schema(), &options),
        Err(IdentityError::EncodingError(_))
    ));
}

#[test]
fn edge_expiration_before_epoch() {
    let options = ClaimOptions {
        expiration: Some(Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 0).unwrap()),
        ..Default::default()
    };
    assert!(matches!(
        ClaimCodec::new().encode(&country_schema(), &options),
        Err(IdentityError::InvalidOptionCombination(_))
    ));
}

#[test]
fn edge_expiration_checks() {
    let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let claim = ClaimCodec::new()
        .encode(
            &country_schema(),
            &ClaimOptions {
                expiration: Some(at),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(!claim.is_expired_at(&Utc.with_ymd_and_hms(2029, 12, 31, 0, 0, 0).unwrap()));
    assert!(claim.is_expired_at(&Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap()));
}

#[test]
fn edge_max_nonce_and_version() {
    let claim = ClaimCodec::new()
        .encode(
            &country_schema(),
            &ClaimOptions {
                revocation_nonce: u64::MAX,
                version: u32::MAX,
                updatable: true,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(claim.revocation_nonce(), u64::MAX);
    assert_eq!(claim.version(), u32::MAX);
    assert!(claim.is_updatable());
}

// === Identifier Edge Cases ===

#[test]
fn edge_corrupted_id_rejected() {
    let id = Id::from_base58("113TCVw5KMeMp99Qdvub9Mssfz7krL9jWNvbdB7Fd2").unwrap();
    let mut bytes = *id.as_bytes();
    bytes[10] ^= 0x01;
    assert!(matches!(
        Id::from_bytes(&bytes),
        Err(IdentityError::InvalidId(_))
    ));
    assert!(Id::from_bytes(&bytes[..30]).is_err());
    assert!(Id::from_base58("not-base58-0OIl").is_err());
}

#[test]
fn edge_id_type_is_carried() {
    let state = Hash::from_u64(12345);
    let id = Id::from_genesis(IdType([0x01, 0x02]), &state);
    assert_eq!(id.id_type(), IdType([0x01, 0x02]));
    assert_ne!(id, Id::from_genesis(IdType::DEFAULT, &state));
}

// === Tree Edge Cases ===

#[test]
fn edge_tampered_sibling_fails() {
    let mut tree = MerkleTree::new(MemoryStorage::new(), 32).unwrap();
    for i in 1..=6u64 {
        tree.add(Hash::from_u64(i), Hash::from_u64(i * 10)).unwrap();
    }
    let root = tree.root();
    let key = Hash::from_u64(3);
    let (proof, value) = tree.generate_proof(&key, &root).unwrap();
    assert!(proof.verify(&root, &key, &value));
    assert!(!proof.siblings.is_empty());

    for i in 0..proof.siblings.len() {
        let mut tampered = proof.clone();
        tampered.siblings[i] = Hash::from_u64(999);
        assert!(
            !tampered.verify(&root, &key, &value),
            "tampered sibling {i} must not verify"
        );
    }
}

#[test]
fn edge_update_requires_existing_key() {
    let mut tree = MerkleTree::new(MemoryStorage::new(), 32).unwrap();
    assert!(matches!(
        tree.update(Hash::from_u64(1), Hash::from_u64(2)),
        Err(IdentityError::KeyNotFound(_))
    ));
    tree.add(Hash::from_u64(1), Hash::from_u64(2)).unwrap();
    tree.update(Hash::from_u64(1), Hash::from_u64(3)).unwrap();
    assert_eq!(tree.get(&Hash::from_u64(1), &tree.root()).unwrap(), Hash::from_u64(3));
}

#[test]
fn edge_invalid_depth_rejected() {
    for depth in [0, 1, 255, 1000] {
        let config = IdentityConfig::default().with_tree_depth(depth);
        assert!(matches!(
            config.validate(),
            Err(IdentityError::InvalidConfig(_))
        ));
    }
}

// === Signature Edge Cases ===

#[test]
fn edge_signature_wrong_key_or_message() {
    let key = PrivateKey::generate();
    let other = PrivateKey::generate();
    let message = Hash::from_u64(42);
    let sig = sign(&key, &message).unwrap();

    assert!(verify(&key.public_key().unwrap(), &message, &sig));
    assert!(!verify(&other.public_key().unwrap(), &message, &sig));
    assert!(matches!(
        verify_strict(&key.public_key().unwrap(), &Hash::from_u64(43), &sig),
        Err(IdentityError::InvalidSignature)
    ));
}

// === Transition Edge Cases ===

#[test]
fn edge_revoked_auth_key_blocks_transitions() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    issuer.revoke_claim(1, &key).unwrap();
    let before = issuer.current_state().unwrap();

    assert!(matches!(
        issuer.issue_claim(&claim(2, 84), &key),
        Err(IdentityError::SigningFailure(_))
    ));
    assert!(matches!(
        issuer.revoke_claim(3, &key),
        Err(IdentityError::SigningFailure(_))
    ));
    assert_eq!(issuer.current_state().unwrap(), before);
}

#[test]
fn edge_duplicate_claim_rolls_back() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    issuer.issue_claim(&claim(2, 84), &key).unwrap();
    let before = issuer.current_state().unwrap();

    // Same index, different value (nonce lives in the value slots).
    assert!(matches!(
        issuer.issue_claim(&claim(3, 84), &key),
        Err(IdentityError::DuplicateKey(_))
    ));
    assert_eq!(issuer.current_state().unwrap(), before);

    // The next good issuance starts from the untouched state.
    let inputs = issuer.issue_claim(&claim(4, 85), &key).unwrap();
    assert_eq!(inputs.old_tree_state, before);
}

#[test]
fn edge_tampered_bundle_fails_verification() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let inputs = issuer.issue_claim(&claim(2, 84), &key).unwrap();
    let public = key.public_key().unwrap();
    inputs.verify(&public).unwrap();

    let mut forged = inputs.clone();
    forged.new_state = Hash::from_u64(7);
    assert!(matches!(
        forged.verify(&public),
        Err(IdentityError::InvalidSignature)
    ));

    let mut forged = inputs.clone();
    forged.auth_claim_inclusion_proof.existence = false;
    assert!(matches!(
        forged.verify(&public),
        Err(IdentityError::InvalidProof(_))
    ));

    assert!(inputs
        .verify(&PrivateKey::generate().public_key().unwrap())
        .is_err());
}

#[test]
fn edge_tampered_record_rejected() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let mut record = issuer.record().unwrap();
    record.current.state = Hash::from_u64(1);
    assert!(matches!(
        Identity::open(
            IdentityConfig::default(),
            record,
            TreeStores::<MemoryStorage>::default()
        ),
        Err(IdentityError::InconsistentTreeState(_))
    ));

    let mut record = issuer.record().unwrap();
    record.genesis = record.current;
    record.id = Id::from_genesis(IdType::DEFAULT, &Hash::from_u64(5));
    assert!(matches!(
        Identity::open(
            IdentityConfig::default(),
            record,
            TreeStores::<MemoryStorage>::default()
        ),
        Err(IdentityError::InvalidId(_))
    ));
}

#[test]
fn edge_bundle_resigned_for_someone_elses_identity() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let genuine = issuer.issue_claim(&claim(2, 84), &key).unwrap();

    let attacker = PrivateKey::generate();
    let message =
        idstate::transition::transition_hash(&genuine.old_tree_state.state, &genuine.new_state)
            .unwrap();
    let mut forged = genuine.clone();
    forged.signature = sign(&attacker, &message).unwrap();

    assert!(matches!(
        forged.verify(&attacker.public_key().unwrap()),
        Err(IdentityError::InvalidSignature)
    ));
    assert!(!idstate::identity::binds_auth_key(
        &forged.auth_claim,
        &attacker.public_key().unwrap()
    ));
}
