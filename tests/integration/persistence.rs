//! Integration test: identities survive a process restart.
//!
//! Trees live in append-only node logs, the auth key in an encrypted key
//! file and the roots in the identity record. Reopening all three must
//! reproduce the same state and keep historical proofs resolvable.

use std::io::Write;
use std::path::Path;

use idstate::storage::{load_key, load_record, read_key_public, save_key, save_record};
use idstate::{
    ClaimCodec, ClaimOptions, FileStorage, Identity, IdentityConfig, IdentityError, PrivateKey,
    RevocationStatus, SchemaHash, SlotData, TreeStores,
};

fn stores(dir: &Path) -> TreeStores<FileStorage> {
    TreeStores {
        claims: FileStorage::open(dir.join("claims.log")).unwrap(),
        revocations: FileStorage::open(dir.join("revocations.log")).unwrap(),
        roots: FileStorage::open(dir.join("roots.log")).unwrap(),
    }
}

fn claim(nonce: u64, data: u64) -> idstate::Claim {
    ClaimCodec::new()
        .encode(
            &SchemaHash::from_hex("9b6c3ea3f301a241d9679af6aedccba9").unwrap(),
            &ClaimOptions {
                revocation_nonce: nonce,
                index_data: Some((SlotData::from(data), SlotData::Empty)),
                ..Default::default()
            },
        )
        .unwrap()
}

#[test]
fn identity_reopens_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = IdentityConfig::default().with_tree_depth(20);
    let key = PrivateKey::generate();

    let (id, state, genesis) = {
        let identity = Identity::genesis(
            config.clone(),
            &key.public_key().unwrap(),
            1,
            stores(dir.path()),
        )
        .unwrap();
        identity.issue_claim(&claim(2, 84), &key).unwrap();
        identity.revoke_claim(2, &key).unwrap();
        save_record(&identity.record().unwrap(), &dir.path().join("identity.json")).unwrap();
        (
            identity.id(),
            identity.current_state().unwrap(),
            *identity.genesis_state(),
        )
    };

    let record = load_record(&dir.path().join("identity.json")).unwrap();
    assert_eq!(record.transitions, 2);
    let reopened = Identity::open(config, record, stores(dir.path())).unwrap();
    assert_eq!(reopened.id(), id);
    assert_eq!(reopened.current_state().unwrap(), state);
    assert_eq!(reopened.transitions().unwrap(), 2);

    // Proofs against historical and current roots both resolve.
    let old = reopened
        .non_revocation_proof(2, &genesis.revocation_root)
        .unwrap();
    assert_eq!(old.status(), RevocationStatus::NotRevoked);
    let now = reopened.non_revocation_proof(2, &state.revocation_root).unwrap();
    assert_eq!(now.status(), RevocationStatus::Revoked);

    // The reopened identity keeps transitioning from where it left off.
    let next = reopened.issue_claim(&claim(3, 85), &key).unwrap();
    assert_eq!(next.old_tree_state, state);
    assert!(!next.is_old_state_genesis);
}

#[test]
fn stale_record_reopens_at_recorded_roots() {
    let dir = tempfile::tempdir().unwrap();
    let key = PrivateKey::generate();
    let config = IdentityConfig::default();

    let recorded = {
        let identity = Identity::genesis(
            config.clone(),
            &key.public_key().unwrap(),
            1,
            stores(dir.path()),
        )
        .unwrap();
        identity.issue_claim(&claim(2, 84), &key).unwrap();
        save_record(&identity.record().unwrap(), &dir.path().join("identity.json")).unwrap();
        let recorded = identity.current_state().unwrap();
        // Trees commit, but the process stops before the record is saved.
        identity.issue_claim(&claim(3, 85), &key).unwrap();
        recorded
    };

    let record = load_record(&dir.path().join("identity.json")).unwrap();
    let reopened = Identity::open(config, record, stores(dir.path())).unwrap();
    assert_eq!(reopened.current_state().unwrap(), recorded);

    // The unrecorded claim is not visible at the recorded root.
    let (hi, _) = claim(3, 85).hi_hv().unwrap();
    let (proof, _) = reopened.claim_proof(&hi, &recorded.claims_root).unwrap();
    assert!(!proof.existence);
}

#[test]
fn torn_log_tail_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let key = PrivateKey::generate();
    let config = IdentityConfig::default();

    let record = {
        let identity = Identity::genesis(
            config.clone(),
            &key.public_key().unwrap(),
            1,
            stores(dir.path()),
        )
        .unwrap();
        identity.issue_claim(&claim(2, 84), &key).unwrap();
        identity.record().unwrap()
    };

    // Simulate a crash in the middle of appending a record.
    let mut log = std::fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("claims.log"))
        .unwrap();
    log.write_all(&[1, 0, 0, 0, 0xde, 0xad]).unwrap();
    drop(log);

    let reopened = Identity::open(config, record.clone(), stores(dir.path())).unwrap();
    assert_eq!(reopened.current_state().unwrap(), record.current);
    let (hi, hv) = claim(2, 84).hi_hv().unwrap();
    let (proof, value) = reopened
        .claim_proof(&hi, &record.current.claims_root)
        .unwrap();
    assert!(proof.existence);
    assert_eq!(value, hv);
}

#[test]
fn foreign_log_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("claims.log");
    std::fs::write(&path, b"{\"not\": \"a node log\"}").unwrap();
    assert!(matches!(
        FileStorage::open(&path),
        Err(IdentityError::InvalidFileFormat(_))
    ));
}

#[test]
fn key_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth.key");
    let key = PrivateKey::generate();
    let identity: Identity<idstate::MemoryStorage> = Identity::genesis(
        IdentityConfig::default(),
        &key.public_key().unwrap(),
        1,
        TreeStores::default(),
    )
    .unwrap();

    save_key(&path, &key, &identity.id(), "hunter2").unwrap();

    let (public, id) = read_key_public(&path).unwrap();
    assert_eq!(public, key.public_key().unwrap());
    assert_eq!(id, identity.id());

    let loaded = load_key(&path, "hunter2").unwrap();
    assert_eq!(loaded.to_bytes(), key.to_bytes());
    assert!(matches!(
        load_key(&path, "wrong"),
        Err(IdentityError::InvalidPassphrase)
    ));
}
