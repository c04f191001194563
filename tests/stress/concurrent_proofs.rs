//! Concurrency test: proofs are generated while transitions are committed.
//!
//! Readers must always see a published state whose proofs verify, and
//! concurrent writers must serialize into one unbroken chain of states.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use idstate::{
    Claim, ClaimCodec, ClaimOptions, Identity, IdentityConfig, MemoryStorage, PrivateKey,
    RevocationStatus, SchemaHash, SlotData, TreeStores,
};

fn claim(nonce: u64, data: u64) -> Claim {
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

fn identity(key: &PrivateKey) -> Arc<Identity<MemoryStorage>> {
    Arc::new(
        Identity::genesis(
            IdentityConfig::default(),
            &key.public_key().unwrap(),
            1,
            TreeStores::default(),
        )
        .unwrap(),
    )
}

#[test]
fn stress_readers_prove_while_writer_issues() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let (auth_hi, auth_hv) = issuer.auth_claim().hi_hv().unwrap();

    let writer = {
        let issuer = Arc::clone(&issuer);
        let key = key.clone();
        thread::spawn(move || {
            for i in 0..8u64 {
                issuer
                    .issue_claim(&claim(100 + i, i), &key)
                    .expect("issuance should succeed");
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let issuer = Arc::clone(&issuer);
        readers.push(thread::spawn(move || {
            for _ in 0..10 {
                let state = issuer.current_state().unwrap();
                assert!(state.is_consistent().unwrap());
                let (proof, value) = issuer.claim_proof(&auth_hi, &state.claims_root).unwrap();
                assert!(proof.existence);
                assert_eq!(value, auth_hv);
                assert!(proof.verify(&state.claims_root, &auth_hi, &auth_hv));

                let nonrev = issuer
                    .non_revocation_proof(1, &state.revocation_root)
                    .unwrap();
                assert_eq!(nonrev.status(), RevocationStatus::NotRevoked);
                assert!(nonrev.verify());
            }
        }));
    }

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(issuer.transitions().unwrap(), 8);
    let state = issuer.current_state().unwrap();
    assert_eq!(issuer.anchored_claims(&state.claims_root).unwrap().len(), 9);
}

#[test]
fn stress_concurrent_writers_form_one_chain() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let transitions = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for thread_id in 0..4u64 {
        let issuer = Arc::clone(&issuer);
        let key = key.clone();
        let transitions = Arc::clone(&transitions);
        handles.push(thread::spawn(move || {
            for i in 0..3u64 {
                let nonce = 1_000 + thread_id * 10 + i;
                let inputs = issuer
                    .issue_claim(&claim(nonce, nonce), &key)
                    .expect("issuance should succeed");
                transitions
                    .lock()
                    .unwrap()
                    .push((inputs.old_tree_state.state, inputs.new_state));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let transitions = transitions.lock().unwrap();
    assert_eq!(transitions.len(), 12);

    // Walk the chain from genesis: every state is the predecessor of
    // exactly one other.
    let next: HashMap<_, _> = transitions.iter().copied().collect();
    assert_eq!(next.len(), 12);
    let mut state = issuer.genesis_state().state;
    let mut steps = 0;
    while let Some(new) = next.get(&state) {
        state = *new;
        steps += 1;
    }
    assert_eq!(steps, 12);
    assert_eq!(state, issuer.current_state().unwrap().state);
}

#[test]
fn stress_duplicate_issuance_race_has_one_winner() {
    let key = PrivateKey::generate();
    let issuer = identity(&key);
    let contested = claim(7, 7);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let issuer = Arc::clone(&issuer);
        let key = key.clone();
        handles.push(thread::spawn(move || issuer.issue_claim(&contested, &key).is_ok()));
    }
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(issuer.transitions().unwrap(), 1);
}
