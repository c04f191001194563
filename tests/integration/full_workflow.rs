//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Derive an identity from a genesis auth claim
//! 2. Issue a claim by anchoring it in the claims tree
//! 3. Check the state-transition inputs against the genesis state
//! 4. Issue a claim by signature only
//! 5. Revoke the anchored claim and prove it

use chrono::{TimeZone, Utc};

use idstate::claim::AUTH_SCHEMA_HEX;
use idstate::crypto::signing::verify;
use idstate::issuer::{issue, IssuanceMode, Issued};
use idstate::merkle::MerkleTree;
use idstate::revocation::nonce_key;
use idstate::transition::transition_hash;
use idstate::{
    ClaimCodec, ClaimOptions, Hash, Id, Identity, IdentityConfig, MemoryStorage, PrivateKey,
    RevocationStatus, SchemaHash, SlotData, StateTransitionInputs, Subject, TreeState, TreeStores,
};

const SUBJECT: &str = "113TCVw5KMeMp99Qdvub9Mssfz7krL9jWNvbdB7Fd2";
const COUNTRY_SCHEMA: &str = "9b6c3ea3f301a241d9679af6aedccba9";

fn country_claim(nonce: u64) -> idstate::Claim {
    ClaimCodec::new()
        .encode(
            &SchemaHash::from_hex(COUNTRY_SCHEMA).unwrap(),
            &ClaimOptions {
                expiration: Some(Utc.with_ymd_and_hms(2361, 3, 22, 0, 44, 48).unwrap()),
                revocation_nonce: nonce,
                subject: Some(Subject::index(Id::from_base58(SUBJECT).unwrap())),
                index_data: Some((SlotData::from(84u64), SlotData::Empty)),
                ..Default::default()
            },
        )
        .expect("claim should encode")
}

#[test]
fn full_workflow_genesis_to_revocation() {
    // ── Step 1: Genesis ─────────────────────────────────────────────────
    let key = PrivateKey::generate();
    let public = key.public_key().unwrap();
    let issuer: Identity<MemoryStorage> =
        Identity::genesis(IdentityConfig::default(), &public, 1, TreeStores::default())
            .expect("genesis should succeed");

    let auth = issuer.auth_claim();
    assert_eq!(auth.schema_hash().to_hex(), AUTH_SCHEMA_HEX);
    assert_eq!(auth.revocation_nonce(), 1);

    // The genesis state is computable from the auth claim alone.
    let (hi, hv) = auth.hi_hv().unwrap();
    let mut expected = MerkleTree::new(MemoryStorage::new(), 32).unwrap();
    expected.add(hi, hv).unwrap();
    let precomputed = TreeState::new(expected.root(), Hash::ZERO, Hash::ZERO).unwrap();
    assert_eq!(*issuer.genesis_state(), precomputed);
    assert_eq!(issuer.id(), Id::from_genesis(Default::default(), &precomputed.state));

    // ── Step 2: Tree-anchored issuance ──────────────────────────────────
    let claim = country_claim(2);
    let inputs = issuer
        .issue_claim(&claim, &key)
        .expect("issuance should succeed");

    // ── Step 3: Check the transition inputs ─────────────────────────────
    assert!(inputs.is_old_state_genesis);
    assert_eq!(inputs.old_tree_state, precomputed);
    assert_eq!(inputs.id, issuer.id());
    assert_eq!(inputs.auth_claim, *auth);

    assert!(inputs.auth_claim_inclusion_proof.existence);
    assert!(inputs
        .auth_claim_inclusion_proof
        .verify(&precomputed.claims_root, &hi, &hv));

    assert!(!inputs.auth_claim_non_revocation_proof.existence);
    assert!(inputs
        .auth_claim_non_revocation_proof
        .verify(&precomputed.revocation_root, &nonce_key(1), &Hash::ZERO));

    let message = transition_hash(&precomputed.state, &inputs.new_state).unwrap();
    assert!(verify(&public, &message, &inputs.signature));
    assert!(!verify(
        &PrivateKey::generate().public_key().unwrap(),
        &message,
        &inputs.signature
    ));
    inputs.verify(&public).expect("bundle verifies");

    let fields = inputs.to_field_elements();
    assert_eq!(fields.len(), StateTransitionInputs::field_count(32));
    assert_eq!(fields[1], precomputed.state);
    assert_eq!(fields[5], inputs.new_state);
    assert_eq!(fields[6], Hash::from_u64(1));

    let marshalled: serde_json::Value =
        serde_json::from_str(&inputs.inputs_marshal().unwrap()).unwrap();
    assert_eq!(marshalled["oldUserState"], precomputed.state.to_decimal());
    assert_eq!(marshalled["authClaimNonRevMtpNoAux"], "1");
    assert_eq!(marshalled["authClaim"].as_array().unwrap().len(), 8);

    // The new claim and the prior claims root are both on record.
    let current = issuer.current_state().unwrap();
    assert_eq!(current.state, inputs.new_state);
    let (claim_hi, claim_hv) = claim.hi_hv().unwrap();
    let (proof, value) = issuer.claim_proof(&claim_hi, &current.claims_root).unwrap();
    assert!(proof.existence);
    assert_eq!(value, claim_hv);
    assert!(
        issuer
            .root_proof(&precomputed.claims_root, &current.roots_root)
            .unwrap()
            .existence
    );

    // ── Step 4: Signature-only issuance ─────────────────────────────────
    let other = country_claim(1_909_830_690);
    match issue::<MemoryStorage, _>(IssuanceMode::SignatureOnly { signer: &key }, &other).unwrap() {
        Issued::Signed(signed) => {
            assert!(signed.verify_with(&public));
            let tampered = country_claim(1_909_830_691);
            assert!(!idstate::issuer::verify_signed(
                &tampered,
                &signed.signature,
                &public
            ));
        }
        Issued::Anchored(_) => panic!("signature-only issuance must not anchor"),
    }
    assert_eq!(issuer.current_state().unwrap(), current);

    // ── Step 5: Revoke the anchored claim ───────────────────────────────
    let before = issuer.non_revocation_proof(2, &current.revocation_root).unwrap();
    assert_eq!(before.status(), RevocationStatus::NotRevoked);
    assert!(before.verify());

    let revocation = issuer.revoke_claim(2, &key).unwrap();
    assert!(!revocation.is_old_state_genesis);
    assert_eq!(revocation.old_tree_state, current);

    let after_state = issuer.current_state().unwrap();
    let after = issuer
        .non_revocation_proof(2, &after_state.revocation_root)
        .unwrap();
    assert_eq!(after.status(), RevocationStatus::Revoked);
    assert!(after.verify());

    // The historical proof still resolves against the old root.
    let historical = issuer.non_revocation_proof(2, &current.revocation_root).unwrap();
    assert_eq!(historical.status(), RevocationStatus::NotRevoked);
}
