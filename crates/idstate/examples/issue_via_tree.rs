//! Issue via Merkle tree: create an identity, anchor a claim in its claims
//! tree and print the state-transition inputs.
//!
//! Run with:
//!   cargo run --example issue_via_tree -p idstate

use chrono::{TimeZone, Utc};

use idstate::crypto::random::random_rev_nonce;
use idstate::{
    ClaimCodec, ClaimOptions, Id, Identity, IdentityConfig, MemoryStorage, PrivateKey,
    SchemaHash, SlotData, Subject, TreeStores,
};

fn main() {
    // ── 1. Keys and genesis ─────────────────────────────────────────────────
    //
    // The genesis claims tree holds only the auth claim, which binds the
    // issuer's Baby Jubjub public key. The identifier is derived from the
    // genesis state and never changes.
    let key = PrivateKey::generate();
    let public = key.public_key().expect("valid key");
    let issuer: Identity<MemoryStorage> = Identity::genesis(
        IdentityConfig::default(),
        &public,
        random_rev_nonce(),
        TreeStores::default(),
    )
    .expect("genesis should succeed");

    let genesis = *issuer.genesis_state();
    println!("Issuer: {}", issuer.id());
    println!("  Genesis state: {}", genesis.state);
    println!("  Claims root:   {}", genesis.claims_root);
    println!();

    // ── 2. Build the claim ──────────────────────────────────────────────────
    //
    // Country code 84 about a subject, expiring in 2361, revocable under
    // nonce 2.
    let subject = Id::from_base58("113TCVw5KMeMp99Qdvub9Mssfz7krL9jWNvbdB7Fd2")
        .expect("valid subject id");
    let schema = SchemaHash::from_hex("9b6c3ea3f301a241d9679af6aedccba9").expect("valid schema");
    let claim = ClaimCodec::new()
        .encode(
            &schema,
            &ClaimOptions {
                expiration: Some(Utc.with_ymd_and_hms(2361, 3, 22, 0, 44, 48).unwrap()),
                revocation_nonce: 2,
                subject: Some(Subject::index(subject)),
                index_data: Some((SlotData::from(84u64), SlotData::Empty)),
                ..Default::default()
            },
        )
        .expect("claim should encode");
    println!(
        "Claim: {}",
        serde_json::to_string(&claim).expect("claim serializes")
    );
    println!();

    // ── 3. Anchor and sign the transition ───────────────────────────────────
    let inputs = issuer
        .issue_claim(&claim, &key)
        .expect("issuance should succeed");
    inputs.verify(&public).expect("transition verifies");

    let current = issuer.current_state().expect("state readable");
    println!("New state: {}", current.state);
    println!(
        "  Prior claims root recorded: {}",
        issuer
            .root_proof(&genesis.claims_root, &current.roots_root)
            .expect("proof builds")
            .existence
    );
    println!();
    println!(
        "State transition inputs: {}",
        inputs.inputs_marshal().expect("inputs marshal")
    );
}
