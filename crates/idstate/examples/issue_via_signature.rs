//! Issue via signature: sign a claim directly, without touching any tree.
//!
//! Run with:
//!   cargo run --example issue_via_signature -p idstate

use chrono::{TimeZone, Utc};

use idstate::crypto::derivation::{derive_private_key, issuer_context};
use idstate::issuer::{issue_signed, verify_signed};
use idstate::{ClaimCodec, ClaimOptions, Id, SchemaHash, SlotData, Subject};

/// Fixed demo seed. Signing is deterministic, so every run prints the
/// same signature.
const DEMO_SEED: [u8; 32] = [0x2a; 32];

fn main() {
    let key = derive_private_key(&DEMO_SEED, &issuer_context("demo"))
        .expect("key derivation should succeed");
    println!(
        "Issuer key: {}",
        key.public_key().expect("valid key").x()
    );

    let subject = Id::from_base58("113TCVw5KMeMp99Qdvub9Mssfz7krL9jWNvbdB7Fd2")
        .expect("valid subject id");
    let schema = SchemaHash::from_hex("9b6c3ea3f301a241d9679af6aedccba9").expect("valid schema");
    let claim = ClaimCodec::new()
        .encode(
            &schema,
            &ClaimOptions {
                expiration: Some(Utc.with_ymd_and_hms(2361, 3, 22, 0, 44, 48).unwrap()),
                revocation_nonce: 1_909_830_690,
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

    // The signed message is H(Hi, Hv), the same value a leaf would commit to.
    let signed = issue_signed(&claim, &key).expect("signing should succeed");
    println!("Claim hash: {}", claim.claim_hash().expect("claim hashes"));
    println!("Signature:");
    println!("  R8: ({}, {})", signed.signature.r8x, signed.signature.r8y);
    println!("  S:  {}", signed.signature.s);

    assert!(verify_signed(&claim, &signed.signature, &signed.issuer_key));
    println!("Verified against issuer key: {}", signed.verify());
}
