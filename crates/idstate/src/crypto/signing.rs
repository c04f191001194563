//! EdDSA-Poseidon signatures over Baby Jubjub.
//!
//! Messages are single field elements. The challenge is
//! `Poseidon(R8x, R8y, Ax, Ay, m)`, so a signature binds the signer's
//! public key as well as the message.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::crypto::babyjub::{Point, SUBORDER};
use crate::crypto::field::Hash;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::crypto::poseidon::hash_elems;
use crate::error::{IdentityError, Result};

/// An EdDSA-Poseidon signature `(R8, S)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub r8x: Hash,
    pub r8y: Hash,
    pub s: Hash,
}

impl Signature {
    pub fn r8(&self) -> Point {
        Point {
            x: self.r8x,
            y: self.r8y,
        }
    }
}

/// Anything that can sign a field element on behalf of an identity.
///
/// The identity core only talks to signing keys through this trait, so a
/// hardware or remote signer can be swapped in for [`PrivateKey`].
pub trait StateSigner {
    fn public_key(&self) -> Result<PublicKey>;

    /// Sign `message`. Failures surface as `SigningFailure`.
    fn sign_poseidon(&self, message: &Hash) -> Result<Signature>;
}

impl StateSigner for PrivateKey {
    fn public_key(&self) -> Result<PublicKey> {
        PrivateKey::public_key(self)
    }

    fn sign_poseidon(&self, message: &Hash) -> Result<Signature> {
        sign(self, message)
    }
}

fn challenge(r8: &Point, pk: &PublicKey, message: &Hash) -> Result<BigUint> {
    let hm = hash_elems(&[r8.x, r8.y, pk.x(), pk.y(), *message])?;
    Ok(hm.to_biguint())
}

/// Sign a field element.
pub fn sign(key: &PrivateKey, message: &Hash) -> Result<Signature> {
    let signing = |e: IdentityError| IdentityError::SigningFailure(e.to_string());

    let expanded = key.expand();
    let mut hasher = Sha512::new();
    hasher.update(&expanded[32..]);
    hasher.update(message.as_bytes());
    let r = BigUint::from_bytes_le(&hasher.finalize()) % &*SUBORDER;

    let r8 = Point::base8().mul_scalar(&r).map_err(signing)?;
    let pk = key.public_key().map_err(signing)?;
    let hm = challenge(&r8, &pk, message).map_err(signing)?;
    let s = (r + hm * key.scalar()) % &*SUBORDER;

    Ok(Signature {
        r8x: r8.x,
        r8y: r8.y,
        s: Hash::from_biguint(&s).map_err(signing)?,
    })
}

/// Check a signature. Returns `false` for malformed points or scalars.
pub fn verify(public_key: &PublicKey, message: &Hash, signature: &Signature) -> bool {
    let r8 = signature.r8();
    if !r8.is_on_curve() || !public_key.point().is_on_curve() {
        return false;
    }
    let s = signature.s.to_biguint();
    if s >= *SUBORDER {
        return false;
    }
    let Ok(hm) = challenge(&r8, public_key, message) else {
        return false;
    };

    let left = Point::base8().mul_scalar(&s);
    let right = public_key
        .point()
        .mul_scalar(&(hm * 8u32))
        .and_then(|p| r8.add(&p));
    matches!((left, right), (Ok(l), Ok(r)) if l == r)
}

/// Like [`verify`], but a bad signature is an `InvalidSignature` error.
pub fn verify_strict(public_key: &PublicKey, message: &Hash, signature: &Signature) -> Result<()> {
    if verify(public_key, message, signature) {
        Ok(())
    } else {
        Err(IdentityError::InvalidSignature)
    }
}
