//! Baby Jubjub key pairs.
//!
//! A private key is 32 random bytes. The signing scalar and nonce prefix
//! are expanded from it with SHA-512, so the raw bytes are the only
//! secret that has to be stored.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::babyjub::Point;
use crate::crypto::field::Hash;
use crate::error::{IdentityError, Result};

/// A Baby Jubjub signing key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; 32],
}

impl PrivateKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        Self::from_bytes(crate::crypto::random::random_bytes())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Return the raw key bytes. Caller must zeroize after use.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.bytes
    }

    /// SHA-512 expansion of the key: scalar half then nonce half.
    pub(crate) fn expand(&self) -> [u8; 64] {
        let digest = Sha512::digest(self.bytes);
        let mut out = [0u8; 64];
        out.copy_from_slice(&digest);
        out
    }

    /// The pruned signing scalar `s`. Its low three bits are always clear.
    pub(crate) fn scalar(&self) -> BigUint {
        let mut h = self.expand();
        let mut s = [0u8; 32];
        s.copy_from_slice(&h[..32]);
        s[0] &= 0xF8;
        s[31] &= 0x7F;
        s[31] |= 0x40;
        let scalar = BigUint::from_bytes_le(&s);
        h.zeroize();
        s.zeroize();
        scalar
    }

    /// The matching public key `B8·(s >> 3)`.
    pub fn public_key(&self) -> Result<PublicKey> {
        let point = Point::base8().mul_scalar(&(self.scalar() >> 3u32))?;
        Ok(PublicKey { point })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A Baby Jubjub public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    point: Point,
}

impl PublicKey {
    /// Build from affine coordinates, rejecting points outside the
    /// prime-order subgroup.
    pub fn from_coordinates(x: Hash, y: Hash) -> Result<Self> {
        let point = Point { x, y };
        if !point.in_subgroup() {
            return Err(IdentityError::InvalidKey(
                "public key is not a subgroup point".into(),
            ));
        }
        Ok(Self { point })
    }

    pub fn point(&self) -> &Point {
        &self.point
    }

    pub fn x(&self) -> Hash {
        self.point.x
    }

    pub fn y(&self) -> Hash {
        self.point.y
    }
}
