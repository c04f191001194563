//! Randomness for keys, revocation nonces and sealing parameters.
//!
//! Everything draws from the thread-local CSPRNG in `rand`, which is
//! seeded from the operating system.

use rand::{Rng, RngCore};

/// `N` random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// A fresh revocation nonce. Zero is skipped so it never collides with
/// the default nonce of an option record that left it unset.
pub fn random_rev_nonce() -> u64 {
    rand::thread_rng().gen_range(1..=u64::MAX)
}
