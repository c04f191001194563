//! Poseidon hashing over the BN254 scalar field.
//!
//! Width 3, rate 2, 8 full rounds and 57 partial rounds with an x^5
//! S-box. Inputs are absorbed with a fixed-length domain, so hashes of
//! different arities never collide by construction.

use halo2curves_axiom::ff::Field;
use poseidon_primitives::poseidon::primitives::{ConstantLength, Hash as PoseidonHash, Spec};

use super::field::{Fr, Hash};
use crate::error::{IdentityError, Result};

const POSEIDON_T: usize = 3;
const POSEIDON_RATE: usize = 2;
const POSEIDON_FULL_ROUNDS: usize = 8;
const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Largest number of inputs accepted by [`hash_elems`].
pub const MAX_INPUTS: usize = 6;

#[derive(Debug)]
struct StatePoseidonSpec;

impl Spec<Fr, POSEIDON_T, POSEIDON_RATE> for StatePoseidonSpec {
    fn full_rounds() -> usize {
        POSEIDON_FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        POSEIDON_PARTIAL_ROUNDS
    }

    fn sbox(val: Fr) -> Fr {
        val.pow_vartime([5])
    }

    fn secure_mds() -> usize {
        0
    }
}

/// Hash a fixed number of field elements.
pub fn poseidon<const L: usize>(values: [Fr; L]) -> Fr {
    PoseidonHash::<Fr, StatePoseidonSpec, ConstantLength<L>, POSEIDON_T, POSEIDON_RATE>::init()
        .hash(values)
}

/// Hash a slice of field elements.
pub fn hash_fr(inputs: &[Fr]) -> Result<Fr> {
    match *inputs {
        [a] => Ok(poseidon([a])),
        [a, b] => Ok(poseidon([a, b])),
        [a, b, c] => Ok(poseidon([a, b, c])),
        [a, b, c, d] => Ok(poseidon([a, b, c, d])),
        [a, b, c, d, e] => Ok(poseidon([a, b, c, d, e])),
        [a, b, c, d, e, f] => Ok(poseidon([a, b, c, d, e, f])),
        _ => Err(IdentityError::EncodingError(format!(
            "poseidon accepts 1..={MAX_INPUTS} inputs, got {}",
            inputs.len()
        ))),
    }
}

/// Hash encoded field elements, e.g. two subtree roots.
pub fn hash_elems(inputs: &[Hash]) -> Result<Hash> {
    let frs = inputs
        .iter()
        .map(Hash::to_fr)
        .collect::<Result<Vec<_>>>()?;
    hash_fr(&frs).map(Hash::from)
}
