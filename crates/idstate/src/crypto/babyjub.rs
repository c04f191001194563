//! Baby Jubjub twisted Edwards curve over the BN254 scalar field.
//!
//! `a·x² + y² = 1 + d·x²·y²` with `a = 168700`, `d = 168696`.
//! Only affine arithmetic is provided; it is used for key derivation and
//! signature checks, never in a hot loop.

use halo2curves_axiom::ff::Field;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::field::{Fr, Hash};
use crate::error::Result;

/// Order of the prime subgroup generated by [`Point::base8`].
pub static SUBORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"2736030358979909402780800718157159386076813972158567259200215660948447373041",
        10,
    )
    .expect("valid suborder literal")
});

static BASE8: Lazy<Point> = Lazy::new(|| Point {
    x: Hash::from_decimal(
        "5299619240641551281634865583518297030282874472190772894086521144482721001553",
    )
    .expect("valid base point x"),
    y: Hash::from_decimal(
        "16950150798460657717958625567821834550301663161624707787222815936182638968203",
    )
    .expect("valid base point y"),
});

fn curve_a() -> Fr {
    Fr::from(168_700u64)
}

fn curve_d() -> Fr {
    Fr::from(168_696u64)
}

/// An affine curve point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: Hash,
    pub y: Hash,
}

impl Point {
    /// The neutral element `(0, 1)`.
    pub fn identity() -> Self {
        Self {
            x: Hash::ZERO,
            y: Hash::from_u64(1),
        }
    }

    /// Generator of the prime-order subgroup (`8·G`).
    pub fn base8() -> Self {
        *BASE8
    }

    fn coords(&self) -> Result<(Fr, Fr)> {
        Ok((self.x.to_fr()?, self.y.to_fr()?))
    }

    /// Whether the point satisfies the curve equation.
    pub fn is_on_curve(&self) -> bool {
        let Ok((x, y)) = self.coords() else {
            return false;
        };
        let x2 = x.square();
        let y2 = y.square();
        curve_a() * x2 + y2 == Fr::one() + curve_d() * x2 * y2
    }

    /// Complete twisted Edwards addition.
    pub fn add(&self, other: &Point) -> Result<Point> {
        let (x1, y1) = self.coords()?;
        let (x2, y2) = other.coords()?;
        let dxy = curve_d() * x1 * x2 * y1 * y2;
        // d is a non-square, so neither denominator vanishes for curve points.
        let x_den = Option::from((Fr::one() + dxy).invert()).unwrap_or(Fr::zero());
        let y_den = Option::from((Fr::one() - dxy).invert()).unwrap_or(Fr::zero());
        let x3 = (x1 * y2 + y1 * x2) * x_den;
        let y3 = (y1 * y2 - curve_a() * x1 * x2) * y_den;
        Ok(Point {
            x: Hash::from_fr(&x3),
            y: Hash::from_fr(&y3),
        })
    }

    /// Double-and-add scalar multiplication, most significant bit first.
    pub fn mul_scalar(&self, k: &BigUint) -> Result<Point> {
        let mut acc = Point::identity();
        for i in (0..k.bits()).rev() {
            acc = acc.add(&acc)?;
            if k.bit(i) {
                acc = acc.add(self)?;
            }
        }
        Ok(acc)
    }

    /// Whether the point lies in the prime-order subgroup.
    pub fn in_subgroup(&self) -> bool {
        self.is_on_curve()
            && self
                .mul_scalar(&SUBORDER)
                .map(|p| p == Point::identity())
                .unwrap_or(false)
    }
}
