//! Short-Weierstrass arithmetic for the Stark curve
//! `y² = x³ + α·x + β` over the Stark field, with `α = 1`.

use crate::errors::PointError;
use crate::felt::Felt;
use crate::fp::{self, FIELD_PRIME as P};

const ALPHA: [u64; 4] = [1, 0, 0, 0];

const BETA: [u64; 4] = [
    0xf4cdfcb99cee9e89,
    0x609ad26c15c915c1,
    0x150e596d72f7a8c5,
    0x06f21413efbe40de,
];

/// The generator point `G`.
pub const GENERATOR: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0x3d723d8bc943cfca,
        0xdeacfd9b0d1819e0,
        0x7beced415a40f0c7,
        0x01ef15c18599971b,
    ]),
    y: Felt::from_raw([
        0x2873000c36e8dc1f,
        0xde53ecd11abe43a3,
        0xb7be4801df46ec62,
        0x005668060aa49730,
    ]),
    infinity: false,
};

/// A point on the curve in affine coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinePoint {
    pub(crate) x: Felt,
    pub(crate) y: Felt,
    pub(crate) infinity: bool,
}

impl AffinePoint {
    /// Lift `(x, y)` onto the curve, rejecting coordinates that do not
    /// satisfy the curve equation.
    pub fn from_xy(x: Felt, y: Felt) -> Result<Self, PointError> {
        let lhs = fp::mod_mul(&y.0, &y.0, &P);
        let x2 = fp::mod_mul(&x.0, &x.0, &P);
        let x3 = fp::mod_mul(&x2, &x.0, &P);
        let ax = fp::mod_mul(&ALPHA, &x.0, &P);
        let rhs = fp::mod_add(&fp::mod_add(&x3, &ax, &P), &BETA, &P);
        if lhs == rhs {
            Ok(Self { x, y, infinity: false })
        } else {
            Err(PointError::NotOnCurve)
        }
    }

    pub fn x(&self) -> Felt {
        self.x
    }

    pub fn y(&self) -> Felt {
        self.y
    }

    pub fn is_infinity(&self) -> bool {
        self.infinity
    }
}

/// A point in Jacobian projective coordinates (`x = X/Z²`, `y = Y/Z³`).
/// The identity is represented by `Z = 0`. Used internally so scalar
/// multiplication needs a single field inversion at the end.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JacobianPoint {
    x: [u64; 4],
    y: [u64; 4],
    z: [u64; 4],
}

impl JacobianPoint {
    pub(crate) const IDENTITY: Self = Self {
        x: [1, 0, 0, 0],
        y: [1, 0, 0, 0],
        z: [0, 0, 0, 0],
    };

    pub(crate) fn from_affine(p: &AffinePoint) -> Self {
        if p.infinity {
            Self::IDENTITY
        } else {
            Self {
                x: p.x.0,
                y: p.y.0,
                z: [1, 0, 0, 0],
            }
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        fp::is_zero(&self.z)
    }

    pub(crate) fn to_affine(self) -> AffinePoint {
        if self.is_identity() {
            return AffinePoint {
                x: Felt::ZERO,
                y: Felt::ZERO,
                infinity: true,
            };
        }
        let zinv = fp::mod_inv(&self.z, &P);
        let zinv2 = fp::mod_mul(&zinv, &zinv, &P);
        let zinv3 = fp::mod_mul(&zinv2, &zinv, &P);
        AffinePoint {
            x: Felt(fp::mod_mul(&self.x, &zinv2, &P)),
            y: Felt(fp::mod_mul(&self.y, &zinv3, &P)),
            infinity: false,
        }
    }

    pub(crate) fn double(&self) -> Self {
        if self.is_identity() || fp::is_zero(&self.y) {
            return Self::IDENTITY;
        }
        let ysq = fp::mod_mul(&self.y, &self.y, &P);
        // s = 4·x·y²
        let s = fp::mod_mul(&self.x, &ysq, &P);
        let s = fp::mod_add(&s, &s, &P);
        let s = fp::mod_add(&s, &s, &P);
        // m = 3·x² + α·z⁴
        let x2 = fp::mod_mul(&self.x, &self.x, &P);
        let three_x2 = fp::mod_add(&fp::mod_add(&x2, &x2, &P), &x2, &P);
        let z2 = fp::mod_mul(&self.z, &self.z, &P);
        let z4 = fp::mod_mul(&z2, &z2, &P);
        let m = fp::mod_add(&three_x2, &fp::mod_mul(&ALPHA, &z4, &P), &P);
        // x' = m² − 2s
        let x3 = fp::mod_sub(&fp::mod_sub(&fp::mod_mul(&m, &m, &P), &s, &P), &s, &P);
        // y' = m·(s − x') − 8·y⁴
        let ysq2 = fp::mod_mul(&ysq, &ysq, &P);
        let mut eight_y4 = fp::mod_add(&ysq2, &ysq2, &P);
        eight_y4 = fp::mod_add(&eight_y4, &eight_y4, &P);
        eight_y4 = fp::mod_add(&eight_y4, &eight_y4, &P);
        let y3 = fp::mod_sub(&fp::mod_mul(&m, &fp::mod_sub(&s, &x3, &P), &P), &eight_y4, &P);
        // z' = 2·y·z
        let yz = fp::mod_mul(&self.y, &self.z, &P);
        let z3 = fp::mod_add(&yz, &yz, &P);
        Self { x: x3, y: y3, z: z3 }
    }

    pub(crate) fn add(&self, other: &Self) -> Self {
        if self.is_identity() {
            return *other;
        }
        if other.is_identity() {
            return *self;
        }
        let z1z1 = fp::mod_mul(&self.z, &self.z, &P);
        let z2z2 = fp::mod_mul(&other.z, &other.z, &P);
        let u1 = fp::mod_mul(&self.x, &z2z2, &P);
        let u2 = fp::mod_mul(&other.x, &z1z1, &P);
        let s1 = fp::mod_mul(&fp::mod_mul(&self.y, &other.z, &P), &z2z2, &P);
        let s2 = fp::mod_mul(&fp::mod_mul(&other.y, &self.z, &P), &z1z1, &P);
        if u1 == u2 {
            return if s1 == s2 { self.double() } else { Self::IDENTITY };
        }
        let h = fp::mod_sub(&u2, &u1, &P);
        let r = fp::mod_sub(&s2, &s1, &P);
        let hh = fp::mod_mul(&h, &h, &P);
        let hhh = fp::mod_mul(&hh, &h, &P);
        let v = fp::mod_mul(&u1, &hh, &P);
        // x3 = r² − h³ − 2v
        let x3 = fp::mod_sub(
            &fp::mod_sub(&fp::mod_mul(&r, &r, &P), &hhh, &P),
            &fp::mod_add(&v, &v, &P),
            &P,
        );
        // y3 = r·(v − x3) − s1·h³
        let y3 = fp::mod_sub(
            &fp::mod_mul(&r, &fp::mod_sub(&v, &x3, &P), &P),
            &fp::mod_mul(&s1, &hhh, &P),
            &P,
        );
        let z3 = fp::mod_mul(&fp::mod_mul(&self.z, &other.z, &P), &h, &P);
        Self { x: x3, y: y3, z: z3 }
    }
}

/// MSB-first double-and-add scalar multiplication.
pub(crate) fn scalar_mul(scalar: &[u64; 4], base: &AffinePoint) -> JacobianPoint {
    let base = JacobianPoint::from_affine(base);
    let mut acc = JacobianPoint::IDENTITY;
    for i in (0..bits(scalar)).rev() {
        acc = acc.double();
        if (scalar[i / 64] >> (i % 64)) & 1 == 1 {
            acc = acc.add(&base);
        }
    }
    acc
}

fn bits(limbs: &[u64; 4]) -> usize {
    for i in (0..4).rev() {
        if limbs[i] != 0 {
            return i * 64 + 64 - limbs[i].leading_zeros() as usize;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fp::CURVE_ORDER;

    #[test]
    fn test_generator_on_curve() {
        assert!(AffinePoint::from_xy(GENERATOR.x, GENERATOR.y).is_ok());
    }

    #[test]
    fn test_off_curve_rejected() {
        let bad = Felt::from_u64(12345);
        assert_eq!(
            AffinePoint::from_xy(GENERATOR.x, bad),
            Err(PointError::NotOnCurve)
        );
    }

    #[test]
    fn test_order_annihilates_generator() {
        assert!(scalar_mul(&CURVE_ORDER, &GENERATOR).is_identity());
    }

    #[test]
    fn test_double_matches_addition_chain() {
        // 2G + G == 3G computed straight
        let two_g = scalar_mul(&[2, 0, 0, 0], &GENERATOR);
        let three_g = scalar_mul(&[3, 0, 0, 0], &GENERATOR);
        let sum = two_g.add(&JacobianPoint::from_affine(&GENERATOR));
        assert_eq!(sum.to_affine(), three_g.to_affine());
    }

    #[test]
    fn test_add_inverse_is_identity() {
        let g = JacobianPoint::from_affine(&GENERATOR);
        let minus_g = JacobianPoint::from_affine(&AffinePoint {
            x: GENERATOR.x,
            y: Felt(fp::mod_sub(&[0; 4], &GENERATOR.y.0, &P)),
            infinity: false,
        });
        assert!(g.add(&minus_g).is_identity());
    }

    #[test]
    fn test_scalar_mul_golden_key() {
        // public key for private key 0x1234567890987654321
        let private = Felt::from_hex("0x1234567890987654321").unwrap();
        let public = scalar_mul(&private.0, &GENERATOR).to_affine();
        assert_eq!(
            public.x(),
            Felt::from_hex("0x20c29f1c98f3320d56f01c13372c923123c35828bce54f2153aa1cfe61c44f2")
                .unwrap()
        );
        assert_eq!(
            public.y(),
            Felt::from_hex("0x18277bc1bc80570f859cb882ca70d52f1a0e06275e5dd704dddbbe19faadf")
                .unwrap()
        );
    }

    #[test]
    fn test_derived_point_is_on_curve() {
        let k = Felt::from_u64(987_654_321);
        let p = scalar_mul(&k.0, &GENERATOR).to_affine();
        assert!(AffinePoint::from_xy(p.x(), p.y()).is_ok());
    }
}
