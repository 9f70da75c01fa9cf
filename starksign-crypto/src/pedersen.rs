//! The Pedersen hash over the Stark curve, and the chained variant that
//! struct and array hashing build on.
//!
//! `pedersen_hash(a, b)` splits each input into its low 248 bits and high
//! 4 bits, multiplies them against fixed curve points and folds everything
//! into the shift point; the x-coordinate of the sum is the digest.

use crate::curve::{scalar_mul, AffinePoint, JacobianPoint};
use crate::felt::Felt;

const SHIFT_POINT: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0x551fde4050ca6804,
        0x716b0b1022947733,
        0x00ee1b87eb599f16,
        0x049ee3eba8c16007,
    ]),
    y: Felt::from_raw([
        0xd0405d266e10268a,
        0x4e621062c0e056c1,
        0xf346d49d06ea0ed3,
        0x03ca0cfe4b3bc6dd,
    ]),
    infinity: false,
};

const P0: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0x1080d17957ebe47b,
        0x8fa8120b6d56eb0c,
        0x969c748655fca9e5,
        0x0234287dcbaffe7f,
    ]),
    y: Felt::from_raw([
        0x6ed0268ee89e5615,
        0x940135dd7a6c94cc,
        0x1e889527d41f4e39,
        0x03b056f100f96fb2,
    ]),
    infinity: false,
};

const P1: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0xb7a6932dba8aa378,
        0x99099ec1de5e3018,
        0x3f9dab2656558f33,
        0x04fa56f376c83db3,
    ]),
    y: Felt::from_raw([
        0x5168f4e80ff5b54d,
        0x562761f92a7a23b4,
        0x8113e0c0e47e4401,
        0x03fa0984c931c9e3,
    ]),
    infinity: false,
};

const P2: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0x3aa372f0bd2d6997,
        0x40c690c74709e90f,
        0x764910f75b45f74b,
        0x04ba4cc166be8dec,
    ]),
    y: Felt::from_raw([
        0x48151f27b24b219c,
        0xcac5c59a5ce5ae7c,
        0x4b971e46c4ede85f,
        0x0040301cf5c1751f,
    ]),
    infinity: false,
};

const P3: AffinePoint = AffinePoint {
    x: Felt::from_raw([
        0xd36ff12c49a58202,
        0x2ca65048d53fb325,
        0x6e44cca8f61a63bb,
        0x054302dcb0e6cc1c,
    ]),
    y: Felt::from_raw([
        0x879dcc77e99c2426,
        0xce98ad783c25561a,
        0xb348046268d8ae25,
        0x01b77b3e37d13504,
    ]),
    infinity: false,
};

const LOW_248_MASK: u64 = 0x00ff_ffff_ffff_ffff;

/// Hash two field elements.
pub fn pedersen_hash(a: &Felt, b: &Felt) -> Felt {
    let mut acc = JacobianPoint::from_affine(&SHIFT_POINT);
    for (value, low_point, high_point) in [(a, &P0, &P1), (b, &P2, &P3)] {
        let low = [value.0[0], value.0[1], value.0[2], value.0[3] & LOW_248_MASK];
        let high = [value.0[3] >> 56, 0, 0, 0];
        if low != [0; 4] {
            acc = acc.add(&scalar_mul(&low, low_point));
        }
        if high != [0; 4] {
            acc = acc.add(&scalar_mul(&high, high_point));
        }
    }
    acc.to_affine().x()
}

/// Chain-hash a sequence: fold `pedersen_hash` from zero over the
/// elements, then mix in the element count. Shared by struct hashing and
/// array hashing.
pub fn hash_elements(elements: &[Felt]) -> Felt {
    let folded = elements
        .iter()
        .fold(Felt::ZERO, |acc, e| pedersen_hash(&acc, e));
    pedersen_hash(&folded, &Felt::from_u64(elements.len() as u64))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        "0x3d937c035c878245caf64531a5756109c53068da139362728feb561405371cb",
        "0x208a0a10250e382e1e4bbe2880906c2791bf6275695e02fbbc6aeff9cd8b31a",
        "0x30e480bed5fe53fa909cc0f8c4d99b8f9f2c016be4c41e13a4848797979c662"
    )]
    #[case(
        "0x58f580910a6ca59b28927c08fe6c43e2e303ca384badc365795fc645d479d45",
        "0x78734f65a067be9bdb39de18434d71e79f7b6466a4b66bbd979ab9e7515fe0b",
        "0x68cc0b76cddd1dd4ed2301ada9b7c872b23875d5ff837b3a87993e0d9996b87"
    )]
    fn test_pedersen_hash(#[case] a: &str, #[case] b: &str, #[case] expected: &str) {
        let a = Felt::from_hex(a).unwrap();
        let b = Felt::from_hex(b).unwrap();
        assert_eq!(pedersen_hash(&a, &b), Felt::from_hex(expected).unwrap());
    }

    #[test]
    fn test_pedersen_zero_inputs() {
        // H(0, 0) is the x-coordinate of the shift point
        assert_eq!(
            pedersen_hash(&Felt::ZERO, &Felt::ZERO),
            Felt::from_hex("0x49ee3eba8c1600700ee1b87eb599f16716b0b1022947733551fde4050ca6804")
                .unwrap()
        );
    }

    #[test]
    fn test_hash_elements() {
        let elements: Vec<Felt> = (1..=4).map(Felt::from_u64).collect();
        assert_eq!(
            hash_elements(&elements),
            Felt::from_hex("0x66bd4335902683054d08a0572747ea78ebd9e531536fb43125424ca9f902084")
                .unwrap()
        );
    }

    #[test]
    fn test_hash_elements_matches_manual_fold() {
        let elements = [Felt::from_u64(7), Felt::from_u64(9)];
        let manual = pedersen_hash(
            &pedersen_hash(&pedersen_hash(&Felt::ZERO, &elements[0]), &elements[1]),
            &Felt::from_u64(2),
        );
        assert_eq!(hash_elements(&elements), manual);
    }

    #[test]
    fn test_hash_elements_empty() {
        assert_eq!(
            hash_elements(&[]),
            pedersen_hash(&Felt::ZERO, &Felt::ZERO)
        );
    }

    #[test]
    fn test_order_sensitivity() {
        let a = Felt::from_u64(1);
        let b = Felt::from_u64(2);
        assert_ne!(pedersen_hash(&a, &b), pedersen_hash(&b, &a));
    }
}
