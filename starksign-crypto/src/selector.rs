//! The starknet Keccak: Keccak-256 truncated to 250 bits, used to derive
//! entrypoint selectors and type hashes from names.

use sha3::{Digest, Keccak256};

use crate::felt::{limbs_from_bytes_be, Felt};

/// Keccak-256 of `data` with the top 6 bits cleared, as a field element.
pub fn starknet_keccak(data: &[u8]) -> Felt {
    let mut hash: [u8; 32] = Keccak256::digest(data).into();
    // keep the low 250 bits so the result always fits in the field
    hash[0] &= 0x03;
    Felt::from_raw(limbs_from_bytes_be(&hash))
}

/// Selector for a function or type signature name.
pub fn selector_from_name(name: &str) -> Felt {
    starknet_keccak(name.as_bytes())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("transfer", "0x83afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e")]
    #[case(
        "is_valid_signature",
        "0x28420862938116cb3bbdbedee07451ccc54d4e9412dbef71142ad1980a30941"
    )]
    #[case(
        "StarkNetDomain(name:felt,version:felt,chainId:felt)",
        "0x1bfc207425a47a5dfa1a50a4f5241203f50624ca5fdf5e18755765416b8e288"
    )]
    fn test_selector_from_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(selector_from_name(name), Felt::from_hex(expected).unwrap());
    }

    #[test]
    fn test_one_character_difference() {
        assert_ne!(selector_from_name("transfer"), selector_from_name("transfeR"));
    }
}
