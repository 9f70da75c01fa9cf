//! The Stark field element type.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::FeltError;
use crate::fp::{self, FIELD_PRIME};

/// An element of the Stark field, canonically reduced into `[0, P)` with
/// `P = 2^251 + 17·2^192 + 1`. Stored as four little-endian 64-bit limbs.
///
/// All constructors reject values at or above the field prime, so a `Felt`
/// in hand is always canonical. Rendered as `0x`-prefixed lowercase
/// hexadecimal without leading zeros.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Felt(pub(crate) [u64; 4]);

impl Felt {
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    pub const ONE: Self = Self([1, 0, 0, 0]);

    /// Build from raw limbs known to be below the field prime.
    pub(crate) const fn from_raw(limbs: [u64; 4]) -> Self {
        Self(limbs)
    }

    pub fn from_u64(value: u64) -> Self {
        Self([value, 0, 0, 0])
    }

    pub fn from_u128(value: u128) -> Self {
        Self([value as u64, (value >> 64) as u64, 0, 0])
    }

    /// Signed conversion; negative values wrap to `P - |v|`.
    pub fn from_i128(value: i128) -> Self {
        if value >= 0 {
            Self::from_u128(value as u128)
        } else {
            let abs = Self::from_u128(value.unsigned_abs());
            Self(fp::mod_sub(&[0; 4], &abs.0, &FIELD_PRIME))
        }
    }

    /// Parse a hexadecimal literal, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, FeltError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return Err(FeltError::InvalidHex(s.to_string()));
        }
        let mut limbs = [0u64; 4];
        for c in digits.chars() {
            let d = c
                .to_digit(16)
                .ok_or_else(|| FeltError::InvalidHex(s.to_string()))?;
            for i in (1..4).rev() {
                limbs[i] = (limbs[i] << 4) | (limbs[i - 1] >> 60);
            }
            limbs[0] = (limbs[0] << 4) | u64::from(d);
        }
        Self::checked(limbs)
    }

    /// Parse a decimal literal.
    pub fn from_dec_str(s: &str) -> Result<Self, FeltError> {
        if s.is_empty() {
            return Err(FeltError::InvalidDecimal(s.to_string()));
        }
        let mut limbs = [0u64; 4];
        for c in s.chars() {
            let d = c
                .to_digit(10)
                .ok_or_else(|| FeltError::InvalidDecimal(s.to_string()))?;
            let mut carry: u128 = u128::from(d);
            for limb in &mut limbs {
                let t = u128::from(*limb) * 10 + carry;
                *limb = t as u64;
                carry = t >> 64;
            }
            if carry != 0 {
                return Err(FeltError::OutOfRange);
            }
        }
        Self::checked(limbs)
    }

    /// Interpret up to 31 ASCII characters as a Cairo short string: the
    /// bytes of the string read as a big-endian integer.
    pub fn from_short_string(s: &str) -> Result<Self, FeltError> {
        if !s.is_ascii() {
            return Err(FeltError::ShortStringNotAscii);
        }
        if s.len() > 31 {
            return Err(FeltError::ShortStringTooLong);
        }
        let mut bytes = [0u8; 32];
        bytes[32 - s.len()..].copy_from_slice(s.as_bytes());
        // 31 bytes < 2^248 < P, cannot be out of range
        Self::from_bytes_be(&bytes)
    }

    /// Big-endian byte deserialization, rejecting non-canonical values.
    pub fn from_bytes_be(bytes: &[u8; 32]) -> Result<Self, FeltError> {
        Self::checked(limbs_from_bytes_be(bytes))
    }

    pub fn to_bytes_be(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, limb) in self.0.iter().enumerate() {
            bytes[(3 - i) * 8..(4 - i) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        bytes
    }

    pub fn is_zero(self) -> bool {
        fp::is_zero(&self.0)
    }

    fn checked(limbs: [u64; 4]) -> Result<Self, FeltError> {
        if fp::cmp(&limbs, &FIELD_PRIME) == Ordering::Less {
            Ok(Self(limbs))
        } else {
            Err(FeltError::OutOfRange)
        }
    }
}

pub(crate) fn limbs_from_bytes_be(bytes: &[u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for i in 0..4 {
        let start = (3 - i) * 8;
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&bytes[start..start + 8]);
        limbs[i] = u64::from_be_bytes(chunk);
    }
    limbs
}

impl PartialOrd for Felt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Felt {
    fn cmp(&self, other: &Self) -> Ordering {
        fp::cmp(&self.0, &other.0)
    }
}

impl FromStr for Felt {
    type Err = FeltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::LowerHex for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        let mut seen_nonzero = false;
        for limb in self.0.iter().rev() {
            if seen_nonzero {
                write!(f, "{limb:016x}")?;
            } else if *limb != 0 {
                write!(f, "{limb:x}")?;
                seen_nonzero = true;
            }
        }
        if !seen_nonzero {
            write!(f, "0")?;
        }
        Ok(())
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:#x}")
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({self:#x})")
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{self:#x}"))
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
