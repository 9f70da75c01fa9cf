//! Deterministic ECDSA over the Stark curve.
//!
//! Nonces come from an RFC 6979 HMAC-SHA256 stream seeded with the private
//! key and the message hash, so signing never depends on an external RNG
//! and a given `(key, hash)` pair always produces the same signature.

use std::cmp::Ordering;
use std::ptr;
use std::sync::atomic::{compiler_fence, Ordering as MemOrdering};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::curve::{scalar_mul, AffinePoint, GENERATOR};
use crate::errors::{PointError, SignError, SignatureFormatError};
use crate::felt::{limbs_from_bytes_be, Felt};
use crate::fp::{self, CURVE_ORDER};

type HmacSha256 = Hmac<Sha256>;

/// Bound on `r = 0` / `s = 0` retries. Hitting it is a sign of a broken
/// nonce stream, not of bad luck.
const MAX_SIGN_ATTEMPTS: u32 = 64;

/// Bound on nonce candidates rejected for falling outside `[1, N)`.
const MAX_NONCE_CANDIDATES: u32 = 1024;

/// A private signing scalar in `[1, N)`. The backing memory is zeroed
/// when the key is dropped; the key is never printed.
pub struct SigningKey {
    secret: Felt,
}

impl SigningKey {
    pub fn from_secret_scalar(secret: Felt) -> Result<Self, SignError> {
        if secret.is_zero() || fp::cmp(&secret.0, &CURVE_ORDER) != Ordering::Less {
            return Err(SignError::InvalidScalar);
        }
        Ok(Self { secret })
    }

    /// Derive the public key, `secret · G`.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            point: scalar_mul(&self.secret.0, &GENERATOR).to_affine(),
        }
    }

    /// Produce a deterministic signature over a message hash.
    pub fn sign(&self, message_hash: &Felt) -> Result<Signature, SignError> {
        let mut nonces = NonceStream::new(&self.secret, message_hash);
        let m = reduce_once(&message_hash.0);
        for _ in 0..MAX_SIGN_ATTEMPTS {
            let mut k = nonces.next_nonce()?;
            let r_point = scalar_mul(&k.0, &GENERATOR).to_affine();
            let r = reduce_once(&r_point.x().0);
            if fp::is_zero(&r) {
                zeroize_limbs(&mut k.0);
                continue;
            }
            // s = k⁻¹ · (m + r·secret) mod N
            let mut k_inv = fp::mod_inv(&k.0, &CURVE_ORDER);
            zeroize_limbs(&mut k.0);
            let rx = fp::mod_mul(&r, &self.secret.0, &CURVE_ORDER);
            let s = fp::mod_mul(&k_inv, &fp::mod_add(&m, &rx, &CURVE_ORDER), &CURVE_ORDER);
            zeroize_limbs(&mut k_inv);
            if fp::is_zero(&s) {
                continue;
            }
            return Ok(Signature {
                r: Felt(r),
                s: Felt(s),
            });
        }
        Err(SignError::NonceExhausted(MAX_SIGN_ATTEMPTS))
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        zeroize_limbs(&mut self.secret.0);
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// A public key: the full affine point. `stark_key()` is the canonical
/// x-coordinate identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey {
    point: AffinePoint,
}

impl VerifyingKey {
    /// Lift public-key coordinates, checking the curve equation.
    pub fn from_coordinates(x: Felt, y: Felt) -> Result<Self, PointError> {
        Ok(Self {
            point: AffinePoint::from_xy(x, y)?,
        })
    }

    pub fn stark_key(&self) -> Felt {
        self.point.x()
    }

    pub fn point(&self) -> &AffinePoint {
        &self.point
    }

    /// The ECDSA verification equation. Malformed signatures (zero or
    /// out-of-range components) verify as `false` rather than erroring;
    /// use [`Signature::validate`] to surface the reason.
    pub fn verify(&self, message_hash: &Felt, signature: &Signature) -> bool {
        if signature.validate().is_err() {
            return false;
        }
        let m = reduce_once(&message_hash.0);
        let w = fp::mod_inv(&signature.s.0, &CURVE_ORDER);
        let u1 = fp::mod_mul(&m, &w, &CURVE_ORDER);
        let u2 = fp::mod_mul(&signature.r.0, &w, &CURVE_ORDER);
        let sum = scalar_mul(&u1, &GENERATOR).add(&scalar_mul(&u2, &self.point));
        if sum.is_identity() {
            return false;
        }
        reduce_once(&sum.to_affine().x().0) == signature.r.0
    }
}

/// An ECDSA signature, two field elements below the curve order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: Felt,
    pub s: Felt,
}

impl Signature {
    pub fn new(r: Felt, s: Felt) -> Self {
        Self { r, s }
    }

    /// Normalize a signature felt array. Wallets return either `[r, s]`
    /// or `[r, s, v]` where `v` is a recovery hint; the hint is accepted
    /// and discarded.
    pub fn from_felts(parts: &[Felt]) -> Result<Self, SignatureFormatError> {
        match parts {
            [r, s] | [r, s, _] => Ok(Self { r: *r, s: *s }),
            _ => Err(SignatureFormatError::InvalidLength(parts.len())),
        }
    }

    /// Check both components are in `[1, N)`.
    pub fn validate(&self) -> Result<(), SignatureFormatError> {
        for component in [&self.r, &self.s] {
            if component.is_zero() {
                return Err(SignatureFormatError::ZeroComponent);
            }
            if fp::cmp(&component.0, &CURVE_ORDER) != Ordering::Less {
                return Err(SignatureFormatError::OutOfRange);
            }
        }
        Ok(())
    }
}

/// One conditional subtraction: maps a value below `P` (< 2N) into `[0, N)`.
fn reduce_once(value: &[u64; 4]) -> [u64; 4] {
    if fp::cmp(value, &CURVE_ORDER) == Ordering::Less {
        *value
    } else {
        fp::sub(value, &CURVE_ORDER).0
    }
}

/// RFC 6979 §3.2 HMAC_DRBG. Successive calls continue the stream, which
/// is what the bounded `r = 0` / `s = 0` retry consumes.
struct NonceStream {
    k: [u8; 32],
    v: [u8; 32],
    reseed: bool,
}

impl NonceStream {
    fn new(secret: &Felt, message_hash: &Felt) -> Self {
        let x = secret.to_bytes_be();
        let h = message_hash.to_bytes_be();
        let mut k = [0u8; 32];
        let mut v = [1u8; 32];
        k = hmac_sha256(&k, &[&v, &[0x00], &x, &h]);
        v = hmac_sha256(&k, &[&v]);
        k = hmac_sha256(&k, &[&v, &[0x01], &x, &h]);
        v = hmac_sha256(&k, &[&v]);
        Self { k, v, reseed: false }
    }

    fn next_nonce(&mut self) -> Result<Felt, SignError> {
        for _ in 0..MAX_NONCE_CANDIDATES {
            if self.reseed {
                self.k = hmac_sha256(&self.k, &[&self.v, &[0x00]]);
                self.v = hmac_sha256(&self.k, &[&self.v]);
            }
            self.reseed = true;
            self.v = hmac_sha256(&self.k, &[&self.v]);
            // take the leftmost 252 bits (the scalar size)
            let candidate = shr4(&limbs_from_bytes_be(&self.v));
            if !fp::is_zero(&candidate) && fp::cmp(&candidate, &CURVE_ORDER) == Ordering::Less {
                return Ok(Felt(candidate));
            }
        }
        Err(SignError::NonceExhausted(MAX_NONCE_CANDIDATES))
    }
}

impl Drop for NonceStream {
    fn drop(&mut self) {
        zeroize_bytes(&mut self.k);
        zeroize_bytes(&mut self.v);
    }
}

fn hmac_sha256(key: &[u8; 32], chunks: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for chunk in chunks {
        mac.update(chunk);
    }
    mac.finalize().into_bytes().into()
}

fn shr4(limbs: &[u64; 4]) -> [u64; 4] {
    let mut out = [0u64; 4];
    for i in 0..4 {
        out[i] = limbs[i] >> 4;
        if i < 3 {
            out[i] |= limbs[i + 1] << 60;
        }
    }
    out
}

fn zeroize_limbs(limbs: &mut [u64; 4]) {
    for limb in limbs {
        // volatile so the writes survive dead-store elimination
        unsafe { ptr::write_volatile(limb, 0) };
    }
    compiler_fence(MemOrdering::SeqCst);
}

fn zeroize_bytes(bytes: &mut [u8; 32]) {
    for byte in bytes {
        unsafe { ptr::write_volatile(byte, 0) };
    }
    compiler_fence(MemOrdering::SeqCst);
}
