//! Stark-curve cryptography: field elements, curve arithmetic, the
//! Pedersen hash, the starknet Keccak selector and deterministic ECDSA.
//!
//! Everything in this crate is pure and synchronous; nothing here touches
//! the network or shared state.

pub mod curve;
pub mod ecdsa;
pub mod errors;
pub mod felt;
mod fp;
pub mod pedersen;
pub mod selector;

pub use curve::AffinePoint;
pub use ecdsa::{Signature, SigningKey, VerifyingKey};
pub use errors::{FeltError, PointError, SignError, SignatureFormatError};
pub use felt::Felt;
pub use pedersen::{hash_elements, pedersen_hash};
pub use selector::{selector_from_name, starknet_keccak};
