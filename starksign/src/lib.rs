//! Typed-data signing for Starknet accounts.
//!
//! This crate hashes schema-described ("typed data") documents the way
//! wallets do, signs them with [`SigningKey`]s from
//! [`starksign_crypto`], and verifies signatures either locally against a
//! public key or remotely against a deployed account contract.
//!
//! Hashing and local verification are pure and synchronous; only
//! [`RemoteVerifier`] touches the network, one JSON-RPC round trip per
//! verification.

pub mod errors;
pub mod merkle;
mod rpc;
pub mod typed_data;
pub mod verify;

pub use errors::{
    EncodingError, RemoteVerificationError, SchemaError, SignMessageError, TypedDataError,
};
pub use typed_data::{Parameter, TypedData, DOMAIN_TYPE_NAME};
pub use verify::{sign_message, verify_message, RemoteVerifier, RemoteVerifierBuilder};

// Re-export the primitive types every caller needs alongside the
// document-level API.
pub use starksign_crypto::{Felt, Signature, SigningKey, VerifyingKey};
