use thiserror::Error;

use starksign_crypto::{FeltError, SignError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("type `{0}` is not defined in the schema")]
    UnknownType(String),
    #[error("type `{0}` has an empty field list")]
    EmptyTypeDefinition(String),
    #[error("cyclic reference through type `{0}`")]
    CyclicReference(String),
    #[error("merkletree field `{0}` is missing its `contains` leaf type")]
    MissingLeafType(String),
}

/// A value in the document cannot be coerced to its declared type. Always
/// carries the path of the offending field (e.g. `message.from.wallet`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("`{path}`: expected {expected}")]
    TypeMismatch { path: String, expected: &'static str },
    #[error("`{path}`: missing field")]
    MissingField { path: String },
    #[error("`{path}`: number is not an integer")]
    NonInteger { path: String },
    #[error("`{path}`: negative value for an unsigned field")]
    NegativeUnsigned { path: String },
    #[error("`{path}`: value out of range for `{kind}`")]
    OutOfRange { path: String, kind: &'static str },
    #[error("`{path}`: {source}")]
    Felt { path: String, source: FeltError },
    #[error("`{path}`: a merkletree field needs at least one leaf")]
    EmptyMerkleTree { path: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypedDataError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[derive(Debug, Error)]
pub enum SignMessageError {
    #[error(transparent)]
    TypedData(#[from] TypedDataError),
    #[error(transparent)]
    Sign(#[from] SignError),
}

/// Outcome classification of the remote verification path. A negative
/// verification is `Ok(false)` on the calling side; every variant here
/// means the check could not be interpreted as valid-or-invalid.
#[derive(Debug, Error)]
pub enum RemoteVerificationError {
    /// The account contract has no code on-chain. Distinguished from
    /// "invalid" so callers can tell the user to deploy the account.
    #[error("account contract is not deployed")]
    AccountNotDeployed,
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    TypedData(#[from] TypedDataError),
}
