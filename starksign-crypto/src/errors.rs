use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeltError {
    #[error("invalid hexadecimal literal: `{0}`")]
    InvalidHex(String),
    #[error("invalid decimal literal: `{0}`")]
    InvalidDecimal(String),
    #[error("value does not fit below the field prime")]
    OutOfRange,
    #[error("short strings hold at most 31 characters")]
    ShortStringTooLong,
    #[error("short strings must be ASCII")]
    ShortStringNotAscii,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointError {
    #[error("coordinates do not satisfy the curve equation")]
    NotOnCurve,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("private key must be a nonzero scalar below the curve order")]
    InvalidScalar,
    #[error("could not derive a usable nonce within {0} attempts")]
    NonceExhausted(u32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureFormatError {
    #[error("expected 2 or 3 signature elements, got {0}")]
    InvalidLength(usize),
    #[error("signature component is zero")]
    ZeroComponent,
    #[error("signature component is not below the curve order")]
    OutOfRange,
}
