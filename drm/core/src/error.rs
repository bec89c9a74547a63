use thiserror::Error;

use crate::reader::ReadError;
use crate::types::SystemId;

/**
    Errors from PSSH box parsing.
*/
#[derive(Debug, Clone, Error)]
pub enum PsshError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("malformed PSSH box: {0}")]
    Malformed(String),

    #[error("truncated PSSH box: {0}")]
    Truncated(#[from] ReadError),

    #[error("PSSH system ID is {0}, expected {1}")]
    SystemIdMismatch(SystemId, SystemId),
}

/**
    Errors from constructing or parsing a [`ContentKey`](crate::ContentKey).
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentKeyError {
    #[error("key ID must be 16 bytes, got {0}")]
    InvalidKidLength(usize),

    #[error("key must not be empty")]
    EmptyKey,

    #[error("expected 'kid:key'")]
    InvalidFormat,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid base64: {0}")]
    InvalidBase64(String),
}

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
