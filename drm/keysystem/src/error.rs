use thiserror::Error;

use drm_core::{ContentKeyError, PsshError, ReadError};

/**
    Errors from the fallible helpers behind the key-system operations.

    The [`KeySystem`](crate::KeySystem) operations themselves never return
    these: they log the failure and report "no value" instead.
*/
#[derive(Debug, Error)]
pub enum KeySystemError {
    // ── PSSH (delegated to drm-core) ──────────────────────────────────
    #[error(transparent)]
    Pssh(#[from] PsshError),

    #[error("truncated data: {0}")]
    Truncated(#[from] ReadError),

    // ── Text encodings ────────────────────────────────────────────────
    #[error("invalid base64 in {field}: {reason}")]
    InvalidBase64 {
        field: &'static str,
        reason: String,
    },
    #[error("invalid UTF-16 text: {0}")]
    InvalidUtf16(String),
    #[error("invalid UTF-8 text: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    // ── Structured payloads ───────────────────────────────────────────
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML: {0}")]
    InvalidXml(String),
    #[error("malformed PlayReady header: {0}")]
    PlayReadyHeader(String),

    // ── Keys ──────────────────────────────────────────────────────────
    #[error(transparent)]
    ContentKey(#[from] ContentKeyError),

    // ── Configuration ─────────────────────────────────────────────────
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<quick_xml::Error> for KeySystemError {
    fn from(e: quick_xml::Error) -> Self {
        Self::InvalidXml(e.to_string())
    }
}

/**
    Type alias for results that may return a [`KeySystemError`].
*/
pub type KeySystemResult<T> = std::result::Result<T, KeySystemError>;
