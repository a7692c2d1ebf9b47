//! Error types for the nas-token crate

use thiserror::Error;

/// Result type alias using `TokenError`
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur while encoding, splitting or signing tokens
#[derive(Error, Debug)]
pub enum TokenError {
    /// Invalid base64url alphabet or impossible input length
    #[error("base64url decode failed: {0}")]
    Decode(String),

    /// Token does not have exactly three segments
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Key material could not be read from its source
    #[error("failed to load key from {source_name}: {reason}")]
    KeyLoad { source_name: String, reason: String },

    /// Key material was read but is not a usable RSA key
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signing primitive failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// Claims could not be serialized or parsed
    #[error("claims serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenError {
    /// True for failures of the configured key material.
    ///
    /// These are startup errors, not per-request authentication failures.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::KeyLoad { .. } | Self::InvalidKey(_))
    }
}
