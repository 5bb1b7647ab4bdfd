//! Error types for the Nodegraph Kernel Core.

use thiserror::Error;

/// Errors raised while constructing or verifying core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A required string was empty.
    #[error("invalid string: {0} must not be empty")]
    InvalidString(&'static str),

    /// A string used the reserved `_` prefix.
    #[error("reserved string: {0:?} starts with the reserved prefix")]
    ReservedString(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
