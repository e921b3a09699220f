//! Error taxonomy for the custody pipeline.
//!
//! Error payloads never carry key material, plaintext, or derived keys —
//! only which check failed.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during key custody and envelope operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Malformed input, rejected before any crypto runs.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Vault unwrap failed. A wrong password and a corrupted wrapped key
    /// are indistinguishable here.
    #[error("authentication failure")]
    AuthenticationFailure,

    /// A signature or digest check failed while opening an envelope.
    /// The envelope is unreadable but is not deleted.
    #[error("integrity violation: {0}")]
    IntegrityViolation(&'static str),

    /// AEAD decryption failed; no partial plaintext is ever returned.
    #[error("cryptographic operation failed")]
    CryptoFailure,

    /// Collaborator storage failure, opaque to this crate.
    #[error("storage error: {0}")]
    Storage(String),
}
