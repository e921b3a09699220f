//! Account records and envelope persistence for VeilDrive.
//!
//! Two registries back the custody core:
//! - [`AccountDirectory`] holds account records — credential hash, public
//!   keys, and password-wrapped private keys. Password change is the single
//!   serialization point: the record is re-wrapped and replaced under one
//!   write lock, so a concurrent login sees the old or the new wrapping
//!   entirely, never a mix.
//! - [`EnvelopeStore`] is the narrow contract the codec's callers persist
//!   through. The in-memory implementation drives the pending → sealed /
//!   failed lifecycle; readers can only ever observe fully sealed rows.

pub mod accounts;
pub mod envelopes;

use thiserror::Error;
use veildrive_crypto::CryptoError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in account and envelope storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already registered: {0}")]
    DuplicateUsername(String),

    #[error("account not found")]
    AccountNotFound,

    /// Unknown username and wrong password collapse into this one variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("envelope not found")]
    EnvelopeNotFound,

    #[error("envelope is not pending")]
    NotPending,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(String),
}

pub use accounts::{AccountDirectory, AccountId, AccountRecord, CredentialHash};
pub use envelopes::{EnvelopeId, EnvelopeStore, MemoryEnvelopeStore};
