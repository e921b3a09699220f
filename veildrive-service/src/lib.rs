//! Upload/download orchestration for VeilDrive.
//!
//! Ties the custody core to its collaborators:
//! - explicit [`ServiceConfig`] built at process start
//! - [`SessionAuthenticator`] seam for request identity resolution
//! - register / login / change-password / upload / download flows with all
//!   CPU-bound crypto dispatched to the blocking worker pool

pub mod config;
pub mod service;
pub mod session;

use thiserror::Error;
use veildrive_crypto::CryptoError;
use veildrive_store::StoreError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the request layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    Validation(String),

    /// Generic credential rejection — never says which part was wrong.
    #[error("credentials rejected")]
    CredentialsRejected,

    #[error("file not found")]
    NotFound,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("worker pool failure: {0}")]
    Worker(String),
}

pub use config::ServiceConfig;
pub use service::DriveService;
pub use session::{AuthenticatedIdentity, Session, SessionAuthenticator, UnlockedKeys};
