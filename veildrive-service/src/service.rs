//! Drive service orchestration.
//!
//! Every CPU-bound step — key derivation, keypair generation, sealing,
//! opening — runs on the blocking worker pool; the async request path only
//! awaits results. Uploads are two-phase against the store: a pending row
//! is created first, then either committed with the sealed envelope and
//! blob in one step or aborted with nothing persisted, so a cancelled or
//! failed seal can never leave a partial envelope behind.

use crate::config::ServiceConfig;
use crate::session::{AuthenticatedIdentity, Session, SessionAuthenticator, UnlockedKeys};
use crate::{ServiceError, ServiceResult};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use veildrive_crypto::envelope::{open, seal, FileMetadata};
use veildrive_crypto::vault;
use veildrive_store::{
    AccountDirectory, AccountId, AccountRecord, EnvelopeId, EnvelopeStore, StoreError,
};

/// Coordinates the custody core for one process.
pub struct DriveService<S: EnvelopeStore> {
    config: ServiceConfig,
    directory: Arc<AccountDirectory>,
    store: Arc<S>,
    auth: Arc<dyn SessionAuthenticator>,
}

impl<S: EnvelopeStore + 'static> DriveService<S> {
    pub fn new(
        config: ServiceConfig,
        directory: Arc<AccountDirectory>,
        store: Arc<S>,
        auth: Arc<dyn SessionAuthenticator>,
    ) -> Self {
        Self {
            config,
            directory,
            store,
            auth,
        }
    }

    /// Resolves a request identity to an account via the session layer.
    pub fn authenticate(&self, identity: &AuthenticatedIdentity) -> ServiceResult<AccountId> {
        self.auth.resolve(identity)
    }

    /// Registers an account: generates both keypairs and persists only
    /// wrapped private keys.
    pub async fn register(&self, username: &str, password: &str) -> ServiceResult<AccountRecord> {
        if username.is_empty() {
            return Err(ServiceError::Validation("username is required".to_string()));
        }
        if password.len() < self.config.min_password_len {
            return Err(ServiceError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_len
            )));
        }

        let directory = Arc::clone(&self.directory);
        let username = username.to_string();
        let password = password.to_string();

        let record = tokio::task::spawn_blocking(move || directory.register(&username, &password))
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))??;

        debug!(account = %record.account_id, "registered account");
        Ok(record)
    }

    /// Verifies credentials and unwraps the account's private keys into an
    /// in-memory session.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Session> {
        let directory = Arc::clone(&self.directory);
        let username = username.to_string();
        let password = password.to_string();

        let session = tokio::task::spawn_blocking(move || -> ServiceResult<Session> {
            let record = directory
                .verify_credential(&username, &password)
                .map_err(|e| match e {
                    StoreError::InvalidCredentials => ServiceError::CredentialsRejected,
                    other => other.into(),
                })?;

            let kem_private = vault::unwrap(&record.kem_private_wrapped, &password)?;
            let sig_private = vault::unwrap(&record.sig_private_wrapped, &password)?;

            Ok(Session {
                account_id: record.account_id,
                keys: UnlockedKeys::new(kem_private, sig_private),
            })
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))??;

        debug!(account = %session.account_id, "session keys unlocked");
        Ok(session)
    }

    /// Changes an account's password, atomically re-wrapping both private
    /// keys with respect to concurrent logins.
    pub async fn change_password(
        &self,
        account_id: AccountId,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        if new_password.len() < self.config.min_password_len {
            return Err(ServiceError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_len
            )));
        }

        let directory = Arc::clone(&self.directory);
        let old_password = old_password.to_string();
        let new_password = new_password.to_string();

        tokio::task::spawn_blocking(move || {
            directory.change_password(account_id, &old_password, &new_password)
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))??;

        debug!(account = %account_id, "re-wrapped account keys");
        Ok(())
    }

    /// Seals `content` into an envelope owned by the session's account.
    pub async fn upload(
        &self,
        session: &Session,
        filename: &str,
        content: Vec<u8>,
    ) -> ServiceResult<EnvelopeId> {
        if content.len() > self.config.max_content_len {
            return Err(ServiceError::Validation(format!(
                "content exceeds {} byte limit",
                self.config.max_content_len
            )));
        }

        let record = self.directory.get(session.account_id)?;
        let metadata = FileMetadata {
            filename: filename.to_string(),
            size_bytes: content.len() as u64,
            owner: session.account_id.to_string(),
            created_at: Utc::now().timestamp(),
        };

        let id = self.store.begin(session.account_id)?;

        let kem_public = record.kem_public;
        let sig_private = session.keys.sig_private_cloned();
        let sealed = tokio::task::spawn_blocking(move || {
            seal(&content, &kem_public, &sig_private, metadata)
        })
        .await;

        match sealed {
            Ok(Ok(sealed)) => {
                if let Err(e) = self.store.commit(id, sealed.envelope, sealed.ciphertext) {
                    warn!(envelope = %id, "commit failed after seal: {e}");
                    let _ = self.store.abort(id);
                    return Err(e.into());
                }
                debug!(envelope = %id, "sealed envelope committed");
                Ok(id)
            }
            Ok(Err(e)) => {
                let _ = self.store.abort(id);
                warn!(envelope = %id, "seal failed, envelope marked failed");
                Err(e.into())
            }
            // Worker died or was cancelled: nothing was persisted.
            Err(join_err) => {
                let _ = self.store.abort(id);
                Err(ServiceError::Worker(join_err.to_string()))
            }
        }
    }

    /// Fetches, verifies, and decrypts an envelope owned by the session's
    /// account.
    pub async fn download(
        &self,
        session: &Session,
        envelope_id: EnvelopeId,
    ) -> ServiceResult<Vec<u8>> {
        let Some((envelope, blob)) = self.store.get(envelope_id, session.account_id)? else {
            return Err(ServiceError::NotFound);
        };

        let record = self.directory.get(session.account_id)?;
        let kem_private = session.keys.kem_private_cloned();
        let sig_public = record.sig_public;

        let plaintext = tokio::task::spawn_blocking(move || {
            open(&envelope, &blob, &kem_private, &sig_public)
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))??;

        Ok(plaintext)
    }
}
