//! Account registry with password-wrapped key custody.
//!
//! A record stores only material that is safe to persist: the credential
//! hash, both public keys, and both private keys wrapped under the
//! account's password. Unwrapped private keys never enter this module's
//! state.

use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;
use veildrive_crypto::{
    derive_key_material, generate_keypairs, vault, Salt, WrappedKey, KEY_SIZE,
};

/// Opaque account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login credential hash, independent of the key-wrapping derivation.
///
/// Uses the same PBKDF2 construction as the wrapping keys but under its own
/// salt, so verifying a login never reproduces a wrapping key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialHash {
    salt: Salt,
    hash: Vec<u8>,
}

impl CredentialHash {
    pub fn new(password: &str) -> StoreResult<Self> {
        let salt = Salt::random();
        let hash = derive_key_material(password, &salt, KEY_SIZE)?;
        Ok(Self { salt, hash })
    }

    pub fn verify(&self, password: &str) -> StoreResult<bool> {
        let candidate = derive_key_material(password, &self.salt, KEY_SIZE)?;
        Ok(candidate == self.hash)
    }
}

/// Persisted account state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: AccountId,
    pub username: String,
    pub credential: CredentialHash,
    /// ML-KEM-512 encapsulation public key, stored in plaintext.
    pub kem_public: Vec<u8>,
    pub kem_private_wrapped: WrappedKey,
    /// Dilithium2 signature public key, stored in plaintext.
    pub sig_public: Vec<u8>,
    pub sig_private_wrapped: WrappedKey,
    pub created_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Hex encoding of the encapsulation public key, as returned to the
    /// client at registration.
    pub fn kem_public_hex(&self) -> String {
        hex::encode(&self.kem_public)
    }
}

#[derive(Default)]
struct DirectoryInner {
    accounts: HashMap<AccountId, AccountRecord>,
    usernames: HashMap<String, AccountId>,
}

/// In-memory account registry.
pub struct AccountDirectory {
    inner: RwLock<DirectoryInner>,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DirectoryInner::default()),
        }
    }

    /// Registers a new account: generates both keypairs, wraps the private
    /// halves under `password`, and persists the record.
    ///
    /// The duplicate check runs before any key generation so a taken
    /// username costs nothing.
    pub fn register(&self, username: &str, password: &str) -> StoreResult<AccountRecord> {
        if self.find_by_username(username)?.is_some() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let keys = generate_keypairs();
        let kem_private_wrapped = vault::wrap(&keys.kem_private, password)?;
        let sig_private_wrapped = vault::wrap(&keys.sig_private, password)?;

        let record = AccountRecord {
            account_id: AccountId::new(),
            username: username.to_string(),
            credential: CredentialHash::new(password)?,
            kem_public: keys.kem_public,
            kem_private_wrapped,
            sig_public: keys.sig_public,
            sig_private_wrapped,
            created_at: Utc::now(),
        };

        let mut inner = self.write()?;
        // Re-check under the write lock; a racing registration may have
        // claimed the name while keys were being generated.
        if inner.usernames.contains_key(username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        inner
            .usernames
            .insert(username.to_string(), record.account_id);
        inner.accounts.insert(record.account_id, record.clone());
        Ok(record)
    }

    /// Fetches a record by id.
    pub fn get(&self, account_id: AccountId) -> StoreResult<AccountRecord> {
        self.read()?
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or(StoreError::AccountNotFound)
    }

    pub fn find_by_username(&self, username: &str) -> StoreResult<Option<AccountId>> {
        Ok(self.read()?.usernames.get(username).copied())
    }

    /// Verifies a login against the credential hash and returns the record.
    ///
    /// Unknown username and wrong password both surface as
    /// [`StoreError::InvalidCredentials`].
    pub fn verify_credential(&self, username: &str, password: &str) -> StoreResult<AccountRecord> {
        let record = match self.find_by_username(username)? {
            Some(id) => self.get(id)?,
            None => return Err(StoreError::InvalidCredentials),
        };
        if !record.credential.verify(password)? {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(record)
    }

    /// Changes an account's password, re-wrapping both private keys with
    /// fresh salts.
    ///
    /// Runs entirely under the write lock: a concurrent login either
    /// completes against the old record before this starts, or observes
    /// the fully re-wrapped record. No intermediate state is visible.
    pub fn change_password(
        &self,
        account_id: AccountId,
        old_password: &str,
        new_password: &str,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let record = inner
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::AccountNotFound)?;

        if !record.credential.verify(old_password)? {
            return Err(StoreError::InvalidCredentials);
        }

        let kem_private = vault::unwrap(&record.kem_private_wrapped, old_password)?;
        let sig_private = vault::unwrap(&record.sig_private_wrapped, old_password)?;

        let kem_private_wrapped = vault::wrap(&kem_private, new_password)?;
        let sig_private_wrapped = vault::wrap(&sig_private, new_password)?;
        let credential = CredentialHash::new(new_password)?;

        record.kem_private_wrapped = kem_private_wrapped;
        record.sig_private_wrapped = sig_private_wrapped;
        record.credential = credential;
        Ok(())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, DirectoryInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, DirectoryInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

impl Default for AccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}
