//! Envelope persistence with a two-phase seal lifecycle.
//!
//! An upload begins as a pending row, then either commits (envelope and
//! ciphertext blob attached in one write-lock mutation, status flips to
//! sealed) or aborts (status flips to failed, nothing persisted). `get` is
//! ownership-scoped and only ever returns sealed rows, so a reader cannot
//! observe a partial write.

use crate::accounts::AccountId;
use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;
use veildrive_crypto::{EnvelopeStatus, FileEnvelope, FileMetadata};

/// Opaque envelope identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvelopeId(Uuid);

impl EnvelopeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EnvelopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Narrow persistence contract consumed by the upload/download flows.
pub trait EnvelopeStore: Send + Sync {
    /// Creates a pending row for an upload that has just started.
    fn begin(&self, owner: AccountId) -> StoreResult<EnvelopeId>;

    /// Atomically attaches a sealed envelope and its ciphertext blob to a
    /// pending row and flips it to sealed.
    fn commit(&self, id: EnvelopeId, envelope: FileEnvelope, blob: Vec<u8>) -> StoreResult<()>;

    /// Marks a pending row failed. No ciphertext is persisted.
    fn abort(&self, id: EnvelopeId) -> StoreResult<()>;

    /// Ownership-scoped lookup. Returns `None` for unknown ids, rows owned
    /// by someone else, and rows that never sealed.
    fn get(
        &self,
        id: EnvelopeId,
        caller: AccountId,
    ) -> StoreResult<Option<(FileEnvelope, Vec<u8>)>>;

    /// One-shot insert of an already sealed envelope.
    fn put(
        &self,
        owner: AccountId,
        envelope: FileEnvelope,
        blob: Vec<u8>,
    ) -> StoreResult<EnvelopeId> {
        let id = self.begin(owner)?;
        self.commit(id, envelope, blob)?;
        Ok(id)
    }
}

struct EnvelopeRow {
    owner: AccountId,
    status: EnvelopeStatus,
    envelope: Option<FileEnvelope>,
    blob: Option<Vec<u8>>,
    created_at: DateTime<Utc>,
}

/// In-memory [`EnvelopeStore`].
pub struct MemoryEnvelopeStore {
    rows: RwLock<HashMap<EnvelopeId, EnvelopeRow>>,
}

impl MemoryEnvelopeStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Current lifecycle status of a row, if it exists.
    pub fn status_of(&self, id: EnvelopeId) -> Option<EnvelopeStatus> {
        self.rows.read().ok()?.get(&id).map(|row| row.status)
    }

    /// Metadata of every sealed envelope owned by `owner`, newest first.
    pub fn list(&self, owner: AccountId) -> StoreResult<Vec<(EnvelopeId, FileMetadata)>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let mut entries: Vec<(EnvelopeId, DateTime<Utc>, FileMetadata)> = rows
            .iter()
            .filter(|(_, row)| row.owner == owner && row.status == EnvelopeStatus::Sealed)
            .filter_map(|(id, row)| {
                row.envelope
                    .as_ref()
                    .map(|e| (*id, row.created_at, e.metadata.clone()))
            })
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(entries.into_iter().map(|(id, _, m)| (id, m)).collect())
    }
}

impl Default for MemoryEnvelopeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeStore for MemoryEnvelopeStore {
    fn begin(&self, owner: AccountId) -> StoreResult<EnvelopeId> {
        let id = EnvelopeId::new();
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.insert(
            id,
            EnvelopeRow {
                owner,
                status: EnvelopeStatus::Pending,
                envelope: None,
                blob: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn commit(&self, id: EnvelopeId, envelope: FileEnvelope, blob: Vec<u8>) -> StoreResult<()> {
        if envelope.status != EnvelopeStatus::Sealed {
            return Err(StoreError::Crypto(veildrive_crypto::CryptoError::Validation(
                "only sealed envelopes can be committed".to_string(),
            )));
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let row = rows.get_mut(&id).ok_or(StoreError::EnvelopeNotFound)?;
        if row.status != EnvelopeStatus::Pending {
            return Err(StoreError::NotPending);
        }

        row.envelope = Some(envelope);
        row.blob = Some(blob);
        row.status = EnvelopeStatus::Sealed;
        Ok(())
    }

    fn abort(&self, id: EnvelopeId) -> StoreResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let row = rows.get_mut(&id).ok_or(StoreError::EnvelopeNotFound)?;
        if row.status != EnvelopeStatus::Pending {
            return Err(StoreError::NotPending);
        }

        row.status = EnvelopeStatus::Failed;
        row.envelope = None;
        row.blob = None;
        Ok(())
    }

    fn get(
        &self,
        id: EnvelopeId,
        caller: AccountId,
    ) -> StoreResult<Option<(FileEnvelope, Vec<u8>)>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let Some(row) = rows.get(&id) else {
            return Ok(None);
        };
        if row.owner != caller || row.status != EnvelopeStatus::Sealed {
            return Ok(None);
        }
        match (&row.envelope, &row.blob) {
            (Some(envelope), Some(blob)) => Ok(Some((envelope.clone(), blob.clone()))),
            // A sealed row always carries both; anything else is corruption.
            _ => Err(StoreError::Storage("sealed row missing envelope".to_string())),
        }
    }
}
