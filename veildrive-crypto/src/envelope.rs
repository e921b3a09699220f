//! File envelope sealing and opening.
//!
//! Every file is encrypted under its own fresh 256-bit content key. The
//! content key is then encapsulated to the owner's ML-KEM-512 public key:
//! the KEM shared secret feeds HKDF-SHA256 to produce a wrapping key, and
//! the content key is AEAD-wrapped under it. The ciphertext digest and the
//! file metadata are both signed with the owner's Dilithium2 key, so an
//! envelope can be rejected before any decryption work runs.
//!
//! Opening verifies in cost order: metadata signature, content digest,
//! content signature, then decapsulation and decryption. No partial
//! plaintext is ever returned.

use crate::cipher::{decrypt_with_aad, encrypt_with_aad, EncryptedData, NONCE_SIZE, TAG_SIZE};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{generate_random_key, DerivedKey, KEY_SIZE};
use crate::{kem, sign};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Associated data binding every content encryption to this schema revision.
pub const SCHEMA_AAD: &[u8] = b"veildrive/envelope/v1";

/// HKDF info label separating the file-key wrapping key from any other use
/// of the KEM shared secret.
const FILE_KEY_WRAP_INFO: &[u8] = b"veildrive/file-key-wrap";

/// Wrapped content key length: 32-byte key plus the Poly1305 tag.
pub const WRAPPED_FILE_KEY_SIZE: usize = KEY_SIZE + TAG_SIZE;

/// Hex-encoded SHA-256 digest length.
pub const CONTENT_HASH_LEN: usize = 64;

/// Lifecycle state of an envelope.
///
/// `Pending` rows exist only while an upload is in flight; `Sealed` is
/// terminal and read-only; `Failed` envelopes are never exposed to readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Pending,
    Sealed,
    Failed,
}

/// Metadata signed into every envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub size_bytes: u64,
    pub owner: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

impl FileMetadata {
    /// Canonical byte encoding covered by the metadata signature.
    ///
    /// Fields are length-prefixed so no two metadata values share an
    /// encoding.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let size = self.size_bytes.to_le_bytes();
        let created = self.created_at.to_le_bytes();
        let fields: [&[u8]; 4] = [
            self.filename.as_bytes(),
            &size,
            self.owner.as_bytes(),
            &created,
        ];

        let mut out = Vec::new();
        for field in fields {
            out.extend_from_slice(&(field.len() as u32).to_le_bytes());
            out.extend_from_slice(field);
        }
        out
    }
}

/// Content key encapsulated to the owner's public key.
///
/// The KEM ciphertext recovers a shared secret, never the key itself; the
/// content key is additionally AEAD-wrapped under an HKDF expansion of that
/// secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncapsulatedKey {
    /// ML-KEM-512 ciphertext (768 bytes).
    pub kem_ciphertext: Vec<u8>,
    /// Nonce for the content-key wrap.
    pub wrap_nonce: [u8; NONCE_SIZE],
    /// `AEAD(hkdf(shared), wrap_nonce, schema_aad, content_key)` — 48 bytes.
    pub wrapped_file_key: Vec<u8>,
}

/// Everything needed to later decrypt and verify one stored file. The
/// ciphertext itself travels separately as a blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEnvelope {
    pub metadata: FileMetadata,
    /// AEAD nonce for the content encryption.
    pub nonce: [u8; NONCE_SIZE],
    /// Poly1305 tag for the content encryption.
    pub tag: [u8; TAG_SIZE],
    pub encapsulated_key: EncapsulatedKey,
    /// Hex-encoded SHA-256 of the ciphertext.
    pub content_hash: String,
    /// Dilithium2 signature over `content_hash ‖ canonical metadata`.
    pub content_signature: Vec<u8>,
    /// Dilithium2 signature over canonical metadata alone, so metadata can
    /// be verified when content is streamed separately.
    pub metadata_signature: Vec<u8>,
    pub status: EnvelopeStatus,
}

/// A sealed envelope plus its ciphertext blob.
#[derive(Clone, Debug)]
pub struct SealedFile {
    pub envelope: FileEnvelope,
    pub ciphertext: Vec<u8>,
}

fn wrapping_key_from_shared(shared: &kem::SharedSecret) -> CryptoResult<DerivedKey> {
    let hk = Hkdf::<Sha256>::new(Some(SCHEMA_AAD), shared.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hk.expand(FILE_KEY_WRAP_INFO, &mut okm)
        .map_err(|_| CryptoError::CryptoFailure)?;
    Ok(DerivedKey::from_bytes(okm))
}

fn content_signing_payload(content_hash: &str, metadata: &FileMetadata) -> Vec<u8> {
    let mut payload = content_hash.as_bytes().to_vec();
    payload.extend_from_slice(&metadata.canonical_bytes());
    payload
}

/// Seals `plaintext` into an envelope for the owner.
///
/// The content key is fresh per call — two seals of identical plaintext
/// under identical keys share nothing. Any failure yields an error and no
/// partial envelope.
pub fn seal(
    plaintext: &[u8],
    owner_kem_public: &[u8],
    owner_sig_private: &[u8],
    metadata: FileMetadata,
) -> CryptoResult<SealedFile> {
    // 1. Fresh content key, never reused across files or re-uploads.
    let file_key = generate_random_key();

    // 2. Content encryption; split the tag out for the wire layout.
    let encrypted = encrypt_with_aad(&file_key, plaintext, SCHEMA_AAD)?;
    let split_at = encrypted.ciphertext.len() - TAG_SIZE;
    let (ciphertext, tag_bytes) = encrypted.ciphertext.split_at(split_at);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(tag_bytes);

    // 3. Encapsulate and wrap the content key. The shared secret is a
    //    one-time value only the owner's private key can recover — the
    //    public key itself never becomes a symmetric key.
    let (kem_ciphertext, shared) = kem::encapsulate(owner_kem_public)?;
    let wrap_key = wrapping_key_from_shared(&shared)?;
    let wrapped = encrypt_with_aad(&wrap_key, file_key.as_bytes(), SCHEMA_AAD)?;

    // 4. Digest over the ciphertext.
    let content_hash = hex::encode(Sha256::digest(ciphertext));

    // 5. Content and metadata signatures.
    let content_signature = sign::sign(
        &content_signing_payload(&content_hash, &metadata),
        owner_sig_private,
    )?;
    let metadata_signature = sign::sign(&metadata.canonical_bytes(), owner_sig_private)?;

    Ok(SealedFile {
        envelope: FileEnvelope {
            metadata,
            nonce: encrypted.nonce,
            tag,
            encapsulated_key: EncapsulatedKey {
                kem_ciphertext,
                wrap_nonce: wrapped.nonce,
                wrapped_file_key: wrapped.ciphertext,
            },
            content_hash,
            content_signature,
            metadata_signature,
            status: EnvelopeStatus::Sealed,
        },
        ciphertext: ciphertext.to_vec(),
    })
}

/// Opens an envelope, returning the plaintext only after every check passes.
pub fn open(
    envelope: &FileEnvelope,
    ciphertext: &[u8],
    owner_kem_private: &[u8],
    owner_sig_public: &[u8],
) -> CryptoResult<Vec<u8>> {
    if envelope.status != EnvelopeStatus::Sealed {
        return Err(CryptoError::Validation(
            "envelope is not sealed".to_string(),
        ));
    }

    // 1. Metadata signature — cheapest rejection, before touching content.
    let metadata_ok = sign::verify(
        &envelope.metadata_signature,
        &envelope.metadata.canonical_bytes(),
        owner_sig_public,
    )?;
    if !metadata_ok {
        return Err(CryptoError::IntegrityViolation("metadata signature"));
    }

    // 2. Content digest.
    let recomputed = hex::encode(Sha256::digest(ciphertext));
    if recomputed != envelope.content_hash {
        return Err(CryptoError::IntegrityViolation("content digest"));
    }

    // 3. Content signature over digest ‖ metadata.
    let content_ok = sign::verify(
        &envelope.content_signature,
        &content_signing_payload(&envelope.content_hash, &envelope.metadata),
        owner_sig_public,
    )?;
    if !content_ok {
        return Err(CryptoError::IntegrityViolation("content signature"));
    }

    // 4. Recover the content key and decrypt.
    let shared = kem::decapsulate(
        owner_kem_private,
        &envelope.encapsulated_key.kem_ciphertext,
    )?;
    let wrap_key = wrapping_key_from_shared(&shared)?;
    let file_key_bytes = decrypt_with_aad(
        &wrap_key,
        &EncryptedData {
            nonce: envelope.encapsulated_key.wrap_nonce,
            ciphertext: envelope.encapsulated_key.wrapped_file_key.clone(),
        },
        SCHEMA_AAD,
    )?;
    if file_key_bytes.len() != KEY_SIZE {
        return Err(CryptoError::CryptoFailure);
    }
    let mut key_bytes = [0u8; KEY_SIZE];
    key_bytes.copy_from_slice(&file_key_bytes);
    let file_key = DerivedKey::from_bytes(key_bytes);

    let mut combined = ciphertext.to_vec();
    combined.extend_from_slice(&envelope.tag);
    decrypt_with_aad(
        &file_key,
        &EncryptedData {
            nonce: envelope.nonce,
            ciphertext: combined,
        },
        SCHEMA_AAD,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::generate_keypairs;

    fn metadata() -> FileMetadata {
        FileMetadata {
            filename: "notes.txt".to_string(),
            size_bytes: 11,
            owner: "account-1".to_string(),
            created_at: 1_754_000_000,
        }
    }

    #[test]
    fn canonical_bytes_distinguish_field_boundaries() {
        let a = FileMetadata {
            filename: "ab".to_string(),
            ..metadata()
        };
        let b = FileMetadata {
            filename: "a".to_string(),
            owner: "baccount-1".to_string(),
            ..metadata()
        };
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn open_rejects_non_sealed_envelope() {
        let keys = generate_keypairs();
        let sealed = seal(b"hello", &keys.kem_public, &keys.sig_private, metadata()).unwrap();

        let mut pending = sealed.envelope.clone();
        pending.status = EnvelopeStatus::Pending;

        let err = open(
            &pending,
            &sealed.ciphertext,
            &keys.kem_private,
            &keys.sig_public,
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Validation(_)));
    }
}
