//! Fixed-offset binary codec for envelopes.
//!
//! Layout (lengths in bytes):
//! magic+version 4 | nonce 12 | tag 16 | kem ciphertext 768 | wrap nonce 12 |
//! wrapped file key 48 | content digest 64 (hex) | content signature 2420 |
//! metadata signature 2420 | status 1 | metadata length u32 LE | metadata
//! JSON | ciphertext (remainder).
//!
//! Every length is validated before anything cryptographic consumes the
//! decoded fields.

use crate::cipher::{NONCE_SIZE, TAG_SIZE};
use crate::envelope::{
    EncapsulatedKey, EnvelopeStatus, FileEnvelope, FileMetadata, CONTENT_HASH_LEN,
    WRAPPED_FILE_KEY_SIZE,
};
use crate::error::{CryptoError, CryptoResult};
use crate::kem::KEM_CIPHERTEXT_SIZE;
use crate::sign::SIGNATURE_SIZE;

/// Magic bytes plus format version.
pub const WIRE_MAGIC: [u8; 4] = *b"VDE\x01";

/// Fixed-size prefix before the metadata length word.
const FIXED_HEADER_LEN: usize = WIRE_MAGIC.len()
    + NONCE_SIZE
    + TAG_SIZE
    + KEM_CIPHERTEXT_SIZE
    + NONCE_SIZE
    + WRAPPED_FILE_KEY_SIZE
    + CONTENT_HASH_LEN
    + SIGNATURE_SIZE
    + SIGNATURE_SIZE
    + 1;

fn status_to_byte(status: EnvelopeStatus) -> u8 {
    match status {
        EnvelopeStatus::Pending => 0,
        EnvelopeStatus::Sealed => 1,
        EnvelopeStatus::Failed => 2,
    }
}

fn status_from_byte(byte: u8) -> CryptoResult<EnvelopeStatus> {
    match byte {
        0 => Ok(EnvelopeStatus::Pending),
        1 => Ok(EnvelopeStatus::Sealed),
        2 => Ok(EnvelopeStatus::Failed),
        other => Err(CryptoError::Validation(format!(
            "unknown envelope status byte {other}"
        ))),
    }
}

fn check_len(name: &str, actual: usize, expected: usize) -> CryptoResult<()> {
    if actual != expected {
        return Err(CryptoError::Validation(format!(
            "{name} must be {expected} bytes, got {actual}"
        )));
    }
    Ok(())
}

/// Encodes an envelope and its ciphertext blob into the wire layout.
pub fn encode(envelope: &FileEnvelope, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    check_len(
        "kem ciphertext",
        envelope.encapsulated_key.kem_ciphertext.len(),
        KEM_CIPHERTEXT_SIZE,
    )?;
    check_len(
        "wrapped file key",
        envelope.encapsulated_key.wrapped_file_key.len(),
        WRAPPED_FILE_KEY_SIZE,
    )?;
    check_len("content digest", envelope.content_hash.len(), CONTENT_HASH_LEN)?;
    check_len(
        "content signature",
        envelope.content_signature.len(),
        SIGNATURE_SIZE,
    )?;
    check_len(
        "metadata signature",
        envelope.metadata_signature.len(),
        SIGNATURE_SIZE,
    )?;

    let metadata_json = serde_json::to_vec(&envelope.metadata)
        .map_err(|e| CryptoError::Validation(format!("metadata serialization: {e}")))?;
    let metadata_len = u32::try_from(metadata_json.len())
        .map_err(|_| CryptoError::Validation("metadata too large".to_string()))?;

    let mut out =
        Vec::with_capacity(FIXED_HEADER_LEN + 4 + metadata_json.len() + ciphertext.len());
    out.extend_from_slice(&WIRE_MAGIC);
    out.extend_from_slice(&envelope.nonce);
    out.extend_from_slice(&envelope.tag);
    out.extend_from_slice(&envelope.encapsulated_key.kem_ciphertext);
    out.extend_from_slice(&envelope.encapsulated_key.wrap_nonce);
    out.extend_from_slice(&envelope.encapsulated_key.wrapped_file_key);
    out.extend_from_slice(envelope.content_hash.as_bytes());
    out.extend_from_slice(&envelope.content_signature);
    out.extend_from_slice(&envelope.metadata_signature);
    out.push(status_to_byte(envelope.status));
    out.extend_from_slice(&metadata_len.to_le_bytes());
    out.extend_from_slice(&metadata_json);
    out.extend_from_slice(ciphertext);
    Ok(out)
}

fn take<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> &'a [u8] {
    let slice = &bytes[*cursor..*cursor + len];
    *cursor += len;
    slice
}

/// Decodes the wire layout back into an envelope and ciphertext blob.
pub fn decode(bytes: &[u8]) -> CryptoResult<(FileEnvelope, Vec<u8>)> {
    if bytes.len() < FIXED_HEADER_LEN + 4 {
        return Err(CryptoError::Validation(
            "envelope truncated below fixed header".to_string(),
        ));
    }
    if bytes[..4] != WIRE_MAGIC {
        return Err(CryptoError::Validation(
            "unrecognized envelope magic".to_string(),
        ));
    }

    let mut cursor = 4;
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(take(bytes, &mut cursor, NONCE_SIZE));
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(take(bytes, &mut cursor, TAG_SIZE));
    let kem_ciphertext = take(bytes, &mut cursor, KEM_CIPHERTEXT_SIZE).to_vec();
    let mut wrap_nonce = [0u8; NONCE_SIZE];
    wrap_nonce.copy_from_slice(take(bytes, &mut cursor, NONCE_SIZE));
    let wrapped_file_key = take(bytes, &mut cursor, WRAPPED_FILE_KEY_SIZE).to_vec();
    let content_hash = String::from_utf8(take(bytes, &mut cursor, CONTENT_HASH_LEN).to_vec())
        .map_err(|_| CryptoError::Validation("content digest is not UTF-8".to_string()))?;
    let content_signature = take(bytes, &mut cursor, SIGNATURE_SIZE).to_vec();
    let metadata_signature = take(bytes, &mut cursor, SIGNATURE_SIZE).to_vec();
    let status = status_from_byte(take(bytes, &mut cursor, 1)[0])?;

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(take(bytes, &mut cursor, 4));
    let metadata_len = u32::from_le_bytes(len_bytes) as usize;

    if bytes.len() < cursor + metadata_len {
        return Err(CryptoError::Validation(
            "envelope truncated inside metadata".to_string(),
        ));
    }
    let metadata: FileMetadata = serde_json::from_slice(&bytes[cursor..cursor + metadata_len])
        .map_err(|e| CryptoError::Validation(format!("metadata deserialization: {e}")))?;
    let ciphertext = bytes[cursor + metadata_len..].to_vec();

    Ok((
        FileEnvelope {
            metadata,
            nonce,
            tag,
            encapsulated_key: EncapsulatedKey {
                kem_ciphertext,
                wrap_nonce,
                wrapped_file_key,
            },
            content_hash,
            content_signature,
            metadata_signature,
            status,
        },
        ciphertext,
    ))
}
