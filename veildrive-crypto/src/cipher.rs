//! ChaCha20-Poly1305 authenticated encryption.
//!
//! Every encryption uses a fresh random 12-byte nonce. Decryption fails
//! closed: any tag mismatch yields an error and no plaintext.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// AEAD nonce length in bytes (96-bit).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Nonce plus ciphertext with the Poly1305 tag appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext followed by the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Encrypts `plaintext` with associated data bound into the tag.
pub fn encrypt_with_aad(
    key: &DerivedKey,
    plaintext: &[u8],
    aad: &[u8],
) -> CryptoResult<EncryptedData> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::CryptoFailure)?;

    Ok(EncryptedData { nonce, ciphertext })
}

/// Decrypts, verifying the tag. Fails closed on any mismatch.
pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    decrypt_with_aad(key, data, &[])
}

/// Decrypts with associated data. The same AAD supplied at encryption time
/// must be presented or the tag check fails.
pub fn decrypt_with_aad(
    key: &DerivedKey,
    data: &EncryptedData,
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(
            Nonce::from_slice(&data.nonce),
            Payload {
                msg: data.ciphertext.as_ref(),
                aad,
            },
        )
        .map_err(|_| CryptoError::CryptoFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::generate_random_key;

    #[test]
    fn roundtrip() {
        let key = generate_random_key();
        let encrypted = encrypt(&key, b"some entity bytes").unwrap();
        assert_eq!(decrypt(&key, &encrypted).unwrap(), b"some entity bytes");
    }

    #[test]
    fn aad_mismatch_fails() {
        let key = generate_random_key();
        let encrypted = encrypt_with_aad(&key, b"payload", b"schema-v1").unwrap();
        assert!(decrypt_with_aad(&key, &encrypted, b"schema-v2").is_err());
        assert_eq!(
            decrypt_with_aad(&key, &encrypted, b"schema-v1").unwrap(),
            b"payload"
        );
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let key = generate_random_key();
        let a = encrypt(&key, b"same plaintext").unwrap();
        let b = encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn ciphertext_carries_tag_overhead() {
        let key = generate_random_key();
        let encrypted = encrypt(&key, b"1234").unwrap();
        assert_eq!(encrypted.ciphertext.len(), 4 + TAG_SIZE);
    }
}
