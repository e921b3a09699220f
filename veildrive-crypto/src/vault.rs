//! Account key custody: long-term keypair generation and password wrapping.
//!
//! An account owns one ML-KEM-512 encapsulation keypair and one Dilithium2
//! signature keypair, generated independently. Private keys only ever leave
//! this module wrapped: PBKDF2-derived key, fresh per-secret salt, fresh
//! nonce, ChaCha20-Poly1305. The vault holds no state and never touches
//! durable storage.

use crate::cipher::{decrypt, encrypt, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_key, Salt};
use crate::{kem, sign};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Freshly generated long-term keypairs for one account.
///
/// Private halves are zeroized on drop; they must be wrapped before they
/// are handed to anything that persists.
pub struct AccountKeypairs {
    pub kem_public: Vec<u8>,
    pub kem_private: Zeroizing<Vec<u8>>,
    pub sig_public: Vec<u8>,
    pub sig_private: Zeroizing<Vec<u8>>,
}

/// A private key encrypted under a password-derived key.
///
/// Bundles the PBKDF2 salt with the encrypted bytes so the password is the
/// only input needed to unwrap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    pub salt: Salt,
    pub encrypted: EncryptedData,
}

/// Generates one encapsulation keypair and one signature keypair, with
/// independent randomness.
pub fn generate_keypairs() -> AccountKeypairs {
    let (kem_public, kem_private) = kem::generate_keypair();
    let (sig_public, sig_private) = sign::generate_keypair();
    AccountKeypairs {
        kem_public,
        kem_private: Zeroizing::new(kem_private),
        sig_public,
        sig_private: Zeroizing::new(sig_private),
    }
}

/// Wraps private key bytes under a password-derived key with a fresh salt
/// and fresh nonce.
pub fn wrap(private_key: &[u8], password: &str) -> CryptoResult<WrappedKey> {
    if private_key.is_empty() {
        return Err(CryptoError::Validation(
            "cannot wrap empty key material".to_string(),
        ));
    }

    let salt = Salt::random();
    let wrapping_key = derive_key(password, &salt)?;
    let encrypted = encrypt(&wrapping_key, private_key)?;

    Ok(WrappedKey { salt, encrypted })
}

/// Unwraps a private key with the supplied password.
///
/// Fails closed: a wrong password and a corrupted wrapped key both surface
/// as [`CryptoError::AuthenticationFailure`], with no distinction.
pub fn unwrap(wrapped: &WrappedKey, password: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let wrapping_key = derive_key(password, &wrapped.salt)?;
    let plaintext = decrypt(&wrapping_key, &wrapped.encrypted)
        .map_err(|_| CryptoError::AuthenticationFailure)?;
    Ok(Zeroizing::new(plaintext))
}
