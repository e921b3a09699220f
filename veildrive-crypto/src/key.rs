//! Password-based key derivation and symmetric key material.
//!
//! Wrapping keys are derived with PBKDF2-HMAC-SHA256 at a fixed iteration
//! count, so every derivation attempt pays the same CPU cost. Salts are
//! 16 random bytes, generated once per wrapped secret and never reused.

use crate::error::{CryptoError, CryptoResult};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count for password-derived keys.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Per-secret random salt, stored alongside the wrapped secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derives variable-length key material from a password and salt.
///
/// Deterministic for a fixed `(password, salt)` pair. A wrong password never
/// fails here — wrongness surfaces downstream when the derived key fails to
/// authenticate-decrypt.
pub fn derive_key_material(password: &str, salt: &Salt, len: usize) -> CryptoResult<Vec<u8>> {
    if len == 0 {
        return Err(CryptoError::Validation(
            "requested zero-length key material".to_string(),
        ));
    }
    let mut out = vec![0u8; len];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut out,
    );
    Ok(out)
}

/// Derives a 256-bit wrapping key from a password and salt.
pub fn derive_key(password: &str, salt: &Salt) -> CryptoResult<DerivedKey> {
    let material = derive_key_material(password, salt, KEY_SIZE)?;
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&material);
    Ok(DerivedKey::from_bytes(bytes))
}

/// Generates a fresh random 256-bit key, independent per call.
pub fn generate_random_key() -> DerivedKey {
    let mut bytes = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut bytes);
    DerivedKey::from_bytes(bytes)
}
