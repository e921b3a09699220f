//! ML-KEM-512 key encapsulation.
//!
//! Encapsulation against an owner's public key yields a ciphertext plus a
//! 32-byte shared secret that only the holder of the matching private key
//! can recover. Keys cross module boundaries as encoded bytes; length checks
//! run before any lattice arithmetic.

use crate::error::{CryptoError, CryptoResult};
use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{Ciphertext, EncodedSizeUser, KemCore, MlKem512};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Encoded ML-KEM-512 encapsulation (public) key length.
pub const KEM_PUBLIC_KEY_SIZE: usize = 800;

/// Encoded ML-KEM-512 decapsulation (private) key length.
pub const KEM_PRIVATE_KEY_SIZE: usize = 1632;

/// ML-KEM-512 encapsulation ciphertext length.
pub const KEM_CIPHERTEXT_SIZE: usize = 768;

/// Shared secret length.
pub const KEM_SHARED_SECRET_SIZE: usize = 32;

/// Shared secret recovered from encapsulation/decapsulation. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; KEM_SHARED_SECRET_SIZE]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; KEM_SHARED_SECRET_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedSecret").field(&"<redacted>").finish()
    }
}

/// Generates a fresh ML-KEM-512 keypair as `(public, private)` encoded bytes.
pub fn generate_keypair() -> (Vec<u8>, Vec<u8>) {
    let mut rng = OsRng;
    let (dk, ek) = MlKem512::generate(&mut rng);
    (ek.as_bytes().to_vec(), dk.as_bytes().to_vec())
}

/// Encapsulates against `public_key`, returning the KEM ciphertext and the
/// shared secret.
pub fn encapsulate(public_key: &[u8]) -> CryptoResult<(Vec<u8>, SharedSecret)> {
    if public_key.len() != KEM_PUBLIC_KEY_SIZE {
        return Err(CryptoError::Validation(format!(
            "encapsulation key must be {KEM_PUBLIC_KEY_SIZE} bytes, got {}",
            public_key.len()
        )));
    }

    let ek = <MlKem512 as KemCore>::EncapsulationKey::from_bytes(
        &public_key
            .try_into()
            .map_err(|_| CryptoError::Validation("malformed encapsulation key".to_string()))?,
    );

    let mut rng = OsRng;
    let (kem_ct, shared) = ek
        .encapsulate(&mut rng)
        .map_err(|_| CryptoError::CryptoFailure)?;

    let mut secret = [0u8; KEM_SHARED_SECRET_SIZE];
    secret.copy_from_slice(shared.as_slice());

    Ok((kem_ct.as_slice().to_vec(), SharedSecret(secret)))
}

/// Decapsulates `kem_ciphertext` with `private_key` to recover the shared
/// secret.
pub fn decapsulate(private_key: &[u8], kem_ciphertext: &[u8]) -> CryptoResult<SharedSecret> {
    if private_key.len() != KEM_PRIVATE_KEY_SIZE {
        return Err(CryptoError::Validation(format!(
            "decapsulation key must be {KEM_PRIVATE_KEY_SIZE} bytes, got {}",
            private_key.len()
        )));
    }
    if kem_ciphertext.len() != KEM_CIPHERTEXT_SIZE {
        return Err(CryptoError::Validation(format!(
            "KEM ciphertext must be {KEM_CIPHERTEXT_SIZE} bytes, got {}",
            kem_ciphertext.len()
        )));
    }

    let dk = <MlKem512 as KemCore>::DecapsulationKey::from_bytes(
        &private_key
            .try_into()
            .map_err(|_| CryptoError::Validation("malformed decapsulation key".to_string()))?,
    );

    let ct: Ciphertext<MlKem512> = kem_ciphertext
        .try_into()
        .map_err(|_| CryptoError::Validation("malformed KEM ciphertext".to_string()))?;

    let shared = dk
        .decapsulate(&ct)
        .map_err(|_| CryptoError::CryptoFailure)?;

    let mut secret = [0u8; KEM_SHARED_SECRET_SIZE];
    secret.copy_from_slice(shared.as_slice());
    Ok(SharedSecret(secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_has_expected_sizes() {
        let (public, private) = generate_keypair();
        assert_eq!(public.len(), KEM_PUBLIC_KEY_SIZE);
        assert_eq!(private.len(), KEM_PRIVATE_KEY_SIZE);
    }

    #[test]
    fn encapsulate_decapsulate_agree() {
        let (public, private) = generate_keypair();
        let (ct, sender_secret) = encapsulate(&public).unwrap();
        assert_eq!(ct.len(), KEM_CIPHERTEXT_SIZE);

        let receiver_secret = decapsulate(&private, &ct).unwrap();
        assert_eq!(sender_secret.as_bytes(), receiver_secret.as_bytes());
    }

    #[test]
    fn wrong_private_key_yields_different_secret() {
        let (public, _) = generate_keypair();
        let (_, other_private) = generate_keypair();

        let (ct, sender_secret) = encapsulate(&public).unwrap();
        // ML-KEM implicit rejection: decapsulation succeeds but yields an
        // unrelated secret, so downstream AEAD unwrapping fails.
        let other_secret = decapsulate(&other_private, &ct).unwrap();
        assert_ne!(sender_secret.as_bytes(), other_secret.as_bytes());
    }

    #[test]
    fn truncated_public_key_rejected() {
        let (public, _) = generate_keypair();
        let err = encapsulate(&public[..KEM_PUBLIC_KEY_SIZE - 1]).unwrap_err();
        assert!(matches!(err, CryptoError::Validation(_)));
    }
}
