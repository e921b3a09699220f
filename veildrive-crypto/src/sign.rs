//! Dilithium2 detached signatures.
//!
//! Signatures are genuine and always verified — there is no placeholder
//! path. Keys cross module boundaries as raw bytes; length checks run
//! before signing or verification.

use crate::error::{CryptoError, CryptoResult};
use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};

/// Dilithium2 public key length.
pub const SIG_PUBLIC_KEY_SIZE: usize = 1312;

/// Dilithium2 secret key length.
pub const SIG_PRIVATE_KEY_SIZE: usize = 2528;

/// Dilithium2 detached signature length.
pub const SIGNATURE_SIZE: usize = 2420;

/// Generates a fresh Dilithium2 keypair as `(public, private)` raw bytes.
pub fn generate_keypair() -> (Vec<u8>, Vec<u8>) {
    let (pk, sk) = dilithium2::keypair();
    (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
}

/// Signs `message` with the raw private key, returning a detached signature.
pub fn sign(message: &[u8], private_key: &[u8]) -> CryptoResult<Vec<u8>> {
    let sk = dilithium2::SecretKey::from_bytes(private_key)
        .map_err(|_| CryptoError::Validation("malformed signing key".to_string()))?;
    let sig = dilithium2::detached_sign(message, &sk);
    Ok(sig.as_bytes().to_vec())
}

/// Verifies a detached signature. Returns `Ok(false)` on mismatch so call
/// sites can attach their own integrity label; malformed key or signature
/// bytes are a validation error.
pub fn verify(signature: &[u8], message: &[u8], public_key: &[u8]) -> CryptoResult<bool> {
    let pk = dilithium2::PublicKey::from_bytes(public_key)
        .map_err(|_| CryptoError::Validation("malformed verification key".to_string()))?;
    let sig = dilithium2::DetachedSignature::from_bytes(signature)
        .map_err(|_| CryptoError::Validation("malformed signature".to_string()))?;

    Ok(dilithium2::verify_detached_signature(&sig, message, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_has_expected_sizes() {
        let (public, private) = generate_keypair();
        assert_eq!(public.len(), SIG_PUBLIC_KEY_SIZE);
        assert_eq!(private.len(), SIG_PRIVATE_KEY_SIZE);
    }

    #[test]
    fn sign_then_verify() {
        let (public, private) = generate_keypair();
        let sig = sign(b"digest and metadata", &private).unwrap();
        assert_eq!(sig.len(), SIGNATURE_SIZE);
        assert!(verify(&sig, b"digest and metadata", &public).unwrap());
    }

    #[test]
    fn altered_message_fails_verification() {
        let (public, private) = generate_keypair();
        let sig = sign(b"original", &private).unwrap();
        assert!(!verify(&sig, b"altered", &public).unwrap());
    }

    #[test]
    fn foreign_key_fails_verification() {
        let (_, private) = generate_keypair();
        let (other_public, _) = generate_keypair();
        let sig = sign(b"message", &private).unwrap();
        assert!(!verify(&sig, b"message", &other_public).unwrap());
    }
}
