//! Key custody and file envelope encryption for VeilDrive.
//!
//! Provides the cryptographic core of the drive:
//! - PBKDF2-HMAC-SHA256 for deriving wrapping keys from passwords
//! - ChaCha20-Poly1305 for authenticated encryption
//! - ML-KEM-512 key encapsulation and Dilithium2 signatures
//!
//! # Architecture
//!
//! Two custody layers protect every stored file:
//!
//! 1. **Account keys**: each account holds one long-term encapsulation
//!    keypair and one signature keypair. Private halves are only ever
//!    persisted wrapped under a password-derived key (fresh salt per
//!    wrapped secret) and are unwrapped transiently at login.
//!
//! 2. **Content keys**: every upload gets its own random 256-bit key. The
//!    key is encapsulated to the owner's public key — the KEM shared secret
//!    feeds HKDF and the content key is AEAD-wrapped under the result —
//!    then the ciphertext digest and file metadata are signed.
//!
//! This split means a password change re-wraps two small secrets instead of
//! re-encrypting every file, and no stored envelope can be decrypted by
//! anyone holding only public material.
//!
//! All functions here are pure: no I/O, no shared mutable state, safe to
//! call from arbitrarily many threads at once.

pub mod cipher;
pub mod envelope;
mod error;
pub mod kem;
mod key;
pub mod sign;
pub mod vault;
pub mod wire;

pub use cipher::{
    decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use envelope::{
    open, seal, EncapsulatedKey, EnvelopeStatus, FileEnvelope, FileMetadata, SealedFile,
    CONTENT_HASH_LEN, SCHEMA_AAD, WRAPPED_FILE_KEY_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, derive_key_material, generate_random_key, DerivedKey, Salt, KEY_SIZE,
    PBKDF2_ITERATIONS, SALT_SIZE,
};
pub use vault::{generate_keypairs, unwrap, wrap, AccountKeypairs, WrappedKey};
