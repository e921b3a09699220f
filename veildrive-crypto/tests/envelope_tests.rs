use veildrive_crypto::envelope::{open, seal, FileMetadata};
use veildrive_crypto::vault::generate_keypairs;
use veildrive_crypto::{wire, CryptoError};

fn metadata(size: u64) -> FileMetadata {
    FileMetadata {
        filename: "report.pdf".to_string(),
        size_bytes: size,
        owner: "acct-7c1a".to_string(),
        created_at: 1_754_000_000,
    }
}

#[test]
fn seal_open_roundtrip() {
    let keys = generate_keypairs();
    let content = b"hello world";

    let sealed = seal(content, &keys.kem_public, &keys.sig_private, metadata(11)).unwrap();
    let recovered = open(
        &sealed.envelope,
        &sealed.ciphertext,
        &keys.kem_private,
        &keys.sig_public,
    )
    .unwrap();

    assert_eq!(recovered, content);
}

#[test]
fn seal_open_empty_content() {
    let keys = generate_keypairs();

    let sealed = seal(b"", &keys.kem_public, &keys.sig_private, metadata(0)).unwrap();
    let recovered = open(
        &sealed.envelope,
        &sealed.ciphertext,
        &keys.kem_private,
        &keys.sig_public,
    )
    .unwrap();

    assert_eq!(recovered, b"");
    assert!(sealed.ciphertext.is_empty());
}

#[test]
fn seal_open_large_content() {
    let keys = generate_keypairs();
    let content = vec![0x5Au8; 1 << 20];

    let sealed = seal(&content, &keys.kem_public, &keys.sig_private, metadata(1 << 20)).unwrap();
    let recovered = open(
        &sealed.envelope,
        &sealed.ciphertext,
        &keys.kem_private,
        &keys.sig_public,
    )
    .unwrap();

    assert_eq!(recovered, content);
}

// ── Probabilistic Encryption ──

#[test]
fn identical_plaintext_seals_share_nothing() {
    let keys = generate_keypairs();
    let content = b"same bytes every upload";

    let a = seal(content, &keys.kem_public, &keys.sig_private, metadata(23)).unwrap();
    let b = seal(content, &keys.kem_public, &keys.sig_private, metadata(23)).unwrap();

    assert_ne!(a.envelope.nonce, b.envelope.nonce);
    assert_ne!(
        a.envelope.encapsulated_key.kem_ciphertext,
        b.envelope.encapsulated_key.kem_ciphertext
    );
    assert_ne!(
        a.envelope.encapsulated_key.wrapped_file_key,
        b.envelope.encapsulated_key.wrapped_file_key
    );
    assert_ne!(a.ciphertext, b.ciphertext);

    // Both still open to the same plaintext
    assert_eq!(
        open(&a.envelope, &a.ciphertext, &keys.kem_private, &keys.sig_public).unwrap(),
        content
    );
    assert_eq!(
        open(&b.envelope, &b.ciphertext, &keys.kem_private, &keys.sig_public).unwrap(),
        content
    );
}

// ── Wrong Keys ──

#[test]
fn wrong_decapsulation_key_cannot_open() {
    let owner = generate_keypairs();
    let stranger = generate_keypairs();
    let sealed = seal(b"private", &owner.kem_public, &owner.sig_private, metadata(7)).unwrap();

    // ML-KEM implicit rejection: decapsulation yields an unrelated secret,
    // so the content-key unwrap fails its tag check.
    let err = open(
        &sealed.envelope,
        &sealed.ciphertext,
        &stranger.kem_private,
        &owner.sig_public,
    )
    .unwrap_err();
    assert_eq!(err, CryptoError::CryptoFailure);
}

#[test]
fn foreign_verification_key_rejected_before_decryption() {
    let owner = generate_keypairs();
    let stranger = generate_keypairs();
    let sealed = seal(b"private", &owner.kem_public, &owner.sig_private, metadata(7)).unwrap();

    let err = open(
        &sealed.envelope,
        &sealed.ciphertext,
        &owner.kem_private,
        &stranger.sig_public,
    )
    .unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("metadata signature"));
}

// ── Tampering ──

#[test]
fn flipped_ciphertext_bit_is_an_integrity_violation() {
    let keys = generate_keypairs();
    let sealed = seal(b"integrity", &keys.kem_public, &keys.sig_private, metadata(9)).unwrap();

    let mut ciphertext = sealed.ciphertext.clone();
    ciphertext[0] ^= 0x01;

    let err = open(&sealed.envelope, &ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("content digest"));
}

#[test]
fn every_ciphertext_byte_position_tampering_detected() {
    let keys = generate_keypairs();
    let sealed = seal(
        b"position tamper sweep",
        &keys.kem_public,
        &keys.sig_private,
        metadata(21),
    )
    .unwrap();

    for i in 0..sealed.ciphertext.len() {
        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[i] ^= 0xFF;
        assert!(
            open(&sealed.envelope, &ciphertext, &keys.kem_private, &keys.sig_public).is_err(),
            "tampering at byte {i} should be detected"
        );
    }
}

#[test]
fn flipped_tag_bit_is_a_crypto_failure() {
    let keys = generate_keypairs();
    let sealed = seal(b"tag check", &keys.kem_public, &keys.sig_private, metadata(9)).unwrap();

    let mut envelope = sealed.envelope.clone();
    envelope.tag[0] ^= 0x01;

    let err = open(&envelope, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::CryptoFailure);
}

#[test]
fn flipped_digest_bit_detected() {
    let keys = generate_keypairs();
    let sealed = seal(b"digest check", &keys.kem_public, &keys.sig_private, metadata(12)).unwrap();

    let mut envelope = sealed.envelope.clone();
    // Swap one hex character for a different valid one
    let mut hash = envelope.content_hash.into_bytes();
    hash[0] = if hash[0] == b'0' { b'1' } else { b'0' };
    envelope.content_hash = String::from_utf8(hash).unwrap();

    let err = open(&envelope, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("content digest"));
}

#[test]
fn flipped_content_signature_bit_detected() {
    let keys = generate_keypairs();
    let sealed = seal(b"sig check", &keys.kem_public, &keys.sig_private, metadata(9)).unwrap();

    let mut envelope = sealed.envelope.clone();
    envelope.content_signature[100] ^= 0x01;

    let err = open(&envelope, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("content signature"));
}

#[test]
fn flipped_metadata_signature_bit_detected() {
    let keys = generate_keypairs();
    let sealed = seal(b"sig check", &keys.kem_public, &keys.sig_private, metadata(9)).unwrap();

    let mut envelope = sealed.envelope.clone();
    envelope.metadata_signature[100] ^= 0x01;

    let err = open(&envelope, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("metadata signature"));
}

#[test]
fn edited_metadata_breaks_metadata_signature() {
    let keys = generate_keypairs();
    let sealed = seal(b"rename attack", &keys.kem_public, &keys.sig_private, metadata(13)).unwrap();

    let mut envelope = sealed.envelope.clone();
    envelope.metadata.filename = "innocuous.txt".to_string();

    let err = open(&envelope, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap_err();
    assert_eq!(err, CryptoError::IntegrityViolation("metadata signature"));
}

// ── Wire Codec ──

#[test]
fn wire_roundtrip_preserves_envelope() {
    let keys = generate_keypairs();
    let sealed = seal(b"over the wire", &keys.kem_public, &keys.sig_private, metadata(13)).unwrap();

    let bytes = wire::encode(&sealed.envelope, &sealed.ciphertext).unwrap();
    let (decoded, ciphertext) = wire::decode(&bytes).unwrap();

    assert_eq!(decoded, sealed.envelope);
    assert_eq!(ciphertext, sealed.ciphertext);

    let recovered = open(&decoded, &ciphertext, &keys.kem_private, &keys.sig_public).unwrap();
    assert_eq!(recovered, b"over the wire");
}

#[test]
fn wire_decode_rejects_unknown_status_byte() {
    let keys = generate_keypairs();
    let sealed = seal(b"status", &keys.kem_public, &keys.sig_private, metadata(6)).unwrap();

    let mut bytes = wire::encode(&sealed.envelope, &sealed.ciphertext).unwrap();
    // Status byte sits right before the metadata length word
    let metadata_json = serde_json::to_vec(&sealed.envelope.metadata).unwrap();
    let status_pos = bytes.len() - sealed.ciphertext.len() - metadata_json.len() - 4 - 1;
    bytes[status_pos] = 9;

    assert!(matches!(
        wire::decode(&bytes).unwrap_err(),
        CryptoError::Validation(_)
    ));
}

#[test]
fn envelope_json_roundtrip() {
    let keys = generate_keypairs();
    let sealed = seal(b"json row", &keys.kem_public, &keys.sig_private, metadata(8)).unwrap();

    let json = serde_json::to_string(&sealed.envelope).unwrap();
    let decoded: veildrive_crypto::FileEnvelope = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, sealed.envelope);

    let recovered = open(&decoded, &sealed.ciphertext, &keys.kem_private, &keys.sig_public).unwrap();
    assert_eq!(recovered, b"json row");
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn seal_open_always_roundtrips(content in proptest::collection::vec(any::<u8>(), 0..512)) {
            let keys = generate_keypairs();
            let sealed = seal(
                &content,
                &keys.kem_public,
                &keys.sig_private,
                metadata(content.len() as u64),
            ).unwrap();
            let recovered = open(
                &sealed.envelope,
                &sealed.ciphertext,
                &keys.kem_private,
                &keys.sig_public,
            ).unwrap();
            prop_assert_eq!(recovered, content);
        }
    }
}
