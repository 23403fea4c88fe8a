//! Signing and key handling tests.
//!
//! Key pairs are fixed fixtures rather than generated per test: RSA prime
//! search is slow in debug builds and the properties under test do not
//! depend on which key is used.

use tempfile::tempdir;

use super::*;

const GATEWAY_KEY_PEM: &str = include_str!("testdata/gateway.pem");
const DEVICE_KEY_PEM: &str = include_str!("testdata/device.pem");

/// SubjectPublicKeyInfo DER for an Ed25519 key. A valid key of the wrong
/// algorithm, for the unsupported-key-type failure path.
const ED25519_SPKI_DER: &[u8] = &[
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00, 0xd6, 0xd5, 0xb7,
    0xd0, 0xb9, 0xf7, 0x48, 0x98, 0x6e, 0xac, 0xdd, 0x28, 0xd1, 0xfd, 0xb5, 0x51, 0x3e, 0xdb,
    0x41, 0x0b, 0xe2, 0xfb, 0x21, 0x58, 0xad, 0xfc, 0xa1, 0xda, 0x70, 0x18, 0x30, 0x21,
];

fn device_keypair() -> Keypair {
    Keypair::from_pkcs8_pem(DEVICE_KEY_PEM).expect("device fixture key")
}

fn gateway_keypair() -> Keypair {
    Keypair::from_pkcs8_pem(GATEWAY_KEY_PEM).expect("gateway fixture key")
}

#[test]
fn sign_then_verify_succeeds() {
    let keypair = device_keypair();
    let payload = b"pending unlock for room 3142";

    let sig = keypair.sign(payload).expect("sign");
    let der = keypair.public_key_der().expect("export");
    verify(payload, &sig, &der).expect("verify");
}

#[test]
fn payload_mutation_fails_verification() {
    let keypair = device_keypair();
    let payload = b"pending unlock for room 3142".to_vec();
    let sig = keypair.sign(&payload).expect("sign");
    let der = keypair.public_key_der().expect("export");

    let mut flipped = payload;
    flipped[0] ^= 0x01;
    assert!(matches!(
        verify(&flipped, &sig, &der),
        Err(SignatureError::Invalid)
    ));
}

#[test]
fn signature_mutation_fails_verification() {
    let keypair = device_keypair();
    let payload = b"pending unlock for room 3142";
    let mut sig = keypair.sign(payload).expect("sign");
    let der = keypair.public_key_der().expect("export");

    let last = sig.len() - 1;
    sig[last] ^= 0x01;
    assert!(matches!(
        verify(payload, &sig, &der),
        Err(SignatureError::Invalid)
    ));
}

#[test]
fn verification_with_the_wrong_key_fails() {
    let device = device_keypair();
    let gateway = gateway_keypair();
    let payload = b"pending unlock for room 3142";

    let sig = device.sign(payload).expect("sign");
    let wrong_der = gateway.public_key_der().expect("export");
    assert!(matches!(
        verify(payload, &sig, &wrong_der),
        Err(SignatureError::Invalid)
    ));
}

#[test]
fn non_rsa_key_is_a_hard_failure() {
    let keypair = device_keypair();
    let sig = keypair.sign(b"payload").expect("sign");

    assert!(matches!(
        verify(b"payload", &sig, ED25519_SPKI_DER),
        Err(SignatureError::MalformedKey)
    ));
}

#[test]
fn truncated_key_material_is_malformed() {
    assert!(matches!(
        verify(b"payload", &[0u8; 256], &[0x30, 0x82]),
        Err(SignatureError::MalformedKey)
    ));
}

#[test]
fn pem_round_trip_preserves_the_key() {
    let keypair = device_keypair();
    let reparsed = Keypair::from_pkcs8_pem(DEVICE_KEY_PEM).expect("reparse");
    assert_eq!(
        keypair.public_key_der().expect("export"),
        reparsed.public_key_der().expect("export"),
    );
}

#[test]
fn load_or_generate_persists_and_reloads() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("gateway-key.pem");

    // Seed the path with a known key; load must parse it rather than
    // generate a fresh one.
    std::fs::write(&path, GATEWAY_KEY_PEM).expect("seed key file");
    let loaded = Keypair::load_or_generate(&path).expect("load");
    assert_eq!(
        loaded.public_key_der().expect("export"),
        gateway_keypair().public_key_der().expect("export"),
    );
}
