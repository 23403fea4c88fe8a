//! Payload signing and verification.

use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from signature creation and verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The stored public key bytes do not decode to an RSA public key.
    ///
    /// Any other key type is a hard failure, never a silent pass: a device
    /// record with an unusable key must not be able to authenticate.
    #[error("public key is not a valid RSA key")]
    MalformedKey,

    /// The signature does not match the payload under the given key.
    #[error("signature verification failed")]
    Invalid,

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    SigningFailed(rsa::Error),
}

/// Signs `payload` with the given private key.
///
/// The signature is an RSA PKCS#1 v1.5 signature over the SHA-256 digest of
/// the raw payload bytes. Callers sign the inner message exactly as encoded;
/// nothing is padded or re-encoded between sign and verify.
///
/// # Errors
///
/// Returns [`SignatureError::SigningFailed`] when the RSA operation fails.
pub fn sign(payload: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>, SignatureError> {
    let digest = Sha256::digest(payload);
    key.sign(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice())
        .map_err(SignatureError::SigningFailed)
}

/// Verifies `sig` over `payload` against a stored public key.
///
/// `public_key_der` is SubjectPublicKeyInfo DER, the format device keys are
/// provisioned in.
///
/// # Errors
///
/// Returns [`SignatureError::MalformedKey`] when the bytes are not an RSA
/// public key, and [`SignatureError::Invalid`] on any signature mismatch.
pub fn verify(payload: &[u8], sig: &[u8], public_key_der: &[u8]) -> Result<(), SignatureError> {
    let key = RsaPublicKey::from_public_key_der(public_key_der)
        .map_err(|_| SignatureError::MalformedKey)?;
    let digest = Sha256::digest(payload);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice(), sig)
        .map_err(|_| SignatureError::Invalid)
}
