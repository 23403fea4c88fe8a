//! Gateway key material management.

use std::fs;
use std::io;
use std::path::Path;

use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;
use tracing::info;

use super::sign::{sign, SignatureError};

/// RSA modulus size for generated keys.
pub const KEY_BITS: usize = 2048;

/// Errors from key loading, generation, and export.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Reading or writing the key file failed.
    #[error("key file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The key file is not a valid PKCS#8 private key.
    #[error("invalid PKCS#8 key material: {0}")]
    Pkcs8(#[from] rsa::pkcs8::Error),

    /// Exporting the public half as SubjectPublicKeyInfo failed.
    #[error("public key export failed: {0}")]
    Spki(#[from] rsa::pkcs8::spki::Error),

    /// Key generation failed.
    #[error("key generation failed: {0}")]
    Generate(#[from] rsa::Error),
}

/// An RSA key pair used by a signing party (the gateway, or a controller in
/// tests and provisioning tooling).
#[derive(Debug, Clone)]
pub struct Keypair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl Keypair {
    /// Generates a fresh [`KEY_BITS`]-bit key pair.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Generate`] when the RNG or prime search fails.
    pub fn generate() -> Result<Self, KeyError> {
        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, KEY_BITS)?;
        let public = private.to_public_key();
        Ok(Self { private, public })
    }

    /// Parses a key pair from a PKCS#8 PEM private key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Pkcs8`] when the PEM is not an RSA private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)?;
        let public = private.to_public_key();
        Ok(Self { private, public })
    }

    /// Loads the key pair at `path`, generating and persisting one on first
    /// boot.
    ///
    /// Generated keys are written as PKCS#8 PEM with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] on I/O failure, malformed key material, or a
    /// failed generation.
    pub fn load_or_generate(path: &Path) -> Result<Self, KeyError> {
        if path.exists() {
            let pem = fs::read_to_string(path)?;
            return Self::from_pkcs8_pem(&pem);
        }

        info!(path = %path.display(), "no key material found, generating a new key pair");
        let keypair = Self::generate()?;
        let pem = keypair.private.to_pkcs8_pem(LineEnding::LF)?;
        fs::write(path, pem.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(keypair)
    }

    /// Signs `payload` with the private half.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::SigningFailed`] when the RSA operation
    /// fails.
    pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
        sign(payload, &self.private)
    }

    /// The private half, for callers that sign through [`crate::crypto::sign`]
    /// directly.
    #[must_use]
    pub const fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    /// The public half.
    #[must_use]
    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Exports the public half as SubjectPublicKeyInfo DER, the format peers
    /// are provisioned with.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Spki`] when DER encoding fails.
    pub fn public_key_der(&self) -> Result<Vec<u8>, KeyError> {
        Ok(self.public.to_public_key_der()?.into_vec())
    }
}
