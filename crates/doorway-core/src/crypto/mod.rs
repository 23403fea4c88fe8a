//! Cryptographic primitives for the Doorway platform.
//!
//! Message authenticity between controllers and the gateway rests on one
//! construction: a SHA-256 digest of the inner payload bytes, signed with
//! RSA PKCS#1 v1.5. Each door controller holds its own 2048-bit key pair and
//! the gateway holds one of its own; public keys are exchanged out of band
//! as SubjectPublicKeyInfo DER and stored alongside the device record.
//!
//! Confidentiality is explicitly not provided — payloads travel in the
//! clear and only their origin is proven.
//!
//! # Example
//!
//! ```rust,no_run
//! use doorway_core::crypto::{sign, verify, Keypair};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let keypair = Keypair::generate()?;
//! let payload = b"inner message bytes";
//!
//! let sig = sign(payload, keypair.private_key())?;
//! verify(payload, &sig, &keypair.public_key_der()?)?;
//! # Ok(())
//! # }
//! ```

mod keys;
mod sign;

#[cfg(test)]
mod tests;

pub use keys::{KeyError, Keypair, KEY_BITS};
pub use sign::{sign, verify, SignatureError};
