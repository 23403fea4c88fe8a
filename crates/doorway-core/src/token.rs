//! Bus credential minting and verification.
//!
//! The messaging broker hands every connection attempt to the ACL front
//! with a bearer token; this module defines that token. Credentials are
//! HS256 JWTs over a shared secret, carrying the caller's identity and
//! role flags. They do not expire on their own — bus connections are
//! long-lived and revocation happens by rotating the shared secret — so
//! validation checks signature and shape only, and fails closed on
//! anything it cannot decode.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from credential handling.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token failed to decode or its signature did not verify.
    #[error("invalid credential: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// The identity a bus credential asserts.
///
/// Role flags are additive; a credential with none set authenticates but
/// is authorized for nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusIdentity {
    /// Stable identity of the caller; for controllers this is the device
    /// UUID the trust store knows them by.
    pub uuid: String,
    /// The caller is a door controller.
    #[serde(default)]
    pub device: bool,
    /// The caller is a relay server.
    #[serde(default)]
    pub relay: bool,
    /// The caller is an operator.
    #[serde(default)]
    pub superuser: bool,
}

impl BusIdentity {
    /// True when at least one role flag is set.
    #[must_use]
    pub const fn has_role(&self) -> bool {
        self.device || self.relay || self.superuser
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user: BusIdentity,
    iat: i64,
    nbf: i64,
}

/// Mints a credential for `identity`, valid from `issued_at` (seconds since
/// the Unix epoch).
///
/// # Errors
///
/// Returns [`CredentialError`] when encoding fails.
pub fn mint(identity: &BusIdentity, secret: &[u8], issued_at: i64) -> Result<String, CredentialError> {
    let claims = Claims {
        user: identity.clone(),
        iat: issued_at,
        nbf: issued_at,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verifies a credential and returns the identity it asserts.
///
/// # Errors
///
/// Returns [`CredentialError::Invalid`] on any signature, shape, or
/// not-before failure.
pub fn verify(token: &str, secret: &[u8]) -> Result<BusIdentity, CredentialError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = true;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)?;
    Ok(data.claims.user)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"a-shared-broker-secret";

    fn device_identity() -> BusIdentity {
        BusIdentity {
            uuid: "dev-1".to_string(),
            device: true,
            relay: false,
            superuser: false,
        }
    }

    #[test]
    fn mint_then_verify_round_trips_the_identity() {
        let token = mint(&device_identity(), SECRET, 1_700_000_000).expect("mint");
        let identity = verify(&token, SECRET).expect("verify");
        assert_eq!(identity, device_identity());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint(&device_identity(), SECRET, 1_700_000_000).expect("mint");
        assert!(verify(&token, b"some-other-secret").is_err());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(verify("not-a-jwt", SECRET).is_err());
        assert!(verify("", SECRET).is_err());
    }

    #[test]
    fn missing_role_flags_default_to_false() {
        // Tokens minted by older tooling omit flags entirely.
        let identity = BusIdentity {
            uuid: "dev-1".to_string(),
            device: false,
            relay: false,
            superuser: false,
        };
        let token = mint(&identity, SECRET, 1_700_000_000).expect("mint");
        let parsed = verify(&token, SECRET).expect("verify");
        assert!(!parsed.has_role());
    }

    #[test]
    fn role_flags_survive_the_round_trip() {
        let identity = BusIdentity {
            uuid: "ops".to_string(),
            device: false,
            relay: true,
            superuser: true,
        };
        let token = mint(&identity, SECRET, 1_700_000_000).expect("mint");
        let parsed = verify(&token, SECRET).expect("verify");
        assert!(parsed.relay && parsed.superuser && !parsed.device);
    }
}
