//! Self-verifying credentials: HS256 JWTs carrying the subject and its expiry.
//!
//! Expiry is checked against the injected [`Clock`] with no grace window, so
//! `jsonwebtoken`'s own wall-clock validation is switched off.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::error::{AuthError, AuthResult};
use super::principal::SubjectIdentity;

pub const TOKEN_ISSUER: &str = "pocketbook";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialClaims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    pub iss: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}

/// A freshly signed credential and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub raw: String,
    pub expires_at: DateTime<Utc>,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

pub struct CredentialCodec {
    keys: Option<SigningKeys>,
    clock: Arc<dyn Clock>,
}

impl CredentialCodec {
    /// Build a codec; a missing or empty secret leaves it unable to sign.
    pub fn new(secret: Option<&str>, clock: Arc<dyn Clock>) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| SigningKeys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });
        Self { keys, clock }
    }

    pub fn can_sign(&self) -> bool {
        self.keys.is_some()
    }

    pub fn issue(&self, subject_id: &str, username: &str, ttl: Duration) -> AuthResult<IssuedCredential> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| AuthError::SigningError("no signing secret configured".to_string()))?;
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SigningError(format!("credential lifetime of {}s is out of range", ttl.num_seconds())))?;
        let claims = CredentialClaims {
            sub: subject_id.to_string(),
            username: username.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let raw = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AuthError::SigningError(format!("jwt encoding error: {e}")))?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().unwrap_or(expires_at);
        Ok(IssuedCredential { raw, expires_at })
    }

    pub fn verify(&self, raw: &str) -> AuthResult<SubjectIdentity> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| AuthError::SigningError("no verification secret configured".to_string()))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = decode::<CredentialClaims>(raw, &keys.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::Malformed(e.to_string()),
        })?;
        let claims = data.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }
        if claims.sub.is_empty() {
            return Err(AuthError::Malformed("empty subject".to_string()));
        }
        Ok(SubjectIdentity::new(claims.sub, claims.username))
    }
}
