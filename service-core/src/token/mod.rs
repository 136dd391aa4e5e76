//! Bearer token claims and verification.
//!
//! Tokens are minted by auth-service and verified independently by every
//! service sharing the same symmetric secret. Verification is a pure function
//! of the token string and the configuration: no I/O, no shared mutable state,
//! safe to call from any task without synchronization.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

/// Default clock-skew tolerance between issuer and verifier.
pub const DEFAULT_LEEWAY_SECONDS: u64 = 60;

/// Shared token parameters: the signing secret and the issuer/audience pair
/// that both sides must agree on bit-for-bit.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub audience: String,
    pub leeway_seconds: u64,
}

impl TokenConfig {
    pub fn new(secret: Secret<String>, issuer: String, audience: String) -> Self {
        Self {
            secret,
            issuer,
            audience,
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
        }
    }
}

/// Registered claims carried by every access token.
///
/// The claim set is fixed; anything beyond identity (display name, etc.) goes
/// into the string-to-string extension map rather than an open claim bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal's user ID.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Not valid before (Unix timestamp).
    pub nbf: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Extension claims (email, display name).
    #[serde(flatten, skip_serializing_if = "HashMap::is_empty", default)]
    pub extra: HashMap<String, String>,
}

/// Why a token was rejected.
///
/// Variants exist for logging; callers must collapse all of them into one
/// uniform authentication failure so the rejection reason never leaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("signature mismatch")]
    BadSignature,
    #[error("issuer mismatch")]
    IssuerMismatch,
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("malformed token")]
    Malformed,
}

/// Stateless HS256 token verifier.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from shared token parameters.
    ///
    /// An empty secret is a configuration error surfaced at startup, never at
    /// request time.
    pub fn new(config: &TokenConfig) -> Result<Self, AppError> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "token signing secret must not be empty"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = config.leeway_seconds;
        validation.validate_nbf = true;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verify signature, issuer, audience and time window, in that order.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| Self::classify(&e))?;
        Ok(data.claims)
    }

    /// Verify a token and parse its subject as the principal identifier.
    pub fn verify_principal(&self, token: &str) -> Result<Uuid, VerifyError> {
        let claims = self.verify(token)?;
        claims.sub.parse().map_err(|_| VerifyError::Malformed)
    }

    fn classify(err: &jsonwebtoken::errors::Error) -> VerifyError {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidSignature => VerifyError::BadSignature,
            ErrorKind::InvalidIssuer => VerifyError::IssuerMismatch,
            ErrorKind::InvalidAudience => VerifyError::AudienceMismatch,
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
            _ => VerifyError::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";
    const ISSUER: &str = "auth.api";
    const AUDIENCE: &str = "finanzas.api";

    fn config() -> TokenConfig {
        TokenConfig::new(
            Secret::new(SECRET.to_string()),
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        )
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to sign test token")
    }

    fn claims_valid_for(minutes: i64) -> Claims {
        let now = Utc::now();
        Claims {
            sub: Uuid::new_v4().to_string(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::minutes(minutes)).timestamp(),
            extra: HashMap::new(),
        }
    }

    #[test]
    fn accepts_valid_token_and_returns_subject() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let claims = claims_valid_for(60);
        let expected: Uuid = claims.sub.parse().unwrap();

        let principal = verifier
            .verify_principal(&sign(&claims, SECRET))
            .expect("valid token should verify");
        assert_eq!(principal, expected);
    }

    #[test]
    fn preserves_extension_claims() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let mut claims = claims_valid_for(60);
        claims
            .extra
            .insert("email".to_string(), "ana@example.com".to_string());

        let decoded = verifier.verify(&sign(&claims, SECRET)).unwrap();
        assert_eq!(decoded.extra.get("email").unwrap(), "ana@example.com");
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let token = sign(&claims_valid_for(60), "some-other-secret");
        assert_eq!(verifier.verify(&token), Err(VerifyError::BadSignature));
    }

    #[test]
    fn rejects_wrong_issuer() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let mut claims = claims_valid_for(60);
        claims.iss = "someone-else".to_string();
        assert_eq!(
            verifier.verify(&sign(&claims, SECRET)),
            Err(VerifyError::IssuerMismatch)
        );
    }

    #[test]
    fn rejects_wrong_audience() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let mut claims = claims_valid_for(60);
        claims.aud = "another-service".to_string();
        assert_eq!(
            verifier.verify(&sign(&claims, SECRET)),
            Err(VerifyError::AudienceMismatch)
        );
    }

    #[test]
    fn expiry_honors_clock_skew_tolerance() {
        let verifier = TokenVerifier::new(&config()).unwrap();

        // Expired 30 seconds ago: inside the 60s leeway, still accepted.
        let mut claims = claims_valid_for(60);
        claims.exp = (Utc::now() - Duration::seconds(30)).timestamp();
        assert!(verifier.verify(&sign(&claims, SECRET)).is_ok());

        // Expired beyond the leeway: rejected.
        claims.exp = (Utc::now() - Duration::seconds(90)).timestamp();
        assert_eq!(
            verifier.verify(&sign(&claims, SECRET)),
            Err(VerifyError::Expired)
        );
    }

    #[test]
    fn rejects_token_not_yet_valid() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let now = Utc::now();
        let mut claims = claims_valid_for(60);
        claims.nbf = (now + Duration::minutes(5)).timestamp();
        assert_eq!(
            verifier.verify(&sign(&claims, SECRET)),
            Err(VerifyError::NotYetValid)
        );
    }

    #[test]
    fn rejects_garbage_token() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        assert_eq!(
            verifier.verify("not.a.token"),
            Err(VerifyError::Malformed)
        );
        assert_eq!(verifier.verify(""), Err(VerifyError::Malformed));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let verifier = TokenVerifier::new(&config()).unwrap();
        let mut claims = claims_valid_for(60);
        claims.sub = "not-a-uuid".to_string();
        assert_eq!(
            verifier.verify_principal(&sign(&claims, SECRET)),
            Err(VerifyError::Malformed)
        );
    }

    #[test]
    fn empty_secret_is_a_startup_error() {
        let config = TokenConfig::new(
            Secret::new(String::new()),
            ISSUER.to_string(),
            AUDIENCE.to_string(),
        );
        assert!(TokenVerifier::new(&config).is_err());
    }
}
