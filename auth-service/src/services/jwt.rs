use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::JwtConfig;
use crate::models::User;
use service_core::error::AppError;
use service_core::token::Claims;

/// Token issuer.
///
/// Issuance is stateless: no server-side record is written, so a token stays
/// valid for its full lifetime regardless of later events. Every verifying
/// service checks the same issuer/audience pair against the shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    expiry_minutes: i64,
}

/// Token response returned to the client.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl JwtService {
    /// Create the issuer from configuration.
    ///
    /// An empty signing secret fails here, at startup, not at issuance time.
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        let secret = config.secret.expose_secret();
        if secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must not be empty"
            )));
        }

        tracing::info!(
            issuer = %config.issuer,
            audience = %config.audience,
            expiry_minutes = config.expiry_minutes,
            "JWT issuer initialized with HS256 symmetric key"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry_minutes: config.expiry_minutes,
        })
    }

    /// Issue a signed token for an authenticated user.
    ///
    /// The subject is the user's principal identifier; email and display name
    /// travel in the extension map.
    pub fn issue(&self, user: &User) -> Result<TokenResponse, AppError> {
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.expiry_minutes);

        let mut extra = HashMap::new();
        extra.insert("email".to_string(), user.email.clone());
        let name = user.display_name();
        if !name.is_empty() {
            extra.insert("name".to_string(), name);
        }

        let claims = Claims {
            sub: user.user_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e)))?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_at,
        })
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use service_core::token::TokenVerifier;

    fn test_config(secret: &str, expiry_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: Secret::new(secret.to_string()),
            issuer: "auth.api".to_string(),
            audience: "finanzas.api".to_string(),
            expiry_minutes,
        }
    }

    fn test_user() -> User {
        User::new(
            "ana@example.com".to_string(),
            "unused-hash".to_string(),
            "Ana".to_string(),
            "García".to_string(),
        )
    }

    #[test]
    fn empty_secret_fails_at_construction() {
        assert!(JwtService::new(&test_config("", 60)).is_err());
    }

    #[test]
    fn issued_token_verifies_with_shared_config() {
        let config = test_config("issuer-test-secret", 60);
        let issuer = JwtService::new(&config).unwrap();
        let verifier = TokenVerifier::new(&config.token_config()).unwrap();

        let user = test_user();
        let response = issuer.issue(&user).unwrap();
        assert_eq!(response.token_type, "Bearer");

        let principal = verifier
            .verify_principal(&response.access_token)
            .expect("Freshly issued token should verify");
        assert_eq!(principal, user.user_id);

        let claims = verifier.verify(&response.access_token).unwrap();
        assert_eq!(claims.extra.get("email").unwrap(), "ana@example.com");
        assert_eq!(claims.extra.get("name").unwrap(), "Ana García");
    }

    #[test]
    fn issued_token_fails_against_different_secret() {
        let issuer = JwtService::new(&test_config("issuer-secret-a", 60)).unwrap();
        let verifier =
            TokenVerifier::new(&test_config("issuer-secret-b", 60).token_config()).unwrap();

        let response = issuer.issue(&test_user()).unwrap();
        assert!(verifier.verify(&response.access_token).is_err());
    }

    #[test]
    fn expiry_matches_configured_lifetime() {
        let config = test_config("issuer-test-secret", 45);
        let issuer = JwtService::new(&config).unwrap();

        let before = Utc::now();
        let response = issuer.issue(&test_user()).unwrap();
        let lifetime = response.expires_at - before;

        assert!(lifetime <= Duration::minutes(45));
        assert!(lifetime > Duration::minutes(44));
    }
}
