//! Registration, login and profile lookup against the credential store.

use crate::dtos::auth::{LoginRequest, MeResponse, RegisterRequest};
use crate::models::User;
use crate::services::{Database, JwtService, ServiceError, TokenResponse};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService) -> Self {
        Self { db, jwt }
    }

    /// Register a new user and issue a token right away, like a first login.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn register(&self, req: RegisterRequest) -> Result<TokenResponse, ServiceError> {
        let password_hash = hash_password(&Password::new(req.password))?;

        let user = User::new(
            req.email,
            password_hash.into_string(),
            req.first_name.unwrap_or_default(),
            req.last_name.unwrap_or_default(),
        );

        // The unique email index turns a racing duplicate into a conflict here.
        let user = self.db.create_user(&user).await?;

        Ok(self.jwt.issue(&user)?)
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password both come back as InvalidCredentials;
    /// the caller cannot probe which accounts exist.
    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let user = self
            .db
            .find_user_by_email(&req.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let password = Password::new(req.password);
        let stored = PasswordHashString::new(user.password_hash.clone());
        verify_password(&password, &stored).map_err(|_| ServiceError::InvalidCredentials)?;

        Ok(self.jwt.issue(&user)?)
    }

    /// Profile of the authenticated principal.
    #[instrument(skip(self))]
    pub async fn me(&self, user_id: Uuid) -> Result<MeResponse, ServiceError> {
        let user = self
            .db
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        Ok(MeResponse {
            id: user.user_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        })
    }
}
