//! User model - the credential store record behind every principal.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// User account. `user_id` is the stable principal identifier carried in the
/// `sub` claim of every token this service issues; nothing else ever mints one.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, first_name: String, last_name: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            created_utc: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
