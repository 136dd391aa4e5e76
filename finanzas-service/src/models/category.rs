//! Category model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Spending category, owned by exactly one user.
///
/// `(user_id, name)` is unique: the same user cannot hold two categories with
/// the same name, while different users may. Enforced by the database index,
/// not by an application-level pre-check.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_utc: DateTime<Utc>,
}
