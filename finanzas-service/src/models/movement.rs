//! Movement model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Direction of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Income,
    Expense,
}

impl MovementKind {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense entry.
///
/// `category_id` always points at a category with the same `user_id`; the
/// store refuses any write that would break that, and the foreign key forbids
/// deleting a category that is still referenced.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Movement {
    pub movement_id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a new movement.
#[derive(Debug, Clone)]
pub struct CreateMovement {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
}

/// Input for replacing an existing movement.
#[derive(Debug, Clone)]
pub struct UpdateMovement {
    pub user_id: Uuid,
    pub movement_id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
}
