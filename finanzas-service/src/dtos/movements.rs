use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Movement, MovementKind};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovementRequest {
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: MovementKind,
    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

/// Same shape for create and full update.
pub type UpdateMovementRequest = CreateMovementRequest;

#[derive(Debug, Deserialize)]
pub struct MovementListParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct MovementResponse {
    pub id: Uuid,
    pub category_id: Uuid,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
}

impl From<Movement> for MovementResponse {
    fn from(movement: Movement) -> Self {
        Self {
            id: movement.movement_id,
            category_id: movement.category_id,
            date: movement.date,
            amount: movement.amount,
            kind: movement.kind,
            note: movement.note,
        }
    }
}
