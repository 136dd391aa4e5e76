use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use service_core::middleware::Principal;
use service_core::utils::ValidatedJson;
use uuid::Uuid;

use crate::dtos::movements::{
    CreateMovementRequest, MovementListParams, MovementResponse, UpdateMovementRequest,
};
use crate::models::{CreateMovement, UpdateMovement};
use crate::AppState;

pub async fn create_movement(
    State(state): State<AppState>,
    Principal(owner): Principal,
    ValidatedJson(req): ValidatedJson<CreateMovementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movement = state
        .db
        .create_movement(&CreateMovement {
            user_id: owner,
            category_id: req.category_id,
            date: req.date,
            amount: req.amount,
            kind: req.kind,
            note: req.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(MovementResponse::from(movement))))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Query(params): Query<MovementListParams>,
) -> Result<impl IntoResponse, AppError> {
    let movements = state
        .db
        .list_movements(owner, params.from, params.to)
        .await?;
    let response: Vec<MovementResponse> =
        movements.into_iter().map(MovementResponse::from).collect();
    Ok(Json(response))
}

pub async fn get_movement(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Path(movement_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let movement = state.db.get_movement(owner, movement_id).await?;
    Ok(Json(MovementResponse::from(movement)))
}

pub async fn update_movement(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Path(movement_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateMovementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let movement = state
        .db
        .update_movement(&UpdateMovement {
            user_id: owner,
            movement_id,
            category_id: req.category_id,
            date: req.date,
            amount: req.amount,
            kind: req.kind,
            note: req.note,
        })
        .await?;
    Ok(Json(MovementResponse::from(movement)))
}

pub async fn delete_movement(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Path(movement_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_movement(owner, movement_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
