use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;
use service_core::middleware::Principal;
use service_core::utils::ValidatedJson;

use crate::dtos::auth::{LoginRequest, RegisterRequest};
use crate::AppState;

/// Register a new user and return a bearer token.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.register(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Login with email and password.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.login(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

/// Profile of the authenticated user.
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.me(principal.0).await?;
    Ok((StatusCode::OK, Json(res)))
}
