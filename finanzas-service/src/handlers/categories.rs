use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use service_core::middleware::Principal;
use service_core::utils::ValidatedJson;
use uuid::Uuid;

use crate::dtos::categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

/// Names are stored trimmed; a name that is only whitespace is rejected after
/// the length validation already ran on the raw input.
fn trimmed_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Unprocessable(anyhow::anyhow!(
            "Category name must not be blank"
        )));
    }
    Ok(name)
}

pub async fn create_category(
    State(state): State<AppState>,
    Principal(owner): Principal,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = trimmed_name(&req.name)?;
    let category = state
        .db
        .create_category(owner, name, req.color.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Principal(owner): Principal,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.db.list_categories(owner).await?;
    let response: Vec<CategoryResponse> =
        categories.into_iter().map(CategoryResponse::from).collect();
    Ok(Json(response))
}

pub async fn update_category(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Path(category_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = trimmed_name(&req.name)?;
    let category = state
        .db
        .update_category(owner, category_id, name, req.color.as_deref())
        .await?;
    Ok(Json(CategoryResponse::from(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Principal(owner): Principal,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.db.delete_category(owner, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
