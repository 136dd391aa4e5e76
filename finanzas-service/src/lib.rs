pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::FinanzasConfig;
use crate::services::Database;
use service_core::error::AppError;
use service_core::middleware::require_auth;
use service_core::token::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub config: FinanzasConfig,
    pub db: Database,
    pub verifier: TokenVerifier,
}

impl AsRef<TokenVerifier> for AppState {
    fn as_ref(&self) -> &TokenVerifier {
        &self.verifier
    }
}

pub fn build_router(state: AppState) -> Router {
    // Every data route sits behind the bearer check; only /health is public.
    let protected = Router::new()
        .route(
            "/categories",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route(
            "/categories/:id",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            "/movements",
            post(handlers::movements::create_movement).get(handlers::movements::list_movements),
        )
        .route(
            "/movements/:id",
            get(handlers::movements::get_movement)
                .put(handlers::movements::update_movement)
                .delete(handlers::movements::delete_movement),
        )
        .layer(from_fn_with_state(state.clone(), require_auth::<AppState>));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
}

/// Service health check.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
