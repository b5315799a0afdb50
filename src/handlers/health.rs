use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::handlers::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Liveness and database connectivity check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state
        .db
        .execute_unprepared("SELECT 1")
        .await
        .is_ok();

    let (status, body) = if db_ok {
        (
            StatusCode::OK,
            HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                database: "up",
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "degraded",
                version: env!("CARGO_PKG_VERSION"),
                database: "down",
            },
        )
    };
    (status, Json(body))
}

/// Plain liveness probe, no dependencies checked
pub async fn status() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
