use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::success_response;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPerishablesQuery {
    /// Only batches not yet acknowledged
    #[serde(default)]
    pub only_unread: bool,
    /// List swept (expired or exhausted) batches instead of active ones
    #[serde(default)]
    pub expired: bool,
}

/// List perishable batches with computed expirations, soonest first
#[utoipa::path(
    get,
    path = "/api/v1/perishables",
    params(ListPerishablesQuery),
    responses((status = 200, description = "Batches retrieved")),
    security(("Bearer" = [])),
    tag = "perishables"
)]
pub async fn list_perishables(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListPerishablesQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    if query.expired {
        let swept = state
            .services
            .perishables
            .list_expired(auth_user.company_id)
            .await?;
        return Ok(success_response(swept));
    }

    let batches = state
        .services
        .perishables
        .list(auth_user.company_id, query.only_unread)
        .await?;
    Ok(success_response(batches))
}

/// Acknowledge a batch notification
#[utoipa::path(
    patch,
    path = "/api/v1/perishables/{id}/read",
    params(("id" = i32, Path, description = "Perishable batch id")),
    responses(
        (status = 200, description = "Batch acknowledged"),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "perishables"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let batch = state
        .services
        .perishables
        .mark_read(auth_user.company_id, id)
        .await?;
    Ok(success_response(batch))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/perishables", get(list_perishables))
        .route("/perishables/:id/read", patch(mark_read))
}
