use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::StockableKind;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::losses::LossFilter;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordLossRequest {
    pub stockable_kind: StockableKind,
    pub stockable_id: i32,
    pub location_id: i32,
    pub quantity: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListLossesQuery {
    pub stockable_kind: Option<StockableKind>,
    pub stockable_id: Option<i32>,
    pub location_id: Option<i32>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List recorded losses, newest first
#[utoipa::path(
    get,
    path = "/api/v1/losses",
    params(ListLossesQuery),
    responses((status = 200, description = "Losses retrieved")),
    security(("Bearer" = [])),
    tag = "losses"
)]
pub async fn list_losses(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListLossesQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = query.pagination.clamped(state.config.api_max_page_size);
    let filter = LossFilter {
        stockable_kind: query.stockable_kind,
        stockable_id: query.stockable_id,
        location_id: query.location_id,
    };
    let (items, total) = state
        .services
        .losses
        .list(auth_user.company_id, filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Record a loss, deducting the quantity from stock
#[utoipa::path(
    post,
    path = "/api/v1/losses",
    request_body = RecordLossRequest,
    responses(
        (status = 201, description = "Loss recorded"),
        (status = 422, description = "Not enough stock to lose", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "losses"
)]
pub async fn record_loss(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<RecordLossRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let loss = state
        .services
        .losses
        .record_loss(
            auth_user.company_id,
            Some(auth_user.user_id),
            payload.stockable_kind,
            payload.stockable_id,
            payload.location_id,
            payload.quantity,
            payload.reason,
        )
        .await?;
    Ok(created_response(loss))
}

/// Roll a loss back, restoring the quantity to stock
#[utoipa::path(
    post,
    path = "/api/v1/losses/{id}/rollback",
    params(("id" = i32, Path, description = "Loss id")),
    responses(
        (status = 204, description = "Loss rolled back"),
        (status = 404, description = "Loss not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "losses"
)]
pub async fn rollback_loss(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .losses
        .rollback(auth_user.company_id, Some(auth_user.user_id), id)
        .await?;
    Ok(no_content_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/losses", get(list_losses).post(record_loss))
        .route("/losses/:id/rollback", post(rollback_loss))
}
