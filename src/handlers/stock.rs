use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use super::common::success_response;
use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use crate::errors::ServiceError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockChangeRequest {
    pub stockable_kind: StockableKind,
    pub stockable_id: i32,
    pub location_id: i32,
    pub quantity: Decimal,
    /// Unit of `quantity`; the entity's own unit when absent
    pub unit: Option<MeasurementUnit>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockTransferRequest {
    pub stockable_kind: StockableKind,
    pub stockable_id: i32,
    pub from_location_id: i32,
    pub to_location_id: i32,
    pub quantity: Decimal,
    pub unit: Option<MeasurementUnit>,
}

/// Add stock at a location
#[utoipa::path(
    post,
    path = "/api/v1/stock/add",
    request_body = StockChangeRequest,
    responses(
        (status = 200, description = "Stock added"),
        (status = 400, description = "Non-positive quantity or unit mismatch", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "stock"
)]
pub async fn add_stock(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<StockChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quantity = state
        .services
        .stock
        .add(
            auth_user.company_id,
            Some(auth_user.user_id),
            payload.stockable_kind,
            payload.stockable_id,
            payload.location_id,
            payload.quantity,
            payload.unit,
            payload.reason,
        )
        .await?;
    Ok(success_response(serde_json::json!({
        "stockable_kind": payload.stockable_kind,
        "stockable_id": payload.stockable_id,
        "location_id": payload.location_id,
        "quantity": quantity,
    })))
}

/// Remove stock at a location
#[utoipa::path(
    post,
    path = "/api/v1/stock/remove",
    request_body = StockChangeRequest,
    responses(
        (status = 200, description = "Stock removed"),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "stock"
)]
pub async fn remove_stock(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<StockChangeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let quantity = state
        .services
        .stock
        .remove(
            auth_user.company_id,
            Some(auth_user.user_id),
            payload.stockable_kind,
            payload.stockable_id,
            payload.location_id,
            payload.quantity,
            payload.unit,
            payload.reason,
        )
        .await?;
    Ok(success_response(serde_json::json!({
        "stockable_kind": payload.stockable_kind,
        "stockable_id": payload.stockable_id,
        "location_id": payload.location_id,
        "quantity": quantity,
    })))
}

/// Move stock between two locations
#[utoipa::path(
    post,
    path = "/api/v1/stock/transfer",
    request_body = StockTransferRequest,
    responses(
        (status = 200, description = "Stock moved"),
        (status = 422, description = "Not enough stock at the source", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "stock"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<StockTransferRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .stock
        .transfer(
            auth_user.company_id,
            Some(auth_user.user_id),
            payload.stockable_kind,
            payload.stockable_id,
            payload.from_location_id,
            payload.to_location_id,
            payload.quantity,
            payload.unit,
        )
        .await?;
    Ok(success_response(serde_json::json!({
        "stockable_kind": payload.stockable_kind,
        "stockable_id": payload.stockable_id,
        "from_location_id": payload.from_location_id,
        "to_location_id": payload.to_location_id,
    })))
}

/// Stock of one entity at every location holding it
#[utoipa::path(
    get,
    path = "/api/v1/stock/{kind}/{id}/levels",
    params(
        ("kind" = String, Path, description = "ingredient or preparation"),
        ("id" = i32, Path, description = "Entity id"),
    ),
    responses(
        (status = 200, description = "Levels retrieved"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "stock"
)]
pub async fn stock_levels(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((kind, id)): Path<(StockableKind, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    let levels = state
        .services
        .stock
        .levels(auth_user.company_id, kind, id)
        .await?;
    Ok(success_response(levels))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/add", post(add_stock))
        .route("/stock/remove", post(remove_stock))
        .route("/stock/transfer", post(transfer_stock))
        .route("/stock/:kind/:id/levels", get(stock_levels))
}
