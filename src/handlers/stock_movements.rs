use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::{success_response, PaginatedResponse, PaginationParams};
use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::StockableKind;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::stock_movements::MovementFilter;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMovementsQuery {
    pub stockable_kind: Option<StockableKind>,
    pub stockable_id: Option<i32>,
    pub location_id: Option<i32>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List stock movements, newest first
#[utoipa::path(
    get,
    path = "/api/v1/stock-movements",
    params(ListMovementsQuery),
    responses((status = 200, description = "Movements retrieved")),
    security(("Bearer" = [])),
    tag = "stock"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListMovementsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = query.pagination.clamped(state.config.api_max_page_size);
    let filter = MovementFilter {
        stockable_kind: query.stockable_kind,
        stockable_id: query.stockable_id,
        location_id: query.location_id,
    };
    let (items, total) = state
        .services
        .stock_movements
        .list(auth_user.company_id, filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/stock-movements", get(list_movements))
}
