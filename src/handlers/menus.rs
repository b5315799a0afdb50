use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::{MeasurementUnit, MenuServiceKind, StockableKind};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::menus::{MenuUpdate, NewMenu, NewMenuItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemRequest {
    pub stockable_kind: StockableKind,
    pub stockable_id: i32,
    pub location_id: i32,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
}

impl From<MenuItemRequest> for NewMenuItem {
    fn from(req: MenuItemRequest) -> Self {
        Self {
            stockable_kind: req.stockable_kind,
            stockable_id: req.stockable_id,
            location_id: req.location_id,
            quantity: req.quantity,
            unit: req.unit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub service_kind: MenuServiceKind,
    #[serde(default)]
    pub is_returnable: bool,
    pub image_url: Option<String>,
    #[serde(default)]
    pub public_priority: i32,
    #[serde(default)]
    pub items: Vec<MenuItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub service_kind: Option<MenuServiceKind>,
    pub is_returnable: Option<bool>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub image_url: Option<Option<String>>,
    pub public_priority: Option<i32>,
    pub items: Option<Vec<MenuItemRequest>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StockCheckQuery {
    #[serde(default = "default_servings")]
    pub servings: i32,
}

fn default_servings() -> i32 {
    1
}

/// List menus, highest public priority first
#[utoipa::path(
    get,
    path = "/api/v1/menus",
    params(PaginationParams),
    responses((status = 200, description = "Menus retrieved")),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn list_menus(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = pagination.clamped(state.config.api_max_page_size);
    let (items, total) = state
        .services
        .menus
        .list(auth_user.company_id, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Create a menu with its recipe
#[utoipa::path(
    post,
    path = "/api/v1/menus",
    request_body = CreateMenuRequest,
    responses(
        (status = 201, description = "Menu created"),
        (status = 400, description = "Invalid recipe", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn create_menu(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateMenuRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .menus
        .create(
            auth_user.company_id,
            NewMenu {
                name: payload.name,
                description: payload.description,
                price: payload.price,
                service_kind: payload.service_kind,
                is_returnable: payload.is_returnable,
                image_url: payload.image_url,
                public_priority: payload.public_priority,
                items: payload.items.into_iter().map(Into::into).collect(),
            },
        )
        .await?;
    Ok(created_response(detail))
}

/// Get one menu with its recipe
#[utoipa::path(
    get,
    path = "/api/v1/menus/{id}",
    params(("id" = i32, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu retrieved"),
        (status = 404, description = "Menu not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn get_menu(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.menus.get(auth_user.company_id, id).await?;
    Ok(success_response(detail))
}

/// Update a menu
#[utoipa::path(
    patch,
    path = "/api/v1/menus/{id}",
    params(("id" = i32, Path, description = "Menu id")),
    request_body = UpdateMenuRequest,
    responses(
        (status = 200, description = "Menu updated"),
        (status = 404, description = "Menu not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn update_menu(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateMenuRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .menus
        .update(
            auth_user.company_id,
            id,
            MenuUpdate {
                name: payload.name,
                description: payload.description,
                price: payload.price,
                service_kind: payload.service_kind,
                is_returnable: payload.is_returnable,
                image_url: payload.image_url,
                public_priority: payload.public_priority,
                items: payload
                    .items
                    .map(|items| items.into_iter().map(Into::into).collect()),
            },
        )
        .await?;
    Ok(success_response(detail))
}

/// Delete a menu
#[utoipa::path(
    delete,
    path = "/api/v1/menus/{id}",
    params(("id" = i32, Path, description = "Menu id")),
    responses(
        (status = 204, description = "Menu deleted"),
        (status = 409, description = "Menu appears on orders", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn delete_menu(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.menus.delete(auth_user.company_id, id).await?;
    Ok(no_content_response())
}

/// Whether the kitchen can currently produce a number of servings
#[utoipa::path(
    get,
    path = "/api/v1/menus/{id}/stock-check",
    params(
        ("id" = i32, Path, description = "Menu id"),
        StockCheckQuery,
    ),
    responses((status = 200, description = "Stock check result")),
    security(("Bearer" = [])),
    tag = "menus"
)]
pub async fn stock_check(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Query(query): Query<StockCheckQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    if query.servings < 1 {
        return Err(ServiceError::InvalidInput(
            "Servings must be at least 1".to_string(),
        ));
    }
    let sufficient = state
        .services
        .menus
        .has_sufficient_stock(auth_user.company_id, id, query.servings)
        .await?;
    Ok(success_response(serde_json::json!({
        "menu_id": id,
        "servings": query.servings,
        "has_sufficient_stock": sufficient,
    })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/menus", get(list_menus).post(create_menu))
        .route(
            "/menus/:id",
            get(get_menu).patch(update_menu).delete(delete_menu),
        )
        .route("/menus/:id/stock-check", get(stock_check))
}
