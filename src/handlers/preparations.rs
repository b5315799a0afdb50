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
use crate::entities::sea_orm_active_enums::{MeasurementUnit, PreparationKind, StockableKind};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::preparations::{NewComponent, NewPreparation, PreparationUpdate};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComponentRequest {
    pub component_kind: StockableKind,
    pub component_id: i32,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
}

impl From<ComponentRequest> for NewComponent {
    fn from(req: ComponentRequest) -> Self {
        Self {
            component_kind: req.component_kind,
            component_id: req.component_id,
            quantity: req.quantity,
            unit: req.unit,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePreparationRequest {
    pub name: String,
    pub unit: MeasurementUnit,
    pub kind: PreparationKind,
    pub image_url: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreparationRequest {
    pub name: Option<String>,
    pub kind: Option<PreparationKind>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub image_url: Option<Option<String>>,
    pub components: Option<Vec<ComponentRequest>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProduceRequest {
    pub location_id: i32,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPreparationsQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List preparations
#[utoipa::path(
    get,
    path = "/api/v1/preparations",
    params(ListPreparationsQuery),
    responses((status = 200, description = "Preparations retrieved")),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn list_preparations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListPreparationsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = query.pagination.clamped(state.config.api_max_page_size);
    let (items, total) = state
        .services
        .preparations
        .list(auth_user.company_id, query.search.as_deref(), page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Create a preparation with its recipe
#[utoipa::path(
    post,
    path = "/api/v1/preparations",
    request_body = CreatePreparationRequest,
    responses(
        (status = 201, description = "Preparation created"),
        (status = 400, description = "Invalid recipe", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn create_preparation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreatePreparationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .preparations
        .create(
            auth_user.company_id,
            NewPreparation {
                name: payload.name,
                unit: payload.unit,
                kind: payload.kind,
                image_url: payload.image_url,
                components: payload.components.into_iter().map(Into::into).collect(),
            },
        )
        .await?;
    Ok(created_response(detail))
}

/// Get one preparation with its recipe
#[utoipa::path(
    get,
    path = "/api/v1/preparations/{id}",
    params(("id" = i32, Path, description = "Preparation id")),
    responses(
        (status = 200, description = "Preparation retrieved"),
        (status = 404, description = "Preparation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn get_preparation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .preparations
        .get(auth_user.company_id, id)
        .await?;
    Ok(success_response(detail))
}

/// Update a preparation
#[utoipa::path(
    patch,
    path = "/api/v1/preparations/{id}",
    params(("id" = i32, Path, description = "Preparation id")),
    request_body = UpdatePreparationRequest,
    responses(
        (status = 200, description = "Preparation updated"),
        (status = 404, description = "Preparation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn update_preparation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePreparationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .preparations
        .update(
            auth_user.company_id,
            id,
            PreparationUpdate {
                name: payload.name,
                kind: payload.kind,
                image_url: payload.image_url,
                components: payload
                    .components
                    .map(|items| items.into_iter().map(Into::into).collect()),
            },
        )
        .await?;
    Ok(success_response(detail))
}

/// Delete a preparation
#[utoipa::path(
    delete,
    path = "/api/v1/preparations/{id}",
    params(("id" = i32, Path, description = "Preparation id")),
    responses(
        (status = 204, description = "Preparation deleted"),
        (status = 409, description = "Preparation still referenced", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn delete_preparation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .preparations
        .delete(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

/// Produce a quantity of a preparation at a location
#[utoipa::path(
    post,
    path = "/api/v1/preparations/{id}/prepare",
    params(("id" = i32, Path, description = "Preparation id")),
    request_body = ProduceRequest,
    responses(
        (status = 200, description = "Production recorded"),
        (status = 422, description = "Insufficient component stock", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "preparations"
)]
pub async fn produce(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ProduceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .preparations
        .prepare(
            auth_user.company_id,
            Some(auth_user.user_id),
            id,
            payload.location_id,
            payload.quantity,
        )
        .await?;
    Ok(success_response(outcome))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/preparations",
            get(list_preparations).post(create_preparation),
        )
        .route(
            "/preparations/:id",
            get(get_preparation)
                .patch(update_preparation)
                .delete(delete_preparation),
        )
        .route("/preparations/:id/prepare", post(produce))
}
