use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::common::{created_response, no_content_response, success_response};
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShelfLifeRequest {
    /// Hours an ingredient of this category keeps at this location type
    pub shelf_life_hours: i32,
}

/// List ingredient categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "Categories retrieved")),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.list(auth_user.company_id).await?;
    Ok(success_response(categories))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = NameRequest,
    responses((status = 201, description = "Category created")),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .categories
        .create(auth_user.company_id, payload.name)
        .await?;
    Ok(created_response(created))
}

/// Get one category with its shelf-life rules
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category retrieved"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .categories
        .get(auth_user.company_id, id)
        .await?;
    Ok(success_response(detail))
}

/// Rename a category
#[utoipa::path(
    patch,
    path = "/api/v1/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Category renamed"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let renamed = state
        .services
        .categories
        .rename(auth_user.company_id, id, payload.name)
        .await?;
    Ok(success_response(renamed))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 409, description = "Ingredients still categorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .categories
        .delete(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

/// Set the shelf life for a (category, location type) pair
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}/shelf-life/{location_type_id}",
    params(
        ("id" = i32, Path, description = "Category id"),
        ("location_type_id" = i32, Path, description = "Location type id"),
    ),
    request_body = ShelfLifeRequest,
    responses(
        (status = 200, description = "Shelf life set"),
        (status = 400, description = "Shelf life below one hour", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn set_shelf_life(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, location_type_id)): Path<(i32, i32)>,
    Json(payload): Json<ShelfLifeRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let rule = state
        .services
        .categories
        .set_shelf_life(
            auth_user.company_id,
            id,
            location_type_id,
            payload.shelf_life_hours,
        )
        .await?;
    Ok(success_response(rule))
}

/// Remove a shelf-life rule
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}/shelf-life/{location_type_id}",
    params(
        ("id" = i32, Path, description = "Category id"),
        ("location_type_id" = i32, Path, description = "Location type id"),
    ),
    responses(
        (status = 204, description = "Rule removed"),
        (status = 404, description = "No rule for this pair", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn remove_shelf_life(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, location_type_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .categories
        .remove_shelf_life(auth_user.company_id, id, location_type_id)
        .await?;
    Ok(no_content_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(rename_category)
                .delete(delete_category),
        )
        .route(
            "/categories/:id/shelf-life/:location_type_id",
            put(set_shelf_life).delete(remove_shelf_life),
        )
}
