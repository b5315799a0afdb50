use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::common::{created_response, no_content_response, success_response};
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLocationRequest {
    pub name: String,
    pub location_type_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub location_type_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    pub name: String,
}

/// List storage locations
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses((status = 200, description = "Locations retrieved")),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let locations = state.services.locations.list(auth_user.company_id).await?;
    Ok(success_response(locations))
}

/// Create a storage location
#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created"),
        (status = 404, description = "Location type not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state
        .services
        .locations
        .create(auth_user.company_id, payload.location_type_id, payload.name)
        .await?;
    Ok(created_response(location))
}

/// Get one location
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = i32, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location retrieved"),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state
        .services
        .locations
        .get(auth_user.company_id, id)
        .await?;
    Ok(success_response(location))
}

/// Update a location's name or type
#[utoipa::path(
    patch,
    path = "/api/v1/locations/{id}",
    params(("id" = i32, Path, description = "Location id")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated"),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state
        .services
        .locations
        .update(
            auth_user.company_id,
            id,
            payload.name,
            payload.location_type_id,
        )
        .await?;
    Ok(success_response(location))
}

/// Delete a location
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = i32, Path, description = "Location id")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 409, description = "Location still holds stock or recipes", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .locations
        .delete(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

/// List location types
#[utoipa::path(
    get,
    path = "/api/v1/location-types",
    responses((status = 200, description = "Location types retrieved")),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn list_location_types(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let types = state
        .services
        .locations
        .list_types(auth_user.company_id)
        .await?;
    Ok(success_response(types))
}

/// Create a location type
#[utoipa::path(
    post,
    path = "/api/v1/location-types",
    request_body = NameRequest,
    responses((status = 201, description = "Location type created")),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn create_location_type(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .locations
        .create_type(auth_user.company_id, payload.name)
        .await?;
    Ok(created_response(created))
}

/// Rename a location type
#[utoipa::path(
    patch,
    path = "/api/v1/location-types/{id}",
    params(("id" = i32, Path, description = "Location type id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Location type renamed"),
        (status = 404, description = "Location type not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn rename_location_type(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let renamed = state
        .services
        .locations
        .rename_type(auth_user.company_id, id, payload.name)
        .await?;
    Ok(success_response(renamed))
}

/// Delete a location type
#[utoipa::path(
    delete,
    path = "/api/v1/location-types/{id}",
    params(("id" = i32, Path, description = "Location type id")),
    responses(
        (status = 204, description = "Location type deleted"),
        (status = 409, description = "Location type still in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "locations"
)]
pub async fn delete_location_type(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .locations
        .delete_type(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/:id",
            get(get_location)
                .patch(update_location)
                .delete(delete_location),
        )
        .route(
            "/location-types",
            get(list_location_types).post(create_location_type),
        )
        .route(
            "/location-types/:id",
            axum::routing::patch(rename_location_type).delete(delete_location_type),
        )
}
