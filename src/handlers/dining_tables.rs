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
pub struct NameRequest {
    pub name: String,
}

/// List dining tables
#[utoipa::path(
    get,
    path = "/api/v1/dining-tables",
    responses((status = 200, description = "Tables retrieved")),
    security(("Bearer" = [])),
    tag = "dining-tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let tables = state
        .services
        .dining_tables
        .list(auth_user.company_id)
        .await?;
    Ok(success_response(tables))
}

/// Create a dining table
#[utoipa::path(
    post,
    path = "/api/v1/dining-tables",
    request_body = NameRequest,
    responses((status = 201, description = "Table created")),
    security(("Bearer" = [])),
    tag = "dining-tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .dining_tables
        .create(auth_user.company_id, payload.name)
        .await?;
    Ok(created_response(created))
}

/// Get one dining table
#[utoipa::path(
    get,
    path = "/api/v1/dining-tables/{id}",
    params(("id" = i32, Path, description = "Table id")),
    responses(
        (status = 200, description = "Table retrieved"),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dining-tables"
)]
pub async fn get_table(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let table = state
        .services
        .dining_tables
        .get(auth_user.company_id, id)
        .await?;
    Ok(success_response(table))
}

/// Rename a dining table
#[utoipa::path(
    patch,
    path = "/api/v1/dining-tables/{id}",
    params(("id" = i32, Path, description = "Table id")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Table renamed"),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dining-tables"
)]
pub async fn rename_table(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let renamed = state
        .services
        .dining_tables
        .rename(auth_user.company_id, id, payload.name)
        .await?;
    Ok(success_response(renamed))
}

/// Delete a dining table
#[utoipa::path(
    delete,
    path = "/api/v1/dining-tables/{id}",
    params(("id" = i32, Path, description = "Table id")),
    responses(
        (status = 204, description = "Table deleted"),
        (status = 409, description = "An order is still open on this table", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "dining-tables"
)]
pub async fn delete_table(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .dining_tables
        .delete(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dining-tables", get(list_tables).post(create_table))
        .route(
            "/dining-tables/:id",
            get(get_table).patch(rename_table).delete(delete_table),
        )
}
