use std::time::Duration;

use axum::{
    extract::{Json, Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common::{created_response, success_response};
use crate::errors::ServiceError;
use crate::handlers::AppState;

/// How long a signed image URL stays valid.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize, ToSchema)]
pub struct FetchImageRequest {
    /// Public HTTP(S) URL to download the image from
    pub url: String,
    /// Storage folder, e.g. "menus" or "ingredients"
    pub folder: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SignQuery {
    pub path: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ServeQuery {
    pub expires: i64,
    pub token: String,
}

/// Download a remote image into storage
#[utoipa::path(
    post,
    path = "/api/v1/images",
    request_body = FetchImageRequest,
    responses(
        (status = 201, description = "Image stored"),
        (status = 400, description = "URL rejected or not an image", body = crate::errors::ErrorResponse),
        (status = 502, description = "Upstream fetch failed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "images"
)]
pub async fn fetch_image(
    State(state): State<AppState>,
    Json(payload): Json<FetchImageRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let path = state
        .services
        .images
        .store_from_url(&payload.url, &payload.folder)
        .await?;
    let signed = state.services.images.sign(&path, SIGNED_URL_TTL)?;
    Ok(created_response(signed))
}

/// Sign a stored image path for public serving
#[utoipa::path(
    get,
    path = "/api/v1/images/sign",
    params(SignQuery),
    responses(
        (status = 200, description = "Signed URL issued"),
        (status = 400, description = "Path rejected", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "images"
)]
pub async fn sign_image(
    State(state): State<AppState>,
    Query(query): Query<SignQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let signed = state.services.images.sign(&query.path, SIGNED_URL_TTL)?;
    Ok(success_response(signed))
}

/// Serve a stored image. Public, gated by the HMAC token.
#[utoipa::path(
    get,
    path = "/public/images/{path}",
    params(
        ("path" = String, Path, description = "Stored image path"),
        ServeQuery,
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 403, description = "Bad or expired token", body = crate::errors::ErrorResponse),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    tag = "images"
)]
pub async fn serve_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ServeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .images
        .verify(&path, query.expires, &query.token)?;
    let (body, mime) = state.services.images.open(&path).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, immutable".to_string(),
            ),
        ],
        body,
    ))
}

/// Routes behind the auth middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(fetch_image))
        .route("/images/sign", get(sign_image))
}

/// Public route serving signed images.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/public/images/*path", get(serve_image))
}
