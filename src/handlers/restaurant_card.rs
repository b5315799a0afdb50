use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use super::common::success_response;
use crate::errors::ServiceError;
use crate::handlers::AppState;

const CARD_IMAGE_TTL: Duration = Duration::from_secs(3600);

/// Public menu card of a restaurant
#[utoipa::path(
    get,
    path = "/restaurant-card/{public_url}",
    params(
        ("public_url" = String, Path, description = "Restaurant card slug"),
    ),
    responses(
        (status = 200, description = "Card retrieved"),
        (status = 404, description = "Unknown restaurant", body = crate::errors::ErrorResponse),
    ),
    tag = "public"
)]
pub async fn restaurant_card(
    State(state): State<AppState>,
    Path(public_url): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut card = state.services.menus.restaurant_card(&public_url).await?;

    // Stored images are relative paths; turn them into signed proxy URLs.
    // Absolute URLs (hot-linked product photos) pass through untouched.
    for menu in &mut card.menus {
        if let Some(image) = menu.image_url.take() {
            menu.image_url = if image.starts_with("http://") || image.starts_with("https://") {
                Some(image)
            } else {
                state
                    .services
                    .images
                    .sign(&image, CARD_IMAGE_TTL)
                    .ok()
                    .map(|signed| {
                        format!(
                            "/public/images/{}?expires={}&token={}",
                            signed.path, signed.expires, signed.token
                        )
                    })
            };
        }
    }

    Ok(success_response(card))
}

/// Public route, no authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/restaurant-card/:public_url", get(restaurant_card))
}
