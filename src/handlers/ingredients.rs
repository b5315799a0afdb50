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
use crate::entities::sea_orm_active_enums::{Allergen, MeasurementUnit};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::ingredients::{IngredientUpdate, NewIngredient};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: MeasurementUnit,
    pub category_id: Option<i32>,
    pub threshold: Option<Decimal>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub allergens: Vec<Allergen>,
}

/// Double options distinguish "leave untouched" (absent) from "clear"
/// (explicit null).
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateIngredientRequest {
    pub name: Option<String>,
    pub unit: Option<MeasurementUnit>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub threshold: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::common::double_option")]
    pub image_url: Option<Option<String>>,
    /// An empty list clears the declarations; absent leaves them untouched.
    pub allergens: Option<Vec<Allergen>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsQuery {
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    pub keyword: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductSearchQuery {
    pub search: String,
    #[serde(default = "default_product_page")]
    pub page: u32,
    #[serde(default = "default_product_page_size")]
    pub page_size: u32,
}

fn default_product_page() -> u32 {
    1
}

fn default_product_page_size() -> u32 {
    20
}

/// List ingredients
#[utoipa::path(
    get,
    path = "/api/v1/ingredients",
    params(ListIngredientsQuery),
    responses(
        (status = 200, description = "Ingredients retrieved"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListIngredientsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = query.pagination.clamped(state.config.api_max_page_size);
    let (items, total) = state
        .services
        .ingredients
        .list(auth_user.company_id, query.search.as_deref(), page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Create an ingredient
#[utoipa::path(
    post,
    path = "/api/v1/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created"),
        (status = 400, description = "Invalid ingredient data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state
        .services
        .ingredients
        .create(
            auth_user.company_id,
            NewIngredient {
                name: payload.name,
                unit: payload.unit,
                category_id: payload.category_id,
                threshold: payload.threshold,
                barcode: payload.barcode,
                image_url: payload.image_url,
                allergens: payload.allergens,
            },
        )
        .await?;
    Ok(created_response(created))
}

/// Get one ingredient with its total stock
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/{id}",
    params(("id" = i32, Path, description = "Ingredient id")),
    responses(
        (status = 200, description = "Ingredient retrieved"),
        (status = 404, description = "Ingredient not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state
        .services
        .ingredients
        .get(auth_user.company_id, id)
        .await?;
    Ok(success_response(detail))
}

/// Update an ingredient
#[utoipa::path(
    patch,
    path = "/api/v1/ingredients/{id}",
    params(("id" = i32, Path, description = "Ingredient id")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated"),
        (status = 404, description = "Ingredient not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unit change with stock on hand", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .services
        .ingredients
        .update(
            auth_user.company_id,
            id,
            IngredientUpdate {
                name: payload.name,
                unit: payload.unit,
                category_id: payload.category_id,
                threshold: payload.threshold,
                barcode: payload.barcode,
                image_url: payload.image_url,
                allergens: payload.allergens,
            },
        )
        .await?;
    Ok(success_response(updated))
}

/// Delete an ingredient
#[utoipa::path(
    delete,
    path = "/api/v1/ingredients/{id}",
    params(("id" = i32, Path, description = "Ingredient id")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Ingredient still referenced by recipes", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .ingredients
        .delete(auth_user.company_id, id)
        .await?;
    Ok(no_content_response())
}

/// Ingredients whose total stock fell below their threshold
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/below-threshold",
    responses((status = 200, description = "Ingredients retrieved")),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn below_threshold(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let entries = state
        .services
        .ingredients
        .below_threshold(auth_user.company_id)
        .await?;
    Ok(success_response(entries))
}

/// Ingredients with no applicable shelf-life rule
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/non-perishable",
    responses((status = 200, description = "Ingredients retrieved")),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn non_perishable(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .services
        .ingredients
        .non_perishable(auth_user.company_id)
        .await?;
    Ok(success_response(items))
}

/// Search ingredients and preparations currently in stock
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/search",
    params(SearchQuery),
    responses((status = 200, description = "Matches retrieved")),
    security(("Bearer" = [])),
    tag = "ingredients"
)]
pub async fn search_in_stock(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let hits = state
        .services
        .ingredients
        .search_in_stock(auth_user.company_id, &query.keyword)
        .await?;
    Ok(success_response(hits))
}

/// Look a product up on Open Food Facts by barcode
#[utoipa::path(
    get,
    path = "/api/v1/products/{barcode}",
    params(("barcode" = String, Path, description = "EAN barcode")),
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Unknown barcode", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn product_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .services
        .open_food_facts
        .product_by_barcode(&barcode)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("No product for barcode {}", barcode)))?;
    Ok(success_response(product))
}

/// Free-text product search on Open Food Facts
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductSearchQuery),
    responses((status = 200, description = "Products retrieved")),
    security(("Bearer" = [])),
    tag = "products"
)]
pub async fn product_search(
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state
        .services
        .open_food_facts
        .search(&query.search, query.page, query.page_size)
        .await;
    Ok(success_response(products))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route("/ingredients/below-threshold", get(below_threshold))
        .route("/ingredients/non-perishable", get(non_perishable))
        .route("/ingredients/search", get(search_in_stock))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .patch(update_ingredient)
                .delete(delete_ingredient),
        )
        .route("/products", get(product_search))
        .route("/products/:barcode", get(product_by_barcode))
}
