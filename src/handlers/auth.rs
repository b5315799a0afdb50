use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::common::{created_response, success_response, validate_input};
use crate::auth::AuthUser;
use crate::entities::{company, company_business_hour, user};
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::companies::{BusinessHourInput, CompanySettings, Registration};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub company_name: String,
    /// Slug used for the public menu card URL
    #[validate(length(min = 1, max = 64))]
    pub public_menu_card_url: String,
    #[validate(length(min = 1))]
    pub user_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub public_menu_card_url: Option<String>,
    pub show_menu_images: Option<bool>,
    pub show_out_of_stock_menus_on_card: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BusinessHourRequest {
    /// 1 (Monday) through 7 (Sunday)
    pub day_of_week: i32,
    /// HH:MM, 24-hour clock
    pub opens_at: String,
    pub closes_at: String,
    #[serde(default)]
    pub is_overnight: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBusinessHoursRequest {
    pub business_hours: Vec<BusinessHourRequest>,
}

#[derive(Debug, Serialize)]
pub struct BusinessHourResponse {
    pub id: i32,
    pub day_of_week: i32,
    pub opens_at: String,
    pub closes_at: String,
    pub is_overnight: bool,
    pub sequence: i32,
}

impl From<company_business_hour::Model> for BusinessHourResponse {
    fn from(model: company_business_hour::Model) -> Self {
        Self {
            id: model.id,
            day_of_week: model.day_of_week,
            opens_at: model.opens_at,
            closes_at: model.closes_at,
            is_overnight: model.is_overnight,
            sequence: model.sequence,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub company_id: i32,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            company_id: model.company_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub public_menu_card_url: String,
    pub show_menu_images: bool,
    pub show_out_of_stock_menus_on_card: bool,
}

impl From<company::Model> for CompanyResponse {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            public_menu_card_url: model.public_menu_card_url,
            show_menu_images: model.show_menu_images,
            show_out_of_stock_menus_on_card: model.show_out_of_stock_menus_on_card,
        }
    }
}

/// Register a restaurant with its first user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Company and first user created"),
        (status = 400, description = "Invalid registration data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email or card URL already taken", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let (company, user, token) = state
        .services
        .companies
        .register(Registration {
            company_name: payload.company_name,
            public_menu_card_url: payload.public_menu_card_url,
            user_name: payload.user_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    info!("Registered company {} ({})", company.id, company.name);
    Ok(created_response(serde_json::json!({
        "token": token,
        "user": UserResponse::from(user),
        "company": CompanyResponse::from(company),
    })))
}

/// Exchange credentials for a JWT
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated"),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let (user, token) = state
        .services
        .companies
        .login(&payload.email, &payload.password)
        .await?;

    Ok(success_response(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// Current user and their restaurant
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let user = state.services.companies.get_user(auth_user.user_id).await?;
    let company = state.services.companies.get(auth_user.company_id).await?;

    Ok(success_response(serde_json::json!({
        "user": UserResponse::from(user),
        "company": CompanyResponse::from(company),
    })))
}

/// Update restaurant settings
#[utoipa::path(
    patch,
    path = "/api/v1/auth/company",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated"),
        (status = 400, description = "Invalid settings", body = crate::errors::ErrorResponse),
        (status = 409, description = "Card URL already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let company = state
        .services
        .companies
        .update_settings(
            auth_user.company_id,
            CompanySettings {
                name: payload.name,
                public_menu_card_url: payload.public_menu_card_url,
                show_menu_images: payload.show_menu_images,
                show_out_of_stock_menus_on_card: payload.show_out_of_stock_menus_on_card,
            },
        )
        .await?;

    Ok(success_response(CompanyResponse::from(company)))
}

/// List the restaurant's weekly opening hours
#[utoipa::path(
    get,
    path = "/api/v1/auth/company/business-hours",
    responses(
        (status = 200, description = "Business hours retrieved"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn list_business_hours(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let hours = state
        .services
        .companies
        .business_hours(auth_user.company_id)
        .await?;
    Ok(success_response(
        hours
            .into_iter()
            .map(BusinessHourResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Replace the restaurant's weekly opening hours
#[utoipa::path(
    put,
    path = "/api/v1/auth/company/business-hours",
    request_body = UpdateBusinessHoursRequest,
    responses(
        (status = 200, description = "Business hours replaced"),
        (status = 400, description = "Malformed or overlapping hours", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn update_business_hours(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<UpdateBusinessHoursRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let hours = state
        .services
        .companies
        .replace_business_hours(
            auth_user.company_id,
            payload
                .business_hours
                .into_iter()
                .map(|hour| BusinessHourInput {
                    day_of_week: hour.day_of_week,
                    opens_at: hour.opens_at,
                    closes_at: hour.closes_at,
                    is_overnight: hour.is_overnight,
                })
                .collect(),
        )
        .await?;
    Ok(success_response(
        hours
            .into_iter()
            .map(BusinessHourResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Routes that do not require a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes behind the auth middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/company", patch(update_company))
        .route(
            "/auth/company/business-hours",
            get(list_business_hours).put(update_business_hours),
        )
}
