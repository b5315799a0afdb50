use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::common::{
    created_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::OrderStatus;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::orders::{NewOrderLine, OrderFilter};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub dining_table_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
}

impl From<OrderLineRequest> for NewOrderLine {
    fn from(req: OrderLineRequest) -> Self {
        Self {
            menu_id: req.menu_id,
            quantity: req.quantity,
            note: req.note,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStepRequest {
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelLineRequest {
    /// Portions to cancel; the whole line when absent
    pub quantity: Option<i32>,
    /// The item came back unopened and can go back on sale
    #[serde(default)]
    pub unopened_return: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    /// Served returnable lines that came back unopened
    #[serde(default)]
    pub unopened_return_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    /// Close the order even if some menus were never served
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub dining_table_id: Option<i32>,
    pub user_id: Option<i32>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

impl ListOrdersQuery {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            dining_table_id: self.dining_table_id,
            user_id: self.user_id,
            statuses: self.status.into_iter().collect(),
            created_after: self.created_after,
            created_before: self.created_before,
        }
    }
}

/// Open an order on a dining table
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order opened"),
        (status = 404, description = "Table not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .create(
            auth_user.company_id,
            auth_user.user_id,
            payload.dining_table_id,
        )
        .await?;
    Ok(created_response(order))
}

/// List orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(ListOrdersQuery),
    responses((status = 200, description = "Orders retrieved")),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, per_page) = query.pagination.clamped(state.config.api_max_page_size);
    let (items, total) = state
        .services
        .orders
        .list(auth_user.company_id, query.filter(), page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::new(
        items, page, per_page, total,
    )))
}

/// Counts per status plus revenue over payed orders
#[utoipa::path(
    get,
    path = "/api/v1/orders/stats",
    params(ListOrdersQuery),
    responses((status = 200, description = "Stats computed")),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn order_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state
        .services
        .orders
        .stats(auth_user.company_id, query.filter())
        .await?;
    Ok(success_response(stats))
}

/// Full order tree with steps, lines, and price
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.orders.get(auth_user.company_id, id).await?;
    Ok(success_response(detail))
}

/// Audit trail of one order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/history",
    params(("id" = i32, Path, description = "Order id")),
    responses((status = 200, description = "History retrieved")),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order_history(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let history = state
        .services
        .orders
        .order_history(auth_user.company_id, id)
        .await?;
    Ok(success_response(history))
}

/// Add a course to an order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/steps",
    params(("id" = i32, Path, description = "Order id")),
    request_body = CreateStepRequest,
    responses(
        (status = 201, description = "Step added"),
        (status = 422, description = "Order is closed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn add_step(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<CreateStepRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let step = state
        .services
        .orders
        .add_step(
            auth_user.company_id,
            auth_user.user_id,
            id,
            payload.lines.into_iter().map(Into::into).collect(),
        )
        .await?;
    Ok(created_response(step))
}

/// Add one menu line to an existing course
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/steps/{step_id}/menus",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("step_id" = i32, Path, description = "Step id"),
    ),
    request_body = OrderLineRequest,
    responses(
        (status = 201, description = "Line added"),
        (status = 404, description = "Order or step not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn add_step_menu(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, step_id)): Path<(i32, i32)>,
    Json(payload): Json<OrderLineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let step = state
        .services
        .orders
        .add_step_menu(
            auth_user.company_id,
            auth_user.user_id,
            id,
            step_id,
            payload.into(),
        )
        .await?;
    Ok(created_response(step))
}

/// Mark a line ready to serve
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/step-menus/{step_menu_id}/ready",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("step_menu_id" = i32, Path, description = "Step menu id"),
    ),
    responses(
        (status = 200, description = "Line marked ready"),
        (status = 422, description = "Line is not in preparation", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn mark_ready(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, step_menu_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    let step = state
        .services
        .orders
        .mark_step_menu_ready(auth_user.company_id, auth_user.user_id, id, step_menu_id)
        .await?;
    Ok(success_response(step))
}

/// Mark a line served to the table
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/step-menus/{step_menu_id}/served",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("step_menu_id" = i32, Path, description = "Step menu id"),
    ),
    responses(
        (status = 200, description = "Line marked served"),
        (status = 422, description = "Line is not ready", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn mark_served(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, step_menu_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ServiceError> {
    let step = state
        .services
        .orders
        .mark_step_menu_served(auth_user.company_id, auth_user.user_id, id, step_menu_id)
        .await?;
    Ok(success_response(step))
}

/// Cancel all or part of a line, settling stock consequences
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/step-menus/{step_menu_id}",
    params(
        ("id" = i32, Path, description = "Order id"),
        ("step_menu_id" = i32, Path, description = "Step menu id"),
    ),
    request_body = CancelLineRequest,
    responses(
        (status = 200, description = "Line canceled"),
        (status = 404, description = "Line not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn cancel_line(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((id, step_menu_id)): Path<(i32, i32)>,
    payload: Option<Json<CancelLineRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let payload = payload.map(|Json(p)| p).unwrap_or(CancelLineRequest {
        quantity: None,
        unopened_return: false,
    });
    let outcome = state
        .services
        .orders
        .cancel_step_menu(
            auth_user.company_id,
            auth_user.user_id,
            id,
            step_menu_id,
            payload.quantity,
            payload.unopened_return,
        )
        .await?;
    Ok(success_response(outcome))
}

/// Cancel a whole order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = i32, Path, description = "Order id")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order canceled"),
        (status = 400, description = "Return ids do not belong to this order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    payload: Option<Json<CancelOrderRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let payload = payload.map(|Json(p)| p).unwrap_or(CancelOrderRequest {
        unopened_return_ids: Vec::new(),
    });
    let breakdown = state
        .services
        .orders
        .cancel(
            auth_user.company_id,
            auth_user.user_id,
            id,
            payload.unopened_return_ids,
        )
        .await?;
    Ok(success_response(breakdown))
}

/// Close an order as payed
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/pay",
    params(("id" = i32, Path, description = "Order id")),
    request_body = PayOrderRequest,
    responses(
        (status = 200, description = "Order payed"),
        (status = 422, description = "Unserved menus remain", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    payload: Option<Json<PayOrderRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let force = payload.map(|Json(p)| p.force).unwrap_or(false);
    let order = state
        .services
        .orders
        .mark_payed(auth_user.company_id, auth_user.user_id, id, force)
        .await?;
    Ok(success_response(order))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/stats", get(order_stats))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/history", get(get_order_history))
        .route("/orders/:id/steps", post(add_step))
        .route("/orders/:id/steps/:step_id/menus", post(add_step_menu))
        .route(
            "/orders/:id/step-menus/:step_menu_id",
            axum::routing::delete(cancel_line),
        )
        .route(
            "/orders/:id/step-menus/:step_menu_id/ready",
            patch(mark_ready),
        )
        .route(
            "/orders/:id/step-menus/:step_menu_id/served",
            patch(mark_served),
        )
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/pay", post(pay_order))
}
