//! Brigade API Library
//!
//! Back-of-house backend for restaurants: inventory and perishable
//! tracking, loss accounting, unit conversion, and the order workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod graphql;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod request_id;
pub mod services;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use sea_orm::DatabaseConnection;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub auth: auth::AuthService,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub schema: graphql::ApiSchema,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: Arc<config::AppConfig>,
        event_sender: events::EventSender,
    ) -> Result<Self, errors::ServiceError> {
        let auth = auth::AuthService::from_config(&config);
        let services =
            handlers::AppServices::new(db.clone(), event_sender.clone(), auth.clone(), &config)?;
        Ok(Self {
            db,
            config,
            auth,
            event_sender,
            services,
            schema: graphql::build_schema(),
        })
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<T>, errors::ServiceError>;

/// All `/api/v1` routes. Everything except registration and login sits
/// behind the JWT middleware; truly public surfaces (restaurant card,
/// signed images, health) live at the root in [`app_router`].
pub fn api_v1_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(handlers::auth::routes())
        .merge(handlers::ingredients::routes())
        .merge(handlers::preparations::routes())
        .merge(handlers::categories::routes())
        .merge(handlers::locations::routes())
        .merge(handlers::menus::routes())
        .merge(handlers::dining_tables::routes())
        .merge(handlers::orders::routes())
        .merge(handlers::stock::routes())
        .merge(handlers::stock_movements::routes())
        .merge(handlers::losses::routes())
        .merge(handlers::perishables::routes())
        .merge(handlers::images::routes())
        .merge(handlers::graphql::routes())
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth));

    Router::new()
        .route("/status", get(handlers::health::status))
        .merge(handlers::auth::public_routes())
        .merge(protected)
}

/// The whole application router, minus global layers (trace, CORS,
/// request ids) which the binary stacks on top.
pub fn app_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::health::routes())
        .merge(handlers::restaurant_card::public_routes())
        .merge(handlers::images::public_routes())
        .nest("/api/v1", api_v1_routes(state))
}
