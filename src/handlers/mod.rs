pub mod auth;
pub mod categories;
pub mod common;
pub mod dining_tables;
pub mod graphql;
pub mod health;
pub mod images;
pub mod ingredients;
pub mod locations;
pub mod losses;
pub mod menus;
pub mod orders;
pub mod perishables;
pub mod preparations;
pub mod restaurant_card;
pub mod stock;
pub mod stock_movements;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub companies: crate::services::companies::CompanyService,
    pub ingredients: crate::services::ingredients::IngredientService,
    pub preparations: crate::services::preparations::PreparationService,
    pub categories: crate::services::categories::CategoryService,
    pub locations: crate::services::locations::LocationService,
    pub menus: crate::services::menus::MenuService,
    pub dining_tables: crate::services::dining_tables::DiningTableService,
    pub orders: crate::services::orders::OrderService,
    pub stock: crate::services::stock::StockService,
    pub stock_movements: crate::services::stock_movements::StockMovementService,
    pub losses: crate::services::losses::LossService,
    pub perishables: crate::services::perishables::PerishableService,
    pub images: crate::services::images::ImageService,
    pub open_food_facts: crate::services::open_food_facts::OpenFoodFactsClient,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        auth: AuthService,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let images = crate::services::images::ImageService::new(
            &config.image_storage_dir,
            config.image_signing_key(),
            config.image_max_bytes,
            Duration::from_secs(config.image_fetch_timeout_secs),
        )?;
        let open_food_facts = crate::services::open_food_facts::OpenFoodFactsClient::new(
            config.open_food_facts_base_url.clone(),
            Duration::from_secs(config.open_food_facts_timeout_secs),
        )?;

        Ok(Self {
            companies: crate::services::companies::CompanyService::new(db.clone(), auth),
            ingredients: crate::services::ingredients::IngredientService::new(db.clone()),
            preparations: crate::services::preparations::PreparationService::new(
                db.clone(),
                event_sender.clone(),
            ),
            categories: crate::services::categories::CategoryService::new(db.clone()),
            locations: crate::services::locations::LocationService::new(db.clone()),
            menus: crate::services::menus::MenuService::new(db.clone()),
            dining_tables: crate::services::dining_tables::DiningTableService::new(db.clone()),
            orders: crate::services::orders::OrderService::new(db.clone(), event_sender.clone()),
            stock: crate::services::stock::StockService::new(db.clone(), event_sender.clone()),
            stock_movements: crate::services::stock_movements::StockMovementService::new(
                db.clone(),
            ),
            losses: crate::services::losses::LossService::new(db.clone(), event_sender.clone()),
            perishables: crate::services::perishables::PerishableService::new(db, event_sender),
            images,
            open_food_facts,
        })
    }
}
