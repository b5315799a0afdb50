//! Shared fixtures for the integration tests.
//!
//! Every test gets its own in-memory SQLite database with the full schema
//! applied. The pool is pinned to a single connection because each SQLite
//! `:memory:` connection is its own database.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use sea_orm_migration::MigratorTrait;

use brigade_api::db::DbPool;
use brigade_api::entities::sea_orm_active_enums::{
    Allergens, MeasurementUnit, MenuServiceKind, PreparationKind, StockableKind,
};
use brigade_api::entities::{
    category, category_location_type, company, dining_table, ingredient, ingredient_location,
    location, location_type, menu, menu_item, perishable, preparation, preparation_component,
    preparation_location, user,
};
use brigade_api::events::{process_events, EventSender};
use brigade_api::migrator::Migrator;

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub events: EventSender,
}

pub async fn setup() -> TestContext {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations");

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    tokio::spawn(process_events(rx));

    TestContext {
        db: Arc::new(db),
        events: EventSender::new(tx),
    }
}

pub async fn seed_company(db: &DbPool, slug: &str) -> company::Model {
    let now = Utc::now();
    company::ActiveModel {
        name: Set(format!("Company {}", slug)),
        public_menu_card_url: Set(slug.to_string()),
        show_menu_images: Set(true),
        show_out_of_stock_menus_on_card: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed company")
}

pub async fn seed_user(db: &DbPool, company_id: i32) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        company_id: Set(company_id),
        name: Set("Chef".to_string()),
        email: Set(format!("chef{}@example.test", company_id)),
        password_hash: Set("not-a-real-hash".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub async fn seed_location_type(db: &DbPool, company_id: i32, name: &str) -> location_type::Model {
    let now = Utc::now();
    location_type::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed location type")
}

pub async fn seed_location(
    db: &DbPool,
    company_id: i32,
    location_type_id: i32,
    name: &str,
) -> location::Model {
    let now = Utc::now();
    location::ActiveModel {
        company_id: Set(company_id),
        location_type_id: Set(location_type_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed location")
}

pub async fn seed_category(db: &DbPool, company_id: i32, name: &str) -> category::Model {
    let now = Utc::now();
    category::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed category")
}

pub async fn seed_shelf_life(
    db: &DbPool,
    category_id: i32,
    location_type_id: i32,
    hours: i32,
) -> category_location_type::Model {
    let now = Utc::now();
    category_location_type::ActiveModel {
        category_id: Set(category_id),
        location_type_id: Set(location_type_id),
        shelf_life_hours: Set(hours),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed shelf-life rule")
}

pub async fn seed_ingredient(
    db: &DbPool,
    company_id: i32,
    name: &str,
    unit: MeasurementUnit,
    category_id: Option<i32>,
) -> ingredient::Model {
    let now = Utc::now();
    ingredient::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        unit: Set(unit),
        category_id: Set(category_id),
        threshold: Set(None),
        barcode: Set(None),
        image_url: Set(None),
        allergens: Set(Allergens::default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed ingredient")
}

/// Writes an ingredient stock pivot directly, bypassing the stock service.
pub async fn set_ingredient_stock(
    db: &DbPool,
    ingredient_id: i32,
    location_id: i32,
    quantity: Decimal,
) -> ingredient_location::Model {
    let now = Utc::now();
    ingredient_location::ActiveModel {
        ingredient_id: Set(ingredient_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed stock pivot")
}

/// Opens a perishable batch with a controlled creation time, so tests can
/// backdate batches past their shelf life.
pub async fn seed_batch(
    db: &DbPool,
    company_id: i32,
    ingredient_id: i32,
    location_id: i32,
    quantity: Decimal,
    created_at: DateTime<Utc>,
) -> perishable::Model {
    perishable::ActiveModel {
        company_id: Set(company_id),
        ingredient_id: Set(ingredient_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        is_read: Set(false),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed perishable batch")
}

pub async fn seed_preparation(
    db: &DbPool,
    company_id: i32,
    name: &str,
    unit: MeasurementUnit,
) -> preparation::Model {
    let now = Utc::now();
    preparation::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        unit: Set(unit),
        kind: Set(PreparationKind::Simple),
        image_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed preparation")
}

/// Adds a recipe line: `quantity` of the component per unit produced.
pub async fn seed_component(
    db: &DbPool,
    preparation_id: i32,
    component_kind: StockableKind,
    component_id: i32,
    quantity: Decimal,
    unit: MeasurementUnit,
) -> preparation_component::Model {
    let now = Utc::now();
    preparation_component::ActiveModel {
        preparation_id: Set(preparation_id),
        component_kind: Set(component_kind),
        component_id: Set(component_id),
        quantity: Set(quantity),
        unit: Set(unit),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed preparation component")
}

pub async fn set_preparation_stock(
    db: &DbPool,
    preparation_id: i32,
    location_id: i32,
    quantity: Decimal,
) -> preparation_location::Model {
    let now = Utc::now();
    preparation_location::ActiveModel {
        preparation_id: Set(preparation_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed preparation stock pivot")
}

pub async fn seed_dining_table(db: &DbPool, company_id: i32, name: &str) -> dining_table::Model {
    let now = Utc::now();
    dining_table::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed dining table")
}

pub async fn seed_menu(
    db: &DbPool,
    company_id: i32,
    name: &str,
    service_kind: MenuServiceKind,
    is_returnable: bool,
    price: Decimal,
) -> menu::Model {
    let now = Utc::now();
    menu::ActiveModel {
        company_id: Set(company_id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(price),
        service_kind: Set(service_kind),
        is_returnable: Set(is_returnable),
        image_url: Set(None),
        public_priority: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed menu")
}

pub async fn seed_menu_item(
    db: &DbPool,
    menu_id: i32,
    stockable_kind: StockableKind,
    stockable_id: i32,
    location_id: i32,
    quantity: Decimal,
    unit: MeasurementUnit,
) -> menu_item::Model {
    let now = Utc::now();
    menu_item::ActiveModel {
        menu_id: Set(menu_id),
        stockable_kind: Set(stockable_kind),
        stockable_id: Set(stockable_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        unit: Set(unit),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed menu item")
}
