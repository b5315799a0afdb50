//! Stock mutations against a real schema: pivot updates, unit conversion,
//! movement records, and the guards around them.

mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use brigade_api::entities::sea_orm_active_enums::{
    MeasurementUnit, MovementType, StockableKind,
};
use brigade_api::entities::{ingredient_location, stock_movement};
use brigade_api::errors::ServiceError;
use brigade_api::services::stock::StockService;

use common::*;

async fn pivot_quantity(
    db: &brigade_api::db::DbPool,
    ingredient_id: i32,
    location_id: i32,
) -> Option<Decimal> {
    ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.eq(ingredient_id))
        .filter(ingredient_location::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .unwrap()
        .map(|pivot| pivot.quantity)
}

async fn movements(
    db: &brigade_api::db::DbPool,
    ingredient_id: i32,
) -> Vec<stock_movement::Model> {
    stock_movement::Entity::find()
        .filter(stock_movement::Column::StockableId.eq(ingredient_id))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn add_creates_pivot_and_records_addition() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let new = stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(5),
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(new, dec!(5));
    assert_eq!(pivot_quantity(&ctx.db, flour.id, loc.id).await, Some(dec!(5)));

    let recorded = movements(&ctx.db, flour.id).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].movement_type, MovementType::Addition);
    assert_eq!(recorded[0].quantity_before, Decimal::ZERO);
    assert_eq!(recorded[0].quantity_after, dec!(5));
    assert_eq!(recorded[0].reason.as_deref(), Some("Manual Addition"));
}

#[tokio::test]
async fn add_converts_caller_unit_into_entity_unit() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let new = stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(500),
            Some(MeasurementUnit::Gram),
            None,
        )
        .await
        .unwrap();

    assert_eq!(new, dec!(0.50));
}

#[tokio::test]
async fn cross_dimension_unit_is_rejected() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let err = stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(1),
            Some(MeasurementUnit::Litre),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
    assert_eq!(pivot_quantity(&ctx.db, flour.id, loc.id).await, None);
}

#[tokio::test]
async fn remove_cannot_drive_stock_negative() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, flour.id, loc.id, dec!(2)).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let err = stock
        .remove(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(5),
            None,
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
    assert_eq!(pivot_quantity(&ctx.db, flour.id, loc.id).await, Some(dec!(2)));
    assert!(movements(&ctx.db, flour.id).await.is_empty());
}

#[tokio::test]
async fn sub_threshold_delta_skips_the_movement_record() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    // 4 grams of a kilogram-tracked ingredient rounds to 0.00 kg.
    let new = stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(4),
            Some(MeasurementUnit::Gram),
            None,
        )
        .await
        .unwrap();

    assert_eq!(new, dec!(0.00));
    assert!(movements(&ctx.db, flour.id).await.is_empty());
}

#[tokio::test]
async fn transfer_moves_quantity_and_writes_both_movements() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let pantry = seed_location(&ctx.db, company.id, lt.id, "Pantry").await;
    let fridge = seed_location(&ctx.db, company.id, lt.id, "Fridge").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, flour.id, pantry.id, dec!(10)).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    stock
        .transfer(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            pantry.id,
            fridge.id,
            dec!(4),
            None,
        )
        .await
        .unwrap();

    assert_eq!(pivot_quantity(&ctx.db, flour.id, pantry.id).await, Some(dec!(6)));
    assert_eq!(pivot_quantity(&ctx.db, flour.id, fridge.id).await, Some(dec!(4)));

    let recorded = movements(&ctx.db, flour.id).await;
    assert_eq!(recorded.len(), 2);
    assert!(recorded
        .iter()
        .all(|m| m.reason.as_deref() == Some("Moved from Pantry to Fridge")));
}

#[tokio::test]
async fn transfer_rejects_identical_locations() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, flour.id, loc.id, dec!(10)).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let err = stock
        .transfer(
            company.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            loc.id,
            dec!(1),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn foreign_company_stock_is_forbidden() {
    let ctx = setup().await;
    let ours = seed_company(&ctx.db, "ours").await;
    let theirs = seed_company(&ctx.db, "theirs").await;
    let lt = seed_location_type(&ctx.db, theirs.id, "Pantry").await;
    let loc = seed_location(&ctx.db, theirs.id, lt.id, "Their pantry").await;
    let flour = seed_ingredient(&ctx.db, theirs.id, "Flour", MeasurementUnit::Kilogram, None).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let err = stock
        .add(
            ours.id,
            None,
            StockableKind::Ingredient,
            flour.id,
            loc.id,
            dec!(1),
            None,
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn levels_reports_every_location_holding_the_entity() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let pantry = seed_location(&ctx.db, company.id, lt.id, "Pantry").await;
    let fridge = seed_location(&ctx.db, company.id, lt.id, "Fridge").await;
    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, flour.id, pantry.id, dec!(3)).await;
    set_ingredient_stock(&ctx.db, flour.id, fridge.id, dec!(1.5)).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    let mut levels = stock
        .levels(company.id, StockableKind::Ingredient, flour.id)
        .await
        .unwrap();
    levels.sort_by_key(|level| level.location_id);

    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].quantity, dec!(3));
    assert_eq!(levels[1].quantity, dec!(1.5));
}
