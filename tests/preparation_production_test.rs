//! Producing preparations: component withdrawal, unit conversion, and the
//! all-or-nothing stock guard.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use brigade_api::db::DbPool;
use brigade_api::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use brigade_api::entities::{ingredient_location, preparation_location, stock_movement};
use brigade_api::errors::ServiceError;
use brigade_api::services::preparations::PreparationService;

use common::*;

async fn ingredient_stock(db: &DbPool, ingredient_id: i32, location_id: i32) -> rust_decimal::Decimal {
    ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.eq(ingredient_id))
        .filter(ingredient_location::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

async fn preparation_stock(db: &DbPool, preparation_id: i32, location_id: i32) -> rust_decimal::Decimal {
    preparation_location::Entity::find()
        .filter(preparation_location::Column::PreparationId.eq(preparation_id))
        .filter(preparation_location::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .unwrap()
        .map(|pivot| pivot.quantity)
        .unwrap_or_default()
}

#[tokio::test]
async fn production_consumes_components_and_credits_the_output() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let tomato = seed_ingredient(&ctx.db, company.id, "Tomato", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, tomato.id, loc.id, dec!(5)).await;

    let sauce = seed_preparation(&ctx.db, company.id, "Tomato sauce", MeasurementUnit::Litre).await;
    // 800 g of tomato per litre of sauce.
    seed_component(
        &ctx.db,
        sauce.id,
        StockableKind::Ingredient,
        tomato.id,
        dec!(800),
        MeasurementUnit::Gram,
    )
    .await;

    let service = PreparationService::new(ctx.db.clone(), ctx.events.clone());
    let outcome = service
        .prepare(company.id, None, sauce.id, loc.id, dec!(2))
        .await
        .unwrap();

    assert_eq!(outcome.produced_quantity, dec!(2));
    assert_eq!(outcome.new_stock_at_location, dec!(2));
    // 1.6 kg of tomato consumed.
    assert_eq!(ingredient_stock(&ctx.db, tomato.id, loc.id).await, dec!(3.40));
    assert_eq!(preparation_stock(&ctx.db, sauce.id, loc.id).await, dec!(2));

    let movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::Reason.eq("Preparation"))
        .all(&*ctx.db)
        .await
        .unwrap();
    // One withdrawal for the component, one addition for the output.
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn understocked_component_aborts_the_whole_run() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let tomato = seed_ingredient(&ctx.db, company.id, "Tomato", MeasurementUnit::Kilogram, None).await;
    let basil = seed_ingredient(&ctx.db, company.id, "Basil", MeasurementUnit::Gram, None).await;
    set_ingredient_stock(&ctx.db, tomato.id, loc.id, dec!(5)).await;
    set_ingredient_stock(&ctx.db, basil.id, loc.id, dec!(10)).await;

    let sauce = seed_preparation(&ctx.db, company.id, "Tomato sauce", MeasurementUnit::Litre).await;
    seed_component(
        &ctx.db,
        sauce.id,
        StockableKind::Ingredient,
        tomato.id,
        dec!(0.8),
        MeasurementUnit::Kilogram,
    )
    .await;
    seed_component(
        &ctx.db,
        sauce.id,
        StockableKind::Ingredient,
        basil.id,
        dec!(20),
        MeasurementUnit::Gram,
    )
    .await;

    let service = PreparationService::new(ctx.db.clone(), ctx.events.clone());
    let err = service
        .prepare(company.id, None, sauce.id, loc.id, dec!(1))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(_));
    // The tomato withdrawal was rolled back with the transaction.
    assert_eq!(ingredient_stock(&ctx.db, tomato.id, loc.id).await, dec!(5));
    assert_eq!(ingredient_stock(&ctx.db, basil.id, loc.id).await, dec!(10));
    assert_eq!(preparation_stock(&ctx.db, sauce.id, loc.id).await, dec!(0));
}

#[tokio::test]
async fn preparation_without_recipe_cannot_be_produced() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let sauce = seed_preparation(&ctx.db, company.id, "Tomato sauce", MeasurementUnit::Litre).await;

    let service = PreparationService::new(ctx.db.clone(), ctx.events.clone());
    let err = service
        .prepare(company.id, None, sauce.id, loc.id, dec!(1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn production_quantity_must_be_positive() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let sauce = seed_preparation(&ctx.db, company.id, "Tomato sauce", MeasurementUnit::Litre).await;

    let service = PreparationService::new(ctx.db.clone(), ctx.events.clone());
    let err = service
        .prepare(company.id, None, sauce.id, loc.id, dec!(0))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn production_repeats_accumulate_output_stock() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let tomato = seed_ingredient(&ctx.db, company.id, "Tomato", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, tomato.id, loc.id, dec!(10)).await;

    let sauce = seed_preparation(&ctx.db, company.id, "Tomato sauce", MeasurementUnit::Litre).await;
    seed_component(
        &ctx.db,
        sauce.id,
        StockableKind::Ingredient,
        tomato.id,
        dec!(1),
        MeasurementUnit::Kilogram,
    )
    .await;

    let service = PreparationService::new(ctx.db.clone(), ctx.events.clone());
    service
        .prepare(company.id, None, sauce.id, loc.id, dec!(3))
        .await
        .unwrap();
    let outcome = service
        .prepare(company.id, None, sauce.id, loc.id, dec!(2))
        .await
        .unwrap();

    assert_eq!(outcome.new_stock_at_location, dec!(5));
    assert_eq!(ingredient_stock(&ctx.db, tomato.id, loc.id).await, dec!(5));
}
