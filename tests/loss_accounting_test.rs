//! Loss ledger: recording, the guards that abort a loss, and rollback.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use brigade_api::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use brigade_api::entities::{ingredient_location, loss, stock_movement};
use brigade_api::errors::ServiceError;
use brigade_api::services::losses::{LossFilter, LossService};

use common::*;

async fn pivot_quantity(
    db: &brigade_api::db::DbPool,
    ingredient_id: i32,
    location_id: i32,
) -> rust_decimal::Decimal {
    ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.eq(ingredient_id))
        .filter(ingredient_location::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .unwrap()
        .map(|pivot| pivot.quantity)
        .unwrap_or_default()
}

#[tokio::test]
async fn recording_a_loss_decrements_stock_and_keeps_the_row() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(10)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let recorded = losses
        .record_loss(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(3),
            Some("dropped crate".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(recorded.quantity, dec!(3));
    assert_eq!(recorded.reason.as_deref(), Some("dropped crate"));
    assert_eq!(pivot_quantity(&ctx.db, milk.id, loc.id).await, dec!(7));

    let movement = stock_movement::Entity::find()
        .filter(stock_movement::Column::StockableId.eq(milk.id))
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(movement.quantity_before, dec!(10));
    assert_eq!(movement.quantity_after, dec!(7));
    assert_eq!(movement.reason.as_deref(), Some("dropped crate"));
}

#[tokio::test]
async fn insufficient_stock_aborts_the_whole_loss() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(2)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let err = losses
        .record_loss(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(5),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InsufficientStock(_));
    assert_eq!(pivot_quantity(&ctx.db, milk.id, loc.id).await, dec!(2));
    assert_eq!(
        loss::Entity::find().all(&*ctx.db).await.unwrap().len(),
        0
    );
    assert_eq!(
        stock_movement::Entity::find().all(&*ctx.db).await.unwrap().len(),
        0
    );
}

#[tokio::test]
async fn unstocked_entity_is_an_invalid_operation() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let err = losses
        .record_loss(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(1),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidOperation(_));
}

#[tokio::test]
async fn nonpositive_quantity_is_rejected() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(2)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let err = losses
        .record_loss(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(0),
            None,
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn rollback_restores_stock_and_deletes_the_loss() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(10)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let recorded = losses
        .record_loss(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(4),
            Some("spoiled".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(pivot_quantity(&ctx.db, milk.id, loc.id).await, dec!(6));

    losses.rollback(company.id, None, recorded.id).await.unwrap();

    assert_eq!(pivot_quantity(&ctx.db, milk.id, loc.id).await, dec!(10));
    assert!(loss::Entity::find_by_id(recorded.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .is_none());

    let restoring = stock_movement::Entity::find()
        .filter(stock_movement::Column::Reason.eq("Loss Rollback"))
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restoring.quantity_before, dec!(6));
    assert_eq!(restoring.quantity_after, dec!(10));
}

#[tokio::test]
async fn rollback_is_scoped_to_the_company() {
    let ctx = setup().await;
    let ours = seed_company(&ctx.db, "ours").await;
    let theirs = seed_company(&ctx.db, "theirs").await;
    let lt = seed_location_type(&ctx.db, theirs.id, "Fridge").await;
    let loc = seed_location(&ctx.db, theirs.id, lt.id, "Their fridge").await;
    let milk = seed_ingredient(&ctx.db, theirs.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(5)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    let recorded = losses
        .record_loss(
            theirs.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(1),
            None,
        )
        .await
        .unwrap();

    let err = losses.rollback(ours.id, None, recorded.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn list_filters_by_location() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let fridge = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let pantry = seed_location(&ctx.db, company.id, lt.id, "Pantry").await;
    let milk = seed_ingredient(&ctx.db, company.id, "Milk", MeasurementUnit::Litre, None).await;
    set_ingredient_stock(&ctx.db, milk.id, fridge.id, dec!(5)).await;
    set_ingredient_stock(&ctx.db, milk.id, pantry.id, dec!(5)).await;

    let losses = LossService::new(ctx.db.clone(), ctx.events.clone());
    for loc_id in [fridge.id, pantry.id] {
        losses
            .record_loss(
                company.id,
                None,
                StockableKind::Ingredient,
                milk.id,
                loc_id,
                dec!(1),
                None,
            )
            .await
            .unwrap();
    }

    let filter = LossFilter {
        location_id: Some(fridge.id),
        ..Default::default()
    };
    let (items, total) = losses.list(company.id, filter, 1, 20).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].location_id, fridge.id);
}
