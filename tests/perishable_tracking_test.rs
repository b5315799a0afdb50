//! Perishable batch lifecycle: batch creation on stock additions, FIFO
//! drain on removals, and the expiry sweep feeding the loss ledger.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use brigade_api::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use brigade_api::entities::{loss, perishable};
use brigade_api::services::perishables::PerishableService;
use brigade_api::services::stock::StockService;

use common::*;

async fn batches_for(
    db: &brigade_api::db::DbPool,
    ingredient_id: i32,
) -> Vec<perishable::Model> {
    perishable::Entity::find()
        .filter(perishable::Column::IngredientId.eq(ingredient_id))
        .order_by_asc(perishable::Column::CreatedAt)
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn addition_without_shelf_life_rule_opens_no_batch() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Pantry").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Main pantry").await;
    // Categorized, but no rule for (category, location type).
    let category = seed_category(&ctx.db, company.id, "Dry goods").await;
    let rice = seed_ingredient(
        &ctx.db,
        company.id,
        "Rice",
        MeasurementUnit::Kilogram,
        Some(category.id),
    )
    .await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            rice.id,
            loc.id,
            dec!(5),
            None,
            None,
        )
        .await
        .unwrap();

    assert!(batches_for(&ctx.db, rice.id).await.is_empty());
}

#[tokio::test]
async fn addition_with_shelf_life_rule_opens_a_batch() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let category = seed_category(&ctx.db, company.id, "Dairy").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 48).await;
    let milk = seed_ingredient(
        &ctx.db,
        company.id,
        "Milk",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    stock
        .add(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(6),
            None,
            None,
        )
        .await
        .unwrap();

    let batches = batches_for(&ctx.db, milk.id).await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].quantity, dec!(6));
    assert!(!batches[0].is_read);
    assert!(batches[0].deleted_at.is_none());
}

#[tokio::test]
async fn removal_drains_oldest_batch_first() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let category = seed_category(&ctx.db, company.id, "Dairy").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 48).await;
    let milk = seed_ingredient(
        &ctx.db,
        company.id,
        "Milk",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(10)).await;

    let now = Utc::now();
    let older = seed_batch(&ctx.db, company.id, milk.id, loc.id, dec!(4), now - Duration::hours(10)).await;
    let newer = seed_batch(&ctx.db, company.id, milk.id, loc.id, dec!(6), now - Duration::hours(1)).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    stock
        .remove(
            company.id,
            None,
            StockableKind::Ingredient,
            milk.id,
            loc.id,
            dec!(6),
            None,
            None,
        )
        .await
        .unwrap();

    let older = perishable::Entity::find_by_id(older.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    let newer = perishable::Entity::find_by_id(newer.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();

    // The older batch is drained to zero and soft-deleted; the remainder
    // comes out of the newer one.
    assert_eq!(older.quantity, Decimal::ZERO);
    assert!(older.deleted_at.is_some());
    assert_eq!(newer.quantity, dec!(4));
    assert!(newer.deleted_at.is_none());
}

#[tokio::test]
async fn removal_skips_batches_already_expired() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Counter").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Service counter").await;
    let category = seed_category(&ctx.db, company.id, "Fresh").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 1).await;
    let cream = seed_ingredient(
        &ctx.db,
        company.id,
        "Cream",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;
    set_ingredient_stock(&ctx.db, cream.id, loc.id, dec!(8)).await;

    let now = Utc::now();
    let expired = seed_batch(&ctx.db, company.id, cream.id, loc.id, dec!(3), now - Duration::hours(2)).await;
    let fresh = seed_batch(&ctx.db, company.id, cream.id, loc.id, dec!(5), now).await;

    let stock = StockService::new(ctx.db.clone(), ctx.events.clone());
    stock
        .remove(
            company.id,
            None,
            StockableKind::Ingredient,
            cream.id,
            loc.id,
            dec!(2),
            None,
            None,
        )
        .await
        .unwrap();

    let expired = perishable::Entity::find_by_id(expired.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    let fresh = perishable::Entity::find_by_id(fresh.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();

    // The sweep owns expired batches; the removal drains the fresh one.
    assert_eq!(expired.quantity, dec!(3));
    assert!(expired.deleted_at.is_none());
    assert_eq!(fresh.quantity, dec!(3));
}

#[tokio::test]
async fn sweep_converts_expired_batches_into_losses() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Counter").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Service counter").await;
    let category = seed_category(&ctx.db, company.id, "Fresh").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 1).await;
    let cream = seed_ingredient(
        &ctx.db,
        company.id,
        "Cream",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;
    set_ingredient_stock(&ctx.db, cream.id, loc.id, dec!(4)).await;

    let batch = seed_batch(
        &ctx.db,
        company.id,
        cream.id,
        loc.id,
        dec!(4),
        Utc::now() - Duration::hours(2),
    )
    .await;

    let sweeper = PerishableService::new(ctx.db.clone(), ctx.events.clone());
    let outcome = sweeper.sweep_expired().await.unwrap();

    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.expired, 1);
    assert_eq!(outcome.losses_recorded, 1);
    assert_eq!(outcome.failures, 0);

    let losses = loss::Entity::find()
        .filter(loss::Column::StockableId.eq(cream.id))
        .all(&*ctx.db)
        .await
        .unwrap();
    assert_eq!(losses.len(), 1);
    assert_eq!(losses[0].quantity, dec!(4));
    assert_eq!(losses[0].reason.as_deref(), Some("expired"));

    let batch = perishable::Entity::find_by_id(batch.id)
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert!(batch.deleted_at.is_some());
    assert!(!batch.is_read);
}

#[tokio::test]
async fn sweep_leaves_unexpired_batches_alone() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let category = seed_category(&ctx.db, company.id, "Dairy").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 48).await;
    let milk = seed_ingredient(
        &ctx.db,
        company.id,
        "Milk",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;
    set_ingredient_stock(&ctx.db, milk.id, loc.id, dec!(6)).await;
    seed_batch(&ctx.db, company.id, milk.id, loc.id, dec!(6), Utc::now()).await;

    let sweeper = PerishableService::new(ctx.db.clone(), ctx.events.clone());
    let outcome = sweeper.sweep_expired().await.unwrap();

    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.expired, 0);
    assert_eq!(outcome.losses_recorded, 0);

    let batches = batches_for(&ctx.db, milk.id).await;
    assert!(batches[0].deleted_at.is_none());
}

#[tokio::test]
async fn list_sorts_by_soonest_expiration() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let fridge_type = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let counter_type = seed_location_type(&ctx.db, company.id, "Counter").await;
    let fridge = seed_location(&ctx.db, company.id, fridge_type.id, "Walk-in").await;
    let counter = seed_location(&ctx.db, company.id, counter_type.id, "Counter").await;
    let category = seed_category(&ctx.db, company.id, "Dairy").await;
    seed_shelf_life(&ctx.db, category.id, fridge_type.id, 72).await;
    seed_shelf_life(&ctx.db, category.id, counter_type.id, 4).await;
    let milk = seed_ingredient(
        &ctx.db,
        company.id,
        "Milk",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;

    let now = Utc::now();
    seed_batch(&ctx.db, company.id, milk.id, fridge.id, dec!(2), now).await;
    let urgent = seed_batch(&ctx.db, company.id, milk.id, counter.id, dec!(1), now).await;

    let service = PerishableService::new(ctx.db.clone(), ctx.events.clone());
    let listed = service.list(company.id, false).await.unwrap();

    assert_eq!(listed.len(), 2);
    // The counter batch expires in 4 hours, the fridge one in 72.
    assert_eq!(listed[0].batch.id, urgent.id);
    assert!(listed[0].expires_at < listed[1].expires_at);
}

#[tokio::test]
async fn mark_read_acknowledges_a_batch() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Fridge").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Walk-in").await;
    let category = seed_category(&ctx.db, company.id, "Dairy").await;
    seed_shelf_life(&ctx.db, category.id, lt.id, 48).await;
    let milk = seed_ingredient(
        &ctx.db,
        company.id,
        "Milk",
        MeasurementUnit::Litre,
        Some(category.id),
    )
    .await;
    let batch = seed_batch(&ctx.db, company.id, milk.id, loc.id, dec!(2), Utc::now()).await;

    let service = PerishableService::new(ctx.db.clone(), ctx.events.clone());
    let updated = service.mark_read(company.id, batch.id).await.unwrap();
    assert!(updated.is_read);

    let unread = service.list(company.id, true).await.unwrap();
    assert!(unread.is_empty());
}
