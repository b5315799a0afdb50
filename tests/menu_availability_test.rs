//! Menu stock checks and the public restaurant card.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, IntoActiveModel};

use brigade_api::entities::{company, ingredient};
use brigade_api::entities::sea_orm_active_enums::{
    Allergen, Allergens, MeasurementUnit, MenuServiceKind, StockableKind,
};
use brigade_api::errors::ServiceError;
use brigade_api::services::menus::MenuService;

use common::*;

#[tokio::test]
async fn stock_check_scales_with_servings() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let beef = seed_ingredient(&ctx.db, company.id, "Beef", MeasurementUnit::Kilogram, None).await;
    set_ingredient_stock(&ctx.db, beef.id, loc.id, dec!(0.5)).await;

    let stew = seed_menu(&ctx.db, company.id, "Stew", MenuServiceKind::Prep, false, dec!(14)).await;
    // 200 g per serving against 500 g on hand.
    seed_menu_item(
        &ctx.db,
        stew.id,
        StockableKind::Ingredient,
        beef.id,
        loc.id,
        dec!(200),
        MeasurementUnit::Gram,
    )
    .await;

    let menus = MenuService::new(ctx.db.clone());
    assert!(menus.has_sufficient_stock(company.id, stew.id, 2).await.unwrap());
    assert!(!menus.has_sufficient_stock(company.id, stew.id, 3).await.unwrap());

    let err = menus
        .has_sufficient_stock(company.id, stew.id, 0)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn menu_without_recipe_is_always_available() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "bistro").await;
    let soda = seed_menu(&ctx.db, company.id, "Soda", MenuServiceKind::Direct, true, dec!(3)).await;

    let menus = MenuService::new(ctx.db.clone());
    assert!(menus.has_sufficient_stock(company.id, soda.id, 10).await.unwrap());
}

#[tokio::test]
async fn restaurant_card_flags_availability_per_menu() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let beef = seed_ingredient(&ctx.db, company.id, "Beef", MeasurementUnit::Gram, None).await;
    set_ingredient_stock(&ctx.db, beef.id, loc.id, dec!(100)).await;

    let stew = seed_menu(&ctx.db, company.id, "Stew", MenuServiceKind::Prep, false, dec!(14)).await;
    seed_menu_item(
        &ctx.db,
        stew.id,
        StockableKind::Ingredient,
        beef.id,
        loc.id,
        dec!(200),
        MeasurementUnit::Gram,
    )
    .await;
    seed_menu(&ctx.db, company.id, "Soda", MenuServiceKind::Direct, true, dec!(3)).await;

    let menus = MenuService::new(ctx.db.clone());
    let card = menus.restaurant_card("osteria").await.unwrap();

    assert_eq!(card.restaurant_name, company.name);
    assert_eq!(card.menus.len(), 2);
    let stew_entry = card.menus.iter().find(|m| m.name == "Stew").unwrap();
    let soda_entry = card.menus.iter().find(|m| m.name == "Soda").unwrap();
    assert!(!stew_entry.has_sufficient_stock);
    assert!(soda_entry.has_sufficient_stock);

    // Turning off the company toggle hides the out-of-stock stew entirely.
    let mut active: company::ActiveModel = company.into();
    active.show_out_of_stock_menus_on_card = Set(false);
    active.update(&*ctx.db).await.unwrap();

    let filtered = menus.restaurant_card("osteria").await.unwrap();
    assert_eq!(filtered.menus.len(), 1);
    assert_eq!(filtered.menus[0].name, "Soda");
}

#[tokio::test]
async fn restaurant_card_hides_images_when_disabled() {
    let ctx = setup().await;
    let seeded = seed_company(&ctx.db, "osteria").await;
    let mut active: company::ActiveModel = seeded.clone().into();
    active.show_menu_images = Set(false);
    active.update(&*ctx.db).await.unwrap();

    let mut menu = seed_menu(&ctx.db, seeded.id, "Soda", MenuServiceKind::Direct, true, dec!(3))
        .await
        .into_active_model();
    menu.image_url = Set(Some("menus/soda.jpg".to_string()));
    menu.update(&*ctx.db).await.unwrap();

    let menus = MenuService::new(ctx.db.clone());
    let card = menus.restaurant_card("osteria").await.unwrap();
    assert_eq!(card.menus[0].image_url, None);
}

#[tokio::test]
async fn card_aggregates_allergens_from_ingredients() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;

    let flour = seed_ingredient(&ctx.db, company.id, "Flour", MeasurementUnit::Gram, None).await;
    let mut active = flour.clone().into_active_model();
    active.allergens = Set(Allergens(vec![Allergen::Gluten]));
    active.update(&*ctx.db).await.unwrap();

    let cream = seed_ingredient(&ctx.db, company.id, "Cream", MeasurementUnit::Millilitre, None).await;
    let mut active: ingredient::ActiveModel = cream.clone().into();
    active.allergens = Set(Allergens(vec![Allergen::Milk, Allergen::Gluten]));
    active.update(&*ctx.db).await.unwrap();

    let tart = seed_menu(&ctx.db, company.id, "Tart", MenuServiceKind::Prep, false, dec!(8)).await;
    seed_menu_item(
        &ctx.db,
        tart.id,
        StockableKind::Ingredient,
        flour.id,
        loc.id,
        dec!(100),
        MeasurementUnit::Gram,
    )
    .await;
    seed_menu_item(
        &ctx.db,
        tart.id,
        StockableKind::Ingredient,
        cream.id,
        loc.id,
        dec!(50),
        MeasurementUnit::Millilitre,
    )
    .await;
    seed_menu(&ctx.db, company.id, "Soda", MenuServiceKind::Direct, true, dec!(3)).await;

    let menus = MenuService::new(ctx.db.clone());
    let card = menus.restaurant_card("osteria").await.unwrap();

    let tart_entry = card.menus.iter().find(|m| m.name == "Tart").unwrap();
    assert_eq!(tart_entry.allergens, vec![Allergen::Gluten, Allergen::Milk]);
    let soda_entry = card.menus.iter().find(|m| m.name == "Soda").unwrap();
    assert!(soda_entry.allergens.is_empty());
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let ctx = setup().await;
    let menus = MenuService::new(ctx.db.clone());
    let err = menus.restaurant_card("nowhere").await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn card_orders_by_priority_then_name() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;

    let mut featured = seed_menu(&ctx.db, company.id, "Zuppa", MenuServiceKind::Prep, false, dec!(9))
        .await
        .into_active_model();
    featured.public_priority = Set(10);
    featured.update(&*ctx.db).await.unwrap();
    seed_menu(&ctx.db, company.id, "Arrosto", MenuServiceKind::Prep, false, dec!(16)).await;
    seed_menu(&ctx.db, company.id, "Brasato", MenuServiceKind::Prep, false, dec!(17)).await;

    let menus = MenuService::new(ctx.db.clone());
    let card = menus.restaurant_card("osteria").await.unwrap();
    let names: Vec<&str> = card.menus.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Zuppa", "Arrosto", "Brasato"]);
}
