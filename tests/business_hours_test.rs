//! Weekly opening hours and their exposure on the restaurant card.

mod common;

use assert_matches::assert_matches;

use brigade_api::auth::AuthService;
use brigade_api::errors::ServiceError;
use brigade_api::services::companies::{BusinessHourInput, CompanyService};
use brigade_api::services::menus::MenuService;

use common::*;

fn company_service(ctx: &TestContext) -> CompanyService {
    CompanyService::new(
        ctx.db.clone(),
        AuthService::new("integration-test-secret", "brigade-api", 3600),
    )
}

fn range(day: i32, opens: &str, closes: &str, overnight: bool) -> BusinessHourInput {
    BusinessHourInput {
        day_of_week: day,
        opens_at: opens.to_string(),
        closes_at: closes.to_string(),
        is_overnight: overnight,
    }
}

#[tokio::test]
async fn replace_persists_hours_ordered_by_day_and_sequence() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    // Submitted out of order on purpose.
    let hours = companies
        .replace_business_hours(
            company.id,
            vec![
                range(2, "18:00", "23:00", false),
                range(1, "18:00", "23:00", false),
                range(1, "11:30", "14:00", false),
            ],
        )
        .await
        .unwrap();

    let summary: Vec<(i32, &str, i32)> = hours
        .iter()
        .map(|h| (h.day_of_week, h.opens_at.as_str(), h.sequence))
        .collect();
    assert_eq!(
        summary,
        vec![(1, "11:30", 1), (1, "18:00", 2), (2, "18:00", 1)]
    );
}

#[tokio::test]
async fn replace_discards_previous_schedule() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    companies
        .replace_business_hours(company.id, vec![range(1, "09:00", "17:00", false)])
        .await
        .unwrap();
    let hours = companies
        .replace_business_hours(company.id, vec![range(6, "10:00", "16:00", false)])
        .await
        .unwrap();

    assert_eq!(hours.len(), 1);
    assert_eq!(hours[0].day_of_week, 6);
    assert_eq!(companies.business_hours(company.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_times_are_rejected() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    let err = companies
        .replace_business_hours(company.id, vec![range(1, "25:00", "26:00", false)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = companies
        .replace_business_hours(company.id, vec![range(1, "9am", "5pm", false)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn close_before_open_needs_the_overnight_flag() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    let err = companies
        .replace_business_hours(company.id, vec![range(5, "18:00", "02:00", false)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let hours = companies
        .replace_business_hours(company.id, vec![range(5, "18:00", "02:00", true)])
        .await
        .unwrap();
    assert!(hours[0].is_overnight);
}

#[tokio::test]
async fn overlapping_ranges_are_rejected() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    let err = companies
        .replace_business_hours(
            company.id,
            vec![
                range(3, "11:00", "15:00", false),
                range(3, "14:00", "22:00", false),
            ],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Sunday night service wrapping into Monday collides with Monday dawn.
    let err = companies
        .replace_business_hours(
            company.id,
            vec![
                range(7, "20:00", "03:00", true),
                range(1, "02:00", "06:00", false),
            ],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    // Nothing was persisted by the failed attempts.
    assert!(companies.business_hours(company.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn restaurant_card_lists_the_schedule() {
    let ctx = setup().await;
    let company = seed_company(&ctx.db, "osteria").await;
    let companies = company_service(&ctx);

    companies
        .replace_business_hours(
            company.id,
            vec![
                range(6, "18:00", "01:00", true),
                range(1, "11:30", "14:00", false),
            ],
        )
        .await
        .unwrap();

    let menus = MenuService::new(ctx.db.clone());
    let card = menus.restaurant_card("osteria").await.unwrap();

    assert_eq!(card.business_hours.len(), 2);
    assert_eq!(card.business_hours[0].day_of_week, 1);
    assert_eq!(card.business_hours[0].opens_at, "11:30");
    assert_eq!(card.business_hours[1].day_of_week, 6);
    assert!(card.business_hours[1].is_overnight);
}

#[tokio::test]
async fn unknown_company_is_not_found() {
    let ctx = setup().await;
    let companies = company_service(&ctx);
    let err = companies
        .replace_business_hours(999, vec![range(1, "09:00", "17:00", false)])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
