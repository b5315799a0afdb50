//! Order workflow: line status transitions, derived step and order
//! statuses, payment guards, and the loss side of cancellations.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use brigade_api::db::DbPool;
use brigade_api::entities::sea_orm_active_enums::{
    MeasurementUnit, MenuServiceKind, OrderStatus, StepMenuStatus, StepStatus, StockableKind,
};
use brigade_api::entities::{ingredient_location, loss, menu};
use brigade_api::errors::ServiceError;
use brigade_api::services::orders::{
    NewOrderLine, OrderService, LOSS_REASON_KITCHEN, LOSS_REASON_SERVICE,
};

use common::*;

struct Fixture {
    company_id: i32,
    user_id: i32,
    table_id: i32,
    ingredient_id: i32,
    location_id: i32,
    prep_menu: menu::Model,
    direct_menu: menu::Model,
    orders: OrderService,
}

/// One prep menu and one returnable direct menu, both consuming 100 g of
/// the same ingredient, with 1000 g on hand.
async fn fixture(ctx: &TestContext) -> Fixture {
    let company = seed_company(&ctx.db, "bistro").await;
    let user = seed_user(&ctx.db, company.id).await;
    let table = seed_dining_table(&ctx.db, company.id, "Table 1").await;
    let lt = seed_location_type(&ctx.db, company.id, "Kitchen").await;
    let loc = seed_location(&ctx.db, company.id, lt.id, "Kitchen").await;
    let beef = seed_ingredient(&ctx.db, company.id, "Beef", MeasurementUnit::Gram, None).await;
    set_ingredient_stock(&ctx.db, beef.id, loc.id, dec!(1000)).await;

    let prep_menu = seed_menu(
        &ctx.db,
        company.id,
        "Beef stew",
        MenuServiceKind::Prep,
        false,
        dec!(14.50),
    )
    .await;
    seed_menu_item(
        &ctx.db,
        prep_menu.id,
        StockableKind::Ingredient,
        beef.id,
        loc.id,
        dec!(100),
        MeasurementUnit::Gram,
    )
    .await;

    let direct_menu = seed_menu(
        &ctx.db,
        company.id,
        "Bottled soda",
        MenuServiceKind::Direct,
        true,
        dec!(3.50),
    )
    .await;
    seed_menu_item(
        &ctx.db,
        direct_menu.id,
        StockableKind::Ingredient,
        beef.id,
        loc.id,
        dec!(100),
        MeasurementUnit::Gram,
    )
    .await;

    Fixture {
        company_id: company.id,
        user_id: user.id,
        table_id: table.id,
        ingredient_id: beef.id,
        location_id: loc.id,
        prep_menu,
        direct_menu,
        orders: OrderService::new(ctx.db.clone(), ctx.events.clone()),
    }
}

fn line(menu_id: i32, quantity: i32) -> NewOrderLine {
    NewOrderLine {
        menu_id,
        quantity,
        note: None,
    }
}

async fn stock_at(db: &DbPool, ingredient_id: i32, location_id: i32) -> rust_decimal::Decimal {
    ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.eq(ingredient_id))
        .filter(ingredient_location::Column::LocationId.eq(location_id))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

async fn losses_with_reason(db: &DbPool, reason: &str) -> Vec<loss::Model> {
    loss::Entity::find()
        .filter(loss::Column::Reason.eq(reason))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn direct_lines_start_ready_prep_lines_start_in_prep() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.pending_at.is_some());

    let step = fx
        .orders
        .add_step(
            fx.company_id,
            fx.user_id,
            order.id,
            vec![line(fx.prep_menu.id, 1), line(fx.direct_menu.id, 2)],
        )
        .await
        .unwrap();

    assert_eq!(step.step.status, StepStatus::InPrep);
    let prep_line = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.prep_menu.id)
        .unwrap();
    let direct_line = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.direct_menu.id)
        .unwrap();
    assert_eq!(prep_line.line.status, StepMenuStatus::InPrep);
    assert_eq!(direct_line.line.status, StepMenuStatus::Ready);
}

#[tokio::test]
async fn ready_transition_requires_a_line_in_preparation() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;

    // The direct line is already READY.
    let err = fx
        .orders
        .mark_step_menu_ready(fx.company_id, fx.user_id, order.id, line_id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidOperation(msg)
            if msg == "Only menus in preparation can be marked as ready."
    );
}

#[tokio::test]
async fn served_transition_requires_a_ready_line() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.prep_menu.id, 1)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;

    let err = fx
        .orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, line_id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidOperation(msg)
            if msg == "Only ready menus can be marked as served."
    );
}

#[tokio::test]
async fn serving_every_line_cascades_to_step_and_order() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(
            fx.company_id,
            fx.user_id,
            order.id,
            vec![line(fx.prep_menu.id, 1), line(fx.direct_menu.id, 1)],
        )
        .await
        .unwrap();

    let prep_line_id = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.prep_menu.id)
        .unwrap()
        .line
        .id;
    let direct_line_id = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.direct_menu.id)
        .unwrap()
        .line
        .id;

    fx.orders
        .mark_step_menu_ready(fx.company_id, fx.user_id, order.id, prep_line_id)
        .await
        .unwrap();
    fx.orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, prep_line_id)
        .await
        .unwrap();
    let detail = fx
        .orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, direct_line_id)
        .await
        .unwrap();

    assert_eq!(detail.step.status, StepStatus::Served);
    assert!(detail.step.served_at.is_some());

    let order = fx.orders.get(fx.company_id, order.id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::Served);
    assert!(order.order.served_at.is_some());
    // Price: one stew plus one soda.
    assert_eq!(order.price, dec!(18.00));
}

#[tokio::test]
async fn payment_requires_every_line_served_unless_forced() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    fx.orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.prep_menu.id, 1)])
        .await
        .unwrap();

    let err = fx
        .orders
        .mark_payed(fx.company_id, fx.user_id, order.id, false)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InvalidOperation(msg)
            if msg == "All menus must be served before marking the order as payed."
    );

    let payed = fx
        .orders
        .mark_payed(fx.company_id, fx.user_id, order.id, true)
        .await
        .unwrap();
    assert_eq!(payed.status, OrderStatus::Payed);
    assert!(payed.payed_at.is_some());
}

#[tokio::test]
async fn canceling_an_uncooked_prep_line_costs_nothing() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.prep_menu.id, 2)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;

    let outcome = fx
        .orders
        .cancel_step_menu(fx.company_id, fx.user_id, order.id, line_id, None, false)
        .await
        .unwrap();

    assert_eq!(outcome.canceled_quantity, 2);
    assert_eq!(outcome.remaining_quantity, 0);
    assert!(!outcome.loss_recorded);
    assert!(loss::Entity::find().all(&*ctx.db).await.unwrap().is_empty());
    assert_eq!(
        stock_at(&ctx.db, fx.ingredient_id, fx.location_id).await,
        dec!(1000)
    );
}

#[tokio::test]
async fn canceling_a_cooked_prep_line_is_a_kitchen_loss() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.prep_menu.id, 2)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;
    fx.orders
        .mark_step_menu_ready(fx.company_id, fx.user_id, order.id, line_id)
        .await
        .unwrap();

    let outcome = fx
        .orders
        .cancel_step_menu(fx.company_id, fx.user_id, order.id, line_id, Some(1), false)
        .await
        .unwrap();

    assert_eq!(outcome.canceled_quantity, 1);
    assert_eq!(outcome.remaining_quantity, 1);
    assert!(outcome.loss_recorded);
    assert_eq!(outcome.loss_reason.as_deref(), Some(LOSS_REASON_KITCHEN));

    let recorded = losses_with_reason(&ctx.db, LOSS_REASON_KITCHEN).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].quantity, dec!(100));
    assert_eq!(
        stock_at(&ctx.db, fx.ingredient_id, fx.location_id).await,
        dec!(900)
    );
}

#[tokio::test]
async fn unopened_returnable_direct_item_comes_back_without_loss() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;
    fx.orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, line_id)
        .await
        .unwrap();

    let outcome = fx
        .orders
        .cancel_step_menu(fx.company_id, fx.user_id, order.id, line_id, None, true)
        .await
        .unwrap();

    assert!(outcome.return_accepted);
    assert!(!outcome.loss_recorded);
    assert!(loss::Entity::find().all(&*ctx.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn opened_served_direct_item_is_a_service_loss() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;
    fx.orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, line_id)
        .await
        .unwrap();

    let outcome = fx
        .orders
        .cancel_step_menu(fx.company_id, fx.user_id, order.id, line_id, None, false)
        .await
        .unwrap();

    assert!(outcome.loss_recorded);
    assert_eq!(outcome.loss_reason.as_deref(), Some(LOSS_REASON_SERVICE));
    assert!(!outcome.return_accepted);

    let recorded = losses_with_reason(&ctx.db, LOSS_REASON_SERVICE).await;
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        stock_at(&ctx.db, fx.ingredient_id, fx.location_id).await,
        dec!(900)
    );
}

#[tokio::test]
async fn order_cancellation_settles_each_line_and_is_terminal() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(
            fx.company_id,
            fx.user_id,
            order.id,
            vec![line(fx.prep_menu.id, 1), line(fx.direct_menu.id, 1)],
        )
        .await
        .unwrap();
    let prep_line_id = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.prep_menu.id)
        .unwrap()
        .line
        .id;
    let direct_line_id = step
        .lines
        .iter()
        .find(|l| l.menu.id == fx.direct_menu.id)
        .unwrap()
        .line
        .id;

    // Cook the stew, serve the soda, then cancel the whole order with the
    // soda coming back unopened.
    fx.orders
        .mark_step_menu_ready(fx.company_id, fx.user_id, order.id, prep_line_id)
        .await
        .unwrap();
    fx.orders
        .mark_step_menu_served(fx.company_id, fx.user_id, order.id, direct_line_id)
        .await
        .unwrap();

    let cancellation = fx
        .orders
        .cancel(fx.company_id, fx.user_id, order.id, vec![direct_line_id])
        .await
        .unwrap();

    assert_eq!(cancellation.loss_step_menu_ids, vec![prep_line_id]);
    assert_eq!(cancellation.return_step_menu_ids, vec![direct_line_id]);
    assert_eq!(
        losses_with_reason(&ctx.db, LOSS_REASON_KITCHEN).await.len(),
        1
    );

    let detail = fx.orders.get(fx.company_id, order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Canceled);
    assert!(detail.order.canceled_at.is_some());

    // Terminal: a new step does not resurrect the order.
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();
    assert!(!step.lines.is_empty());
    let detail = fx.orders.get(fx.company_id, order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Canceled);
}

#[tokio::test]
async fn cancel_rejects_return_ids_outside_the_order() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    fx.orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();

    let err = fx
        .orders
        .cancel(fx.company_id, fx.user_id, order.id, vec![999_999])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn cancellation_quantity_is_bounded_by_the_line() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let order = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, order.id, vec![line(fx.prep_menu.id, 2)])
        .await
        .unwrap();
    let line_id = step.lines[0].line.id;

    let err = fx
        .orders
        .cancel_step_menu(fx.company_id, fx.user_id, order.id, line_id, Some(3), false)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn stats_count_orders_per_status() {
    let ctx = setup().await;
    let fx = fixture(&ctx).await;

    let open = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    fx.orders
        .add_step(fx.company_id, fx.user_id, open.id, vec![line(fx.direct_menu.id, 1)])
        .await
        .unwrap();

    let payed = fx
        .orders
        .create(fx.company_id, fx.user_id, fx.table_id)
        .await
        .unwrap();
    let step = fx
        .orders
        .add_step(fx.company_id, fx.user_id, payed.id, vec![line(fx.direct_menu.id, 2)])
        .await
        .unwrap();
    fx.orders
        .mark_step_menu_served(fx.company_id, fx.user_id, payed.id, step.lines[0].line.id)
        .await
        .unwrap();
    fx.orders
        .mark_payed(fx.company_id, fx.user_id, payed.id, false)
        .await
        .unwrap();

    let stats = fx
        .orders
        .stats(fx.company_id, Default::default())
        .await
        .unwrap();
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.payed, 1);
    assert_eq!(stats.total, 2);
    // Two sodas on the payed order.
    assert_eq!(stats.revenue, dec!(7.00));
}
