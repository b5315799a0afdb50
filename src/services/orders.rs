//! Order workflow: orders, their course steps, and the menu lines inside
//! each course.
//!
//! Statuses cascade upward. A line moves IN_PREP → READY → SERVED; its step
//! and the order itself are recomputed from the level below after every
//! change (see `order_status`). Cancellations feed the loss ledger when the
//! kitchen already cooked or the guest already opened what is coming back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::{
    HistoryAction, MenuServiceKind, OrderStatus, StepMenuStatus, StepStatus,
};
use crate::entities::{dining_table, menu, menu_item, order, order_history, order_step, step_menu};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conversion::{convert, round2};
use crate::services::order_history::{self as history, transition_payload, HistoryTarget};
use crate::services::order_status::{
    derive_order_status, derive_step_status, initial_step_menu_status,
};
use crate::services::{losses, stockable};

pub const LOSS_REASON_KITCHEN: &str = "KITCHEN_LOSS";
pub const LOSS_REASON_SERVICE: &str = "SERVICE_LOSS";

/// One requested menu line when creating a step or extending one.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_id: i32,
    pub quantity: i32,
    pub note: Option<String>,
}

/// A menu line joined with its menu, for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct LineDetail {
    #[serde(flatten)]
    pub line: step_menu::Model,
    pub menu: menu::Model,
}

/// A course with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct StepDetail {
    #[serde(flatten)]
    pub step: order_step::Model,
    pub lines: Vec<LineDetail>,
}

/// Full order tree plus the computed price.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub price: Decimal,
    pub steps: Vec<StepDetail>,
}

/// What happened to a canceled line.
#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub canceled_quantity: i32,
    pub remaining_quantity: i32,
    pub loss_recorded: bool,
    pub loss_reason: Option<String>,
    pub return_accepted: bool,
}

/// Breakdown of a whole-order cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCancellation {
    pub loss_step_menu_ids: Vec<i32>,
    pub return_step_menu_ids: Vec<i32>,
}

/// Optional narrowing criteria for order listings and stats.
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub dining_table_id: Option<i32>,
    pub user_id: Option<i32>,
    pub statuses: Vec<OrderStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

/// Per-status counts plus revenue over payed orders.
#[derive(Debug, Default, Clone, Serialize)]
pub struct OrderStats {
    pub pending: u64,
    pub served: u64,
    pub payed: u64,
    pub canceled: u64,
    pub total: u64,
    pub revenue: Decimal,
}

/// How a cancellation is settled for one line.
enum CancelAction {
    /// Nothing was consumed; the line just goes away.
    Simple,
    /// Kitchen or guest consumed the goods; record losses per menu item.
    Loss(&'static str),
    /// Unopened direct-service item came back; no loss, no restock.
    Return,
}

impl CancelAction {
    fn history_reason(&self) -> Option<&'static str> {
        match self {
            Self::Simple => None,
            Self::Loss(reason) => Some(reason),
            Self::Return => Some("RETURN_ACCEPTED"),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Loss(_) => "loss",
            Self::Return => "return",
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Opens a PENDING order on a table of the company.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        company_id: i32,
        user_id: i32,
        dining_table_id: i32,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let table = dining_table::Entity::find_by_id(dining_table_id)
            .one(&txn)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Table {} not found", dining_table_id))
            })?;

        let now = Utc::now();
        let created = order::ActiveModel {
            company_id: Set(company_id),
            dining_table_id: Set(table.id),
            user_id: Set(Some(user_id)),
            status: Set(OrderStatus::Pending),
            pending_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        history::record(
            &txn,
            HistoryTarget::order(created.id),
            Some(user_id),
            HistoryAction::OrderCreated,
            None,
            Some(json!({
                "dining_table_id": created.dining_table_id,
                "status": created.status,
            })),
        )
        .await?;

        txn.commit().await?;
        self.event_sender
            .send_or_log(Event::OrderCreated(created.id))
            .await;

        info!("Created order {} on table {}", created.id, table.id);
        Ok(created)
    }

    /// Adds a new course at the next position with the given lines.
    #[instrument(skip(self, lines))]
    pub async fn add_step(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        lines: Vec<NewOrderLine>,
    ) -> Result<StepDetail, ServiceError> {
        if lines.is_empty() {
            return Err(ServiceError::InvalidInput(
                "A step needs at least one menu".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;

        let position = order_step::Entity::find()
            .filter(order_step::Column::OrderId.eq(order.id))
            .select_only()
            .column_as(order_step::Column::Position.max(), "max_position")
            .into_tuple::<Option<i32>>()
            .one(&txn)
            .await?
            .flatten()
            .unwrap_or(0)
            + 1;

        let now = Utc::now();
        let step = order_step::ActiveModel {
            order_id: Set(order.id),
            position: Set(position),
            status: Set(StepStatus::InPrep),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        history::record(
            &txn,
            HistoryTarget::step(order.id, step.id),
            Some(user_id),
            HistoryAction::OrderStepCreated,
            None,
            Some(json!({ "position": position })),
        )
        .await?;

        for line in &lines {
            insert_line(&txn, company_id, user_id, &order, &step, line).await?;
        }

        let step = refresh_step(&txn, Some(user_id), order.id, step).await?;
        let (order, status_change) = refresh_order(&txn, Some(user_id), order).await?;
        let detail = load_step_detail(&txn, step).await?;
        txn.commit().await?;

        self.notify_status_change(&order, status_change).await;
        Ok(detail)
    }

    /// Adds one line to an existing course.
    #[instrument(skip(self))]
    pub async fn add_step_menu(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        step_id: i32,
        line: NewOrderLine,
    ) -> Result<StepDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;
        let step = load_scoped_step(&txn, &order, step_id).await?;

        insert_line(&txn, company_id, user_id, &order, &step, &line).await?;

        let step = refresh_step(&txn, Some(user_id), order.id, step).await?;
        let (order, status_change) = refresh_order(&txn, Some(user_id), order).await?;
        let detail = load_step_detail(&txn, step).await?;
        txn.commit().await?;

        self.notify_status_change(&order, status_change).await;
        Ok(detail)
    }

    /// IN_PREP → READY. Anything else is rejected.
    #[instrument(skip(self))]
    pub async fn mark_step_menu_ready(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        step_menu_id: i32,
    ) -> Result<StepDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;
        let (line, step) = load_scoped_line(&txn, &order, step_menu_id).await?;

        if line.status != StepMenuStatus::InPrep {
            return Err(ServiceError::InvalidOperation(
                "Only menus in preparation can be marked as ready.".to_string(),
            ));
        }

        let previous = line.status;
        let mut active: step_menu::ActiveModel = line.into();
        active.status = Set(StepMenuStatus::Ready);
        active.updated_at = Set(Utc::now());
        let line = active.update(&txn).await?;

        history::record(
            &txn,
            HistoryTarget::line(order.id, step.id, line.id),
            Some(user_id),
            HistoryAction::StepMenuStatusUpdated,
            None,
            Some(transition_payload(&previous, &line.status)),
        )
        .await?;

        let step = refresh_step(&txn, Some(user_id), order.id, step).await?;
        let (order, status_change) = refresh_order(&txn, Some(user_id), order).await?;
        let detail = load_step_detail(&txn, step).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StepMenuStatusChanged {
                step_menu_id,
                old_status: previous.to_value(),
                new_status: StepMenuStatus::Ready.to_value(),
            })
            .await;
        self.notify_status_change(&order, status_change).await;
        Ok(detail)
    }

    /// READY → SERVED, stamping the line's `served_at`.
    #[instrument(skip(self))]
    pub async fn mark_step_menu_served(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        step_menu_id: i32,
    ) -> Result<StepDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;
        let (line, step) = load_scoped_line(&txn, &order, step_menu_id).await?;

        if line.status != StepMenuStatus::Ready {
            return Err(ServiceError::InvalidOperation(
                "Only ready menus can be marked as served.".to_string(),
            ));
        }

        let previous = line.status;
        let mut active: step_menu::ActiveModel = line.into();
        active.status = Set(StepMenuStatus::Served);
        active.served_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        let line = active.update(&txn).await?;

        history::record(
            &txn,
            HistoryTarget::line(order.id, step.id, line.id),
            Some(user_id),
            HistoryAction::StepMenuStatusUpdated,
            None,
            Some(transition_payload(&previous, &line.status)),
        )
        .await?;

        let step = refresh_step(&txn, Some(user_id), order.id, step).await?;
        let (order, status_change) = refresh_order(&txn, Some(user_id), order).await?;
        let detail = load_step_detail(&txn, step).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StepMenuStatusChanged {
                step_menu_id,
                old_status: previous.to_value(),
                new_status: StepMenuStatus::Served.to_value(),
            })
            .await;
        self.notify_status_change(&order, status_change).await;
        Ok(detail)
    }

    /// Cancels up to `quantity` portions of a line.
    ///
    /// What the cancellation costs depends on the menu's service kind and
    /// how far the line got: a PREP line still IN_PREP is free, a cooked
    /// one is a kitchen loss; a served DIRECT item is a service loss unless
    /// the menu is returnable and the item came back unopened.
    #[instrument(skip(self))]
    pub async fn cancel_step_menu(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        step_menu_id: i32,
        quantity: Option<i32>,
        unopened_return: bool,
    ) -> Result<CancellationOutcome, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;
        let (line, step) = load_scoped_line(&txn, &order, step_menu_id).await?;

        let menu = menu::Entity::find_by_id(line.menu_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidOperation(
                    "The menu associated with this step menu is invalid.".to_string(),
                )
            })?;

        let canceled = quantity.unwrap_or(line.quantity);
        if canceled < 1 || canceled > line.quantity {
            return Err(ServiceError::InvalidInput(format!(
                "Cancellation quantity must be between 1 and {}",
                line.quantity
            )));
        }

        let action = determine_cancellation_action(&line, &menu, unopened_return);
        if let CancelAction::Loss(reason) = &action {
            record_menu_losses(&txn, company_id, Some(user_id), menu.id, canceled, reason).await?;
        }

        let remaining = line.quantity - canceled;
        let mut payload = json!({
            "menu_id": line.menu_id,
            "step_menu_id": line.id,
            "quantity_before": line.quantity,
            "canceled_quantity": canceled,
            "quantity_after": remaining.max(0),
            "type": action.kind(),
        });
        if let CancelAction::Loss(reason) = &action {
            payload["loss_reason"] = json!(reason);
        }
        if matches!(action, CancelAction::Return) {
            payload["return_accepted"] = json!(true);
        }

        let outcome = CancellationOutcome {
            canceled_quantity: canceled,
            remaining_quantity: remaining.max(0),
            loss_recorded: matches!(action, CancelAction::Loss(_)),
            loss_reason: match &action {
                CancelAction::Loss(reason) => Some((*reason).to_string()),
                _ => None,
            },
            return_accepted: matches!(action, CancelAction::Return),
        };

        if remaining <= 0 {
            history::record(
                &txn,
                HistoryTarget::line(order.id, step.id, line.id),
                Some(user_id),
                HistoryAction::StepMenuRemoved,
                action.history_reason(),
                Some(payload),
            )
            .await?;
            step_menu::Entity::delete_by_id(line.id).exec(&txn).await?;
        } else {
            let mut active: step_menu::ActiveModel = line.clone().into();
            active.quantity = Set(remaining);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;

            history::record(
                &txn,
                HistoryTarget::line(order.id, step.id, line.id),
                Some(user_id),
                HistoryAction::StepMenuUpdated,
                action.history_reason(),
                Some(payload),
            )
            .await?;
        }

        let _ = refresh_step(&txn, Some(user_id), order.id, step).await?;
        let (order, status_change) = refresh_order(&txn, Some(user_id), order).await?;
        txn.commit().await?;

        self.notify_status_change(&order, status_change).await;
        Ok(outcome)
    }

    /// Cancels the whole order: settles every line (ids listed in
    /// `unopened_return_ids` are treated as unopened returns), empties the
    /// steps, and parks the order in CANCELED.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        unopened_return_ids: Vec<i32>,
    ) -> Result<OrderCancellation, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;

        let steps = order_step::Entity::find()
            .filter(order_step::Column::OrderId.eq(order.id))
            .order_by_asc(order_step::Column::Position)
            .all(&txn)
            .await?;

        let mut lines_by_step = Vec::with_capacity(steps.len());
        let mut all_line_ids = Vec::new();
        for step in &steps {
            let lines = step_menu::Entity::find()
                .filter(step_menu::Column::OrderStepId.eq(step.id))
                .all(&txn)
                .await?;
            all_line_ids.extend(lines.iter().map(|l| l.id));
            lines_by_step.push(lines);
        }

        if let Some(bad) = unopened_return_ids
            .iter()
            .find(|id| !all_line_ids.contains(id))
        {
            return Err(ServiceError::ValidationError(format!(
                "Step menu {} does not belong to this order",
                bad
            )));
        }

        let mut loss_ids = Vec::new();
        let mut return_ids = Vec::new();

        for (step, lines) in steps.iter().zip(lines_by_step) {
            for line in lines {
                let menu = menu::Entity::find_by_id(line.menu_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::InvalidOperation(
                            "A step menu is missing its associated menu.".to_string(),
                        )
                    })?;

                let unopened = unopened_return_ids.contains(&line.id);
                let action = determine_cancellation_action(&line, &menu, unopened);

                let mut payload = json!({
                    "menu_id": line.menu_id,
                    "step_menu_id": line.id,
                    "quantity_before": line.quantity,
                    "canceled_quantity": line.quantity,
                    "quantity_after": 0,
                    "type": action.kind(),
                });
                match &action {
                    CancelAction::Loss(reason) => {
                        payload["loss_reason"] = json!(reason);
                        record_menu_losses(
                            &txn,
                            company_id,
                            Some(user_id),
                            menu.id,
                            line.quantity,
                            reason,
                        )
                        .await?;
                        loss_ids.push(line.id);
                    }
                    CancelAction::Return => {
                        payload["return_accepted"] = json!(true);
                        return_ids.push(line.id);
                    }
                    CancelAction::Simple => {}
                }

                history::record(
                    &txn,
                    HistoryTarget::line(order.id, step.id, line.id),
                    Some(user_id),
                    HistoryAction::StepMenuRemoved,
                    action.history_reason(),
                    Some(payload),
                )
                .await?;
                step_menu::Entity::delete_by_id(line.id).exec(&txn).await?;
            }

            let _ = refresh_step(&txn, Some(user_id), order.id, step.clone()).await?;
        }

        let previous = order.status;
        let mut active: order::ActiveModel = order.clone().into();
        active.status = Set(OrderStatus::Canceled);
        active.canceled_at = Set(Some(Utc::now()));
        active.served_at = Set(None);
        active.payed_at = Set(None);
        active.updated_at = Set(Utc::now());
        let order = active.update(&txn).await?;

        if previous != OrderStatus::Canceled {
            history::record(
                &txn,
                HistoryTarget::order(order.id),
                Some(user_id),
                HistoryAction::OrderStatusUpdated,
                Some("ORDER_CANCELED"),
                Some(json!({
                    "from": previous,
                    "to": OrderStatus::Canceled,
                    "loss_step_menu_ids": loss_ids,
                    "return_step_menu_ids": return_ids,
                })),
            )
            .await?;
        }

        txn.commit().await?;

        self.notify_status_change(&order, Some((previous, OrderStatus::Canceled)))
            .await;
        info!(
            "Canceled order {} ({} loss lines, {} returns)",
            order.id,
            loss_ids.len(),
            return_ids.len()
        );
        Ok(OrderCancellation {
            loss_step_menu_ids: loss_ids,
            return_step_menu_ids: return_ids,
        })
    }

    /// Marks the order PAYED. Every line must be SERVED unless `force`.
    #[instrument(skip(self))]
    pub async fn mark_payed(
        &self,
        company_id: i32,
        user_id: i32,
        order_id: i32,
        force: bool,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let order = load_scoped_order(&txn, company_id, order_id).await?;

        let lines = step_menu::Entity::find()
            .inner_join(order_step::Entity)
            .filter(order_step::Column::OrderId.eq(order.id))
            .all(&txn)
            .await?;

        let all_served =
            !lines.is_empty() && lines.iter().all(|l| l.status == StepMenuStatus::Served);
        if !force && !all_served {
            return Err(ServiceError::InvalidOperation(
                "All menus must be served before marking the order as payed.".to_string(),
            ));
        }

        let previous = order.status;
        let mut active: order::ActiveModel = order.clone().into();
        active.status = Set(OrderStatus::Payed);
        if order.payed_at.is_none() {
            active.payed_at = Set(Some(Utc::now()));
        }
        active.updated_at = Set(Utc::now());
        let order = active.update(&txn).await?;

        if previous != OrderStatus::Payed {
            history::record(
                &txn,
                HistoryTarget::order(order.id),
                Some(user_id),
                HistoryAction::OrderStatusUpdated,
                force.then_some("PAYMENT_FORCED"),
                Some(json!({
                    "from": previous,
                    "to": OrderStatus::Payed,
                    "force": force,
                })),
            )
            .await?;
        }

        txn.commit().await?;
        self.notify_status_change(&order, Some((previous, OrderStatus::Payed)))
            .await;
        Ok(order)
    }

    /// Loads one order with steps, lines, menus, and computed price.
    #[instrument(skip(self))]
    pub async fn get(&self, company_id: i32, order_id: i32) -> Result<OrderDetail, ServiceError> {
        let order = load_scoped_order(&*self.db, company_id, order_id).await?;
        load_order_detail(&*self.db, order).await
    }

    /// Lists a company's orders, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        filter: OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let query = filtered_query(company_id, &filter).order_by_desc(order::Column::CreatedAt);
        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    /// Audit trail of one order, oldest first.
    #[instrument(skip(self))]
    pub async fn order_history(
        &self,
        company_id: i32,
        order_id: i32,
    ) -> Result<Vec<order_history::Model>, ServiceError> {
        let order = load_scoped_order(&*self.db, company_id, order_id).await?;
        history::for_order(&*self.db, order.id).await
    }

    /// Counts per status plus revenue over PAYED orders.
    #[instrument(skip(self))]
    pub async fn stats(
        &self,
        company_id: i32,
        filter: OrderFilter,
    ) -> Result<OrderStats, ServiceError> {
        let mut stats = OrderStats::default();
        for status in [
            OrderStatus::Pending,
            OrderStatus::Served,
            OrderStatus::Payed,
            OrderStatus::Canceled,
        ] {
            let count = filtered_query(company_id, &filter)
                .filter(order::Column::Status.eq(status))
                .count(&*self.db)
                .await?;
            match status {
                OrderStatus::Pending => stats.pending = count,
                OrderStatus::Served => stats.served = count,
                OrderStatus::Payed => stats.payed = count,
                OrderStatus::Canceled => stats.canceled = count,
            }
        }
        stats.total = stats.pending + stats.served + stats.payed + stats.canceled;

        let payed = filtered_query(company_id, &filter)
            .filter(order::Column::Status.eq(OrderStatus::Payed))
            .all(&*self.db)
            .await?;
        let mut revenue = Decimal::ZERO;
        for order in payed {
            revenue += order_price(&*self.db, order.id).await?;
        }
        stats.revenue = round2(revenue);

        Ok(stats)
    }

    async fn notify_status_change(
        &self,
        order: &order::Model,
        change: Option<(OrderStatus, OrderStatus)>,
    ) {
        if let Some((from, to)) = change {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id: order.id,
                    old_status: from.to_value(),
                    new_status: to.to_value(),
                })
                .await;
        }
    }
}

/// Sum of menu price × quantity over every line, rounded to 2 decimals.
pub async fn order_price<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Decimal, ServiceError> {
    let lines: Vec<(step_menu::Model, Option<menu::Model>)> = step_menu::Entity::find()
        .inner_join(order_step::Entity)
        .find_also_related(menu::Entity)
        .filter(order_step::Column::OrderId.eq(order_id))
        .all(db)
        .await?;

    let total = lines
        .iter()
        .filter_map(|(line, menu)| {
            menu.as_ref()
                .map(|m| m.price * Decimal::from(line.quantity))
        })
        .sum();
    Ok(round2(total))
}

fn filtered_query(company_id: i32, filter: &OrderFilter) -> sea_orm::Select<order::Entity> {
    let mut query = order::Entity::find().filter(order::Column::CompanyId.eq(company_id));
    if let Some(table_id) = filter.dining_table_id {
        query = query.filter(order::Column::DiningTableId.eq(table_id));
    }
    if let Some(user_id) = filter.user_id {
        query = query.filter(order::Column::UserId.eq(user_id));
    }
    if !filter.statuses.is_empty() {
        query = query.filter(order::Column::Status.is_in(filter.statuses.clone()));
    }
    if let Some(after) = filter.created_after {
        query = query.filter(order::Column::CreatedAt.gte(after));
    }
    if let Some(before) = filter.created_before {
        query = query.filter(order::Column::CreatedAt.lte(before));
    }
    query
}

async fn load_scoped_order<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    order_id: i32,
) -> Result<order::Model, ServiceError> {
    order::Entity::find_by_id(order_id)
        .one(db)
        .await?
        .filter(|o| o.company_id == company_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

async fn load_scoped_step<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
    step_id: i32,
) -> Result<order_step::Model, ServiceError> {
    order_step::Entity::find_by_id(step_id)
        .one(db)
        .await?
        .filter(|s| s.order_id == order.id)
        .ok_or_else(|| ServiceError::NotFound(format!("Order step {} not found", step_id)))
}

async fn load_scoped_line<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
    step_menu_id: i32,
) -> Result<(step_menu::Model, order_step::Model), ServiceError> {
    let line = step_menu::Entity::find_by_id(step_menu_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Step menu {} not found", step_menu_id)))?;
    let step = order_step::Entity::find_by_id(line.order_step_id)
        .one(db)
        .await?
        .filter(|s| s.order_id == order.id)
        .ok_or_else(|| ServiceError::NotFound(format!("Step menu {} not found", step_menu_id)))?;
    Ok((line, step))
}

/// Inserts one line, born READY for DIRECT menus, and records the history.
async fn insert_line<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: i32,
    order: &order::Model,
    step: &order_step::Model,
    line: &NewOrderLine,
) -> Result<step_menu::Model, ServiceError> {
    if line.quantity < 1 {
        return Err(ServiceError::InvalidInput(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let menu = menu::Entity::find_by_id(line.menu_id)
        .one(db)
        .await?
        .filter(|m| m.company_id == company_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Menu {} not found", line.menu_id)))?;

    let status = initial_step_menu_status(menu.service_kind);
    let now = Utc::now();
    let created = step_menu::ActiveModel {
        order_step_id: Set(step.id),
        menu_id: Set(menu.id),
        quantity: Set(line.quantity),
        status: Set(status),
        note: Set(line.note.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    history::record(
        db,
        HistoryTarget::line(order.id, step.id, created.id),
        Some(user_id),
        HistoryAction::StepMenuAdded,
        None,
        Some(json!({
            "menu_id": created.menu_id,
            "quantity": created.quantity,
            "status": created.status,
            "note": created.note,
        })),
    )
    .await?;

    Ok(created)
}

/// Recomputes a step's status from its lines and keeps `served_at` honest.
async fn refresh_step<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
    order_id: i32,
    step: order_step::Model,
) -> Result<order_step::Model, ServiceError> {
    let statuses: Vec<StepMenuStatus> = step_menu::Entity::find()
        .filter(step_menu::Column::OrderStepId.eq(step.id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.status)
        .collect();

    let previous = step.status;
    let target = derive_step_status(&statuses);

    let mut active: order_step::ActiveModel = step.clone().into();
    let mut dirty = false;
    if target != previous {
        active.status = Set(target);
        dirty = true;
    }
    if target == StepStatus::Served {
        if step.served_at.is_none() {
            active.served_at = Set(Some(Utc::now()));
            dirty = true;
        }
    } else if step.served_at.is_some() {
        active.served_at = Set(None);
        dirty = true;
    }

    let updated = if dirty {
        active.updated_at = Set(Utc::now());
        active.update(db).await?
    } else {
        step
    };

    if target != previous {
        history::record(
            db,
            HistoryTarget::step(order_id, updated.id),
            user_id,
            HistoryAction::OrderStepStatusUpdated,
            None,
            Some(transition_payload(&previous, &target)),
        )
        .await?;
    }

    Ok(updated)
}

/// Recomputes the order's status from its steps. Terminal statuses stay.
async fn refresh_order<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
    order: order::Model,
) -> Result<(order::Model, Option<(OrderStatus, OrderStatus)>), ServiceError> {
    let step_statuses: Vec<StepStatus> = order_step::Entity::find()
        .filter(order_step::Column::OrderId.eq(order.id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.status)
        .collect();

    let previous = order.status;
    let target = derive_order_status(previous, &step_statuses);

    let mut active: order::ActiveModel = order.clone().into();
    let mut dirty = false;
    if target != previous {
        active.status = Set(target);
        dirty = true;
    }
    if !matches!(target, OrderStatus::Payed | OrderStatus::Canceled) {
        if target == OrderStatus::Served {
            if order.served_at.is_none() {
                active.served_at = Set(Some(Utc::now()));
                dirty = true;
            }
        } else if order.served_at.is_some() {
            active.served_at = Set(None);
            dirty = true;
        }
    }

    let updated = if dirty {
        active.updated_at = Set(Utc::now());
        active.update(db).await?
    } else {
        order
    };

    if target != previous {
        history::record(
            db,
            HistoryTarget::order(updated.id),
            user_id,
            HistoryAction::OrderStatusUpdated,
            None,
            Some(transition_payload(&previous, &target)),
        )
        .await?;
        Ok((updated, Some((previous, target))))
    } else {
        Ok((updated, None))
    }
}

fn determine_cancellation_action(
    line: &step_menu::Model,
    menu: &menu::Model,
    unopened_return: bool,
) -> CancelAction {
    match menu.service_kind {
        MenuServiceKind::Prep => {
            if line.status == StepMenuStatus::InPrep {
                CancelAction::Simple
            } else {
                CancelAction::Loss(LOSS_REASON_KITCHEN)
            }
        }
        MenuServiceKind::Direct => {
            if line.status == StepMenuStatus::Served {
                if menu.is_returnable && unopened_return {
                    CancelAction::Return
                } else {
                    CancelAction::Loss(LOSS_REASON_SERVICE)
                }
            } else {
                CancelAction::Simple
            }
        }
    }
}

/// Writes one loss per recipe line of the menu, quantities converted into
/// each stockable's own unit.
async fn record_menu_losses<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: Option<i32>,
    menu_id: i32,
    portions: i32,
    reason: &str,
) -> Result<(), ServiceError> {
    let items = menu_item::Entity::find()
        .filter(menu_item::Column::MenuId.eq(menu_id))
        .all(db)
        .await?;

    for item in items {
        let entity = stockable::info(db, item.stockable_kind, item.stockable_id).await?;
        let raw = item.quantity * Decimal::from(portions);
        if raw <= Decimal::ZERO {
            continue;
        }
        let converted = convert(raw, item.unit, entity.unit)?;
        if converted <= Decimal::ZERO {
            continue;
        }
        losses::record_within(
            db,
            company_id,
            user_id,
            item.stockable_kind,
            item.stockable_id,
            item.location_id,
            converted,
            Some(reason),
        )
        .await?;
    }
    Ok(())
}

async fn load_step_detail<C: ConnectionTrait>(
    db: &C,
    step: order_step::Model,
) -> Result<StepDetail, ServiceError> {
    let lines = step_menu::Entity::find()
        .find_also_related(menu::Entity)
        .filter(step_menu::Column::OrderStepId.eq(step.id))
        .order_by_asc(step_menu::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(line, menu)| menu.map(|menu| LineDetail { line, menu }))
        .collect();
    Ok(StepDetail { step, lines })
}

async fn load_order_detail<C: ConnectionTrait>(
    db: &C,
    order: order::Model,
) -> Result<OrderDetail, ServiceError> {
    let steps = order_step::Entity::find()
        .filter(order_step::Column::OrderId.eq(order.id))
        .order_by_asc(order_step::Column::Position)
        .all(db)
        .await?;

    let mut details = Vec::with_capacity(steps.len());
    for step in steps {
        details.push(load_step_detail(db, step).await?);
    }

    let price = order_price(db, order.id).await?;
    Ok(OrderDetail {
        order,
        price,
        steps: details,
    })
}
