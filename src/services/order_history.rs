//! Audit trail for the order workflow.
//!
//! One row per transition or membership change. Rows are written inside the
//! transaction that caused them and are never read back by the workflow;
//! they exist for the audit trail alone.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use serde_json::json;

use crate::entities::order_history;
use crate::entities::sea_orm_active_enums::HistoryAction;
use crate::errors::ServiceError;

/// Where in the order tree a history row points.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryTarget {
    pub order_id: i32,
    pub order_step_id: Option<i32>,
    pub step_menu_id: Option<i32>,
}

impl HistoryTarget {
    pub fn order(order_id: i32) -> Self {
        Self {
            order_id,
            ..Default::default()
        }
    }

    pub fn step(order_id: i32, order_step_id: i32) -> Self {
        Self {
            order_id,
            order_step_id: Some(order_step_id),
            ..Default::default()
        }
    }

    pub fn line(order_id: i32, order_step_id: i32, step_menu_id: i32) -> Self {
        Self {
            order_id,
            order_step_id: Some(order_step_id),
            step_menu_id: Some(step_menu_id),
        }
    }
}

/// Writes one history row.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    target: HistoryTarget,
    user_id: Option<i32>,
    action: HistoryAction,
    reason: Option<&str>,
    payload: Option<serde_json::Value>,
) -> Result<order_history::Model, ServiceError> {
    let row = order_history::ActiveModel {
        order_id: Set(target.order_id),
        order_step_id: Set(target.order_step_id),
        step_menu_id: Set(target.step_menu_id),
        user_id: Set(user_id),
        action: Set(action),
        reason: Set(reason.map(|r| r.to_string())),
        payload: Set(payload),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(row)
}

/// `{"from": …, "to": …}` payload for status transitions.
pub fn transition_payload<T: Serialize>(from: &T, to: &T) -> serde_json::Value {
    json!({ "from": from, "to": to })
}

/// Full history of one order, oldest first.
pub async fn for_order<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Vec<order_history::Model>, ServiceError> {
    Ok(order_history::Entity::find()
        .filter(order_history::Column::OrderId.eq(order_id))
        .order_by_asc(order_history::Column::CreatedAt)
        .order_by_asc(order_history::Column::Id)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::OrderStatus;

    #[test]
    fn transition_payload_serializes_both_sides() {
        let payload = transition_payload(&OrderStatus::Pending, &OrderStatus::Served);
        assert_eq!(payload, json!({ "from": "PENDING", "to": "SERVED" }));
    }
}
