//! Loss accounting: spoilage, breakage, expiry, order cancellations.
//!
//! A loss removes quantity from a stock pivot and leaves a row explaining
//! where it went. The pivot decrement, the movement record, and the loss row
//! are written in one transaction; any guard failure aborts all three.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::StockableKind;
use crate::entities::{location, loss};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conversion::round2;
use crate::services::{stock_movements, stockable};

/// Records a loss inside an existing transaction.
///
/// Guards, in order: quantity must be positive; entity and location must
/// belong to `company_id`; the entity must be stocked at the location with
/// at least the requested quantity. The pivot is decremented, the movement
/// recorded, and the loss row inserted only when every guard passes.
pub async fn record_within<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: Option<i32>,
    kind: StockableKind,
    stockable_id: i32,
    location_id: i32,
    quantity: Decimal,
    reason: Option<&str>,
) -> Result<loss::Model, ServiceError> {
    if quantity <= Decimal::ZERO {
        return Err(ServiceError::InvalidInput(
            "Loss quantity must be positive".to_string(),
        ));
    }

    let entity = stockable::info(db, kind, stockable_id).await?;
    if entity.company_id != company_id {
        return Err(ServiceError::Forbidden(format!(
            "{} {} belongs to a different company",
            kind, stockable_id
        )));
    }

    let location = location::Entity::find_by_id(location_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;
    if location.company_id != company_id {
        return Err(ServiceError::Forbidden(format!(
            "Location {} belongs to a different company",
            location_id
        )));
    }

    let available = stockable::quantity_at(db, kind, stockable_id, location_id, true)
        .await?
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "{} is not stocked at {}",
                entity.name, location.name
            ))
        })?;

    let quantity = round2(quantity);
    if available < quantity {
        return Err(ServiceError::InsufficientStock(format!(
            "Cannot lose {} of {}: only {} available at {}",
            quantity, entity.name, available, location.name
        )));
    }

    let remaining = round2(available - quantity);
    stockable::set_quantity(db, kind, stockable_id, location_id, remaining).await?;
    stock_movements::record(db, &entity, &location, user_id, available, remaining, reason).await?;

    let loss = loss::ActiveModel {
        company_id: Set(company_id),
        stockable_kind: Set(kind),
        stockable_id: Set(stockable_id),
        location_id: Set(location_id),
        user_id: Set(user_id),
        quantity: Set(quantity),
        reason: Set(reason.map(|r| r.to_string())),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(loss)
}

/// Optional narrowing criteria for loss listings.
#[derive(Debug, Default, Clone)]
pub struct LossFilter {
    pub stockable_kind: Option<StockableKind>,
    pub stockable_id: Option<i32>,
    pub location_id: Option<i32>,
}

/// Service for recording, listing, and rolling back losses.
#[derive(Clone)]
pub struct LossService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl LossService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a loss in its own transaction.
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_loss(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        kind: StockableKind,
        stockable_id: i32,
        location_id: i32,
        quantity: Decimal,
        reason: Option<String>,
    ) -> Result<loss::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let loss = record_within(
            &txn,
            company_id,
            user_id,
            kind,
            stockable_id,
            location_id,
            quantity,
            reason.as_deref(),
        )
        .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LossRecorded {
                loss_id: loss.id,
                stockable_kind: kind,
                stockable_id,
                quantity: loss.quantity,
            })
            .await;

        info!(
            "Recorded loss {}: {} {} x{} at location {}",
            loss.id, kind, stockable_id, loss.quantity, location_id
        );
        Ok(loss)
    }

    /// Restores the lost quantity to the pivot and deletes the loss row.
    ///
    /// The loss's entity and location must still exist and belong to the
    /// company; the restoring movement carries the reason `"Loss Rollback"`.
    #[instrument(skip(self))]
    pub async fn rollback(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        loss_id: i32,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let loss = loss::Entity::find_by_id(loss_id)
            .one(&txn)
            .await?
            .filter(|l| l.company_id == company_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Loss {} not found", loss_id)))?;

        let entity = stockable::info(&txn, loss.stockable_kind, loss.stockable_id).await?;
        if entity.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "{} {} belongs to a different company",
                loss.stockable_kind, loss.stockable_id
            )));
        }

        let location = location::Entity::find_by_id(loss.location_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", loss.location_id))
            })?;
        if location.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "Location {} belongs to a different company",
                location.id
            )));
        }

        let available =
            stockable::quantity_at(&txn, loss.stockable_kind, loss.stockable_id, location.id, true)
                .await?
                .unwrap_or(Decimal::ZERO);
        let restored = round2(available + loss.quantity);

        stockable::set_quantity(&txn, loss.stockable_kind, loss.stockable_id, location.id, restored)
            .await?;
        stock_movements::record(
            &txn,
            &entity,
            &location,
            user_id,
            available,
            restored,
            Some("Loss Rollback"),
        )
        .await?;

        loss::Entity::delete_by_id(loss_id).exec(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::LossRolledBack { loss_id })
            .await;

        info!("Rolled back loss {}", loss_id);
        Ok(())
    }

    /// Lists a company's losses, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        filter: LossFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<loss::Model>, u64), ServiceError> {
        let mut query = loss::Entity::find()
            .filter(loss::Column::CompanyId.eq(company_id))
            .order_by_desc(loss::Column::CreatedAt);

        if let Some(kind) = filter.stockable_kind {
            query = query.filter(loss::Column::StockableKind.eq(kind));
        }
        if let Some(id) = filter.stockable_id {
            query = query.filter(loss::Column::StockableId.eq(id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(loss::Column::LocationId.eq(location_id));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }
}
