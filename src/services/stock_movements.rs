//! Append-only audit trail of stock level changes.
//!
//! Every pivot write (create, update, drain) calls [`record`] inside the
//! same transaction, so the movement history and the current quantities can
//! never drift apart.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::instrument;

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::{MovementType, StockableKind};
use crate::entities::{location, stock_movement};
use crate::errors::ServiceError;
use crate::services::conversion::{exceeds_movement_threshold, round2};
use crate::services::stockable::StockableInfo;

/// Writes one audit row for a stock quantity change, or nothing when the
/// change does not qualify.
///
/// Skipped silently (returns `Ok(None)`) when either quantity is negative,
/// when the location does not belong to the entity's company, or when the
/// rounded delta is below 0.01. A skipped movement is not an error: the
/// surrounding stock mutation still commits.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    entity: &StockableInfo,
    location: &location::Model,
    user_id: Option<i32>,
    quantity_before: Decimal,
    quantity_after: Decimal,
    reason: Option<&str>,
) -> Result<Option<stock_movement::Model>, ServiceError> {
    if quantity_before < Decimal::ZERO || quantity_after < Decimal::ZERO {
        return Ok(None);
    }
    if location.company_id != entity.company_id {
        return Ok(None);
    }

    let before = round2(quantity_before);
    let after = round2(quantity_after);
    let delta = after - before;
    if !exceeds_movement_threshold(delta) {
        return Ok(None);
    }

    let movement_type = if delta > Decimal::ZERO {
        MovementType::Addition
    } else {
        MovementType::Withdrawal
    };

    let movement = stock_movement::ActiveModel {
        company_id: Set(entity.company_id),
        stockable_kind: Set(entity.kind),
        stockable_id: Set(entity.id),
        location_id: Set(location.id),
        user_id: Set(user_id),
        movement_type: Set(movement_type),
        quantity: Set(round2(delta.abs())),
        quantity_before: Set(before),
        quantity_after: Set(after),
        reason: Set(reason.map(|r| r.to_string())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Some(movement))
}

/// Optional narrowing criteria for movement listings.
#[derive(Debug, Default, Clone)]
pub struct MovementFilter {
    pub stockable_kind: Option<StockableKind>,
    pub stockable_id: Option<i32>,
    pub location_id: Option<i32>,
}

/// Read side of the movement ledger.
#[derive(Clone)]
pub struct StockMovementService {
    db: Arc<DbPool>,
}

impl StockMovementService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists a company's movements, newest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        filter: MovementFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let mut query = stock_movement::Entity::find()
            .filter(stock_movement::Column::CompanyId.eq(company_id))
            .order_by_desc(stock_movement::Column::CreatedAt);

        if let Some(kind) = filter.stockable_kind {
            query = query.filter(stock_movement::Column::StockableKind.eq(kind));
        }
        if let Some(id) = filter.stockable_id {
            query = query.filter(stock_movement::Column::StockableId.eq(id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(stock_movement::Column::LocationId.eq(location_id));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }
}
