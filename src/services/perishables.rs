//! Perishable batch tracking.
//!
//! Every stock addition of a perishable ingredient opens a batch; removals
//! drain batches oldest-expiration-first. Expiration is never stored: it is
//! computed from the batch's creation time plus the shelf-life rule for
//! (ingredient category, location type). No rule means the combination is
//! not perishable and no batch is ever created for it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::StockableKind;
use crate::entities::{category_location_type, ingredient, location, perishable};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conversion::round2;
use crate::services::losses;

/// Stand-in expiration for batches with no shelf-life rule. Far enough out
/// that sorting and "expired" filters treat the batch as never expiring.
pub fn far_future() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Computes when a batch created at `created_at` expires.
pub fn expiration_from(created_at: DateTime<Utc>, shelf_life_hours: Option<i32>) -> DateTime<Utc> {
    match shelf_life_hours {
        Some(hours) => created_at + Duration::hours(hours as i64),
        None => far_future(),
    }
}

/// Shelf-life rule for an (ingredient, location) pair, `None` when the
/// combination is not perishable.
pub async fn shelf_life_hours<C: ConnectionTrait>(
    db: &C,
    ingredient: &ingredient::Model,
    location: &location::Model,
) -> Result<Option<i32>, ServiceError> {
    let Some(category_id) = ingredient.category_id else {
        return Ok(None);
    };
    Ok(category_location_type::Entity::find()
        .filter(category_location_type::Column::CategoryId.eq(category_id))
        .filter(category_location_type::Column::LocationTypeId.eq(location.location_type_id))
        .one(db)
        .await?
        .map(|rule| rule.shelf_life_hours))
}

/// Opens a new batch for a stock addition, or returns `None` when the
/// combination has no shelf-life rule.
pub async fn add_within<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    ingredient: &ingredient::Model,
    location: &location::Model,
    quantity: Decimal,
) -> Result<Option<perishable::Model>, ServiceError> {
    if shelf_life_hours(db, ingredient, location).await?.is_none() {
        return Ok(None);
    }

    let batch = perishable::ActiveModel {
        company_id: Set(company_id),
        ingredient_id: Set(ingredient.id),
        location_id: Set(location.id),
        quantity: Set(round2(quantity)),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Some(batch))
}

/// Drains batches for a stock removal, oldest expiration first.
///
/// All batches of one (ingredient, location) share a shelf life, so
/// ascending creation order is ascending expiration order. Already-expired
/// batches are skipped (the sweep owns those); fully drained batches are
/// soft-deleted. Removing more than the batches hold is not an error: the
/// pivot quantity is the authority, batches merely annotate it.
pub async fn remove_within<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    ingredient: &ingredient::Model,
    location: &location::Model,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    let hours = shelf_life_hours(db, ingredient, location).await?;
    let now = Utc::now();

    let batches = perishable::Entity::find()
        .filter(perishable::Column::CompanyId.eq(company_id))
        .filter(perishable::Column::IngredientId.eq(ingredient.id))
        .filter(perishable::Column::LocationId.eq(location.id))
        .filter(perishable::Column::DeletedAt.is_null())
        .order_by_asc(perishable::Column::CreatedAt)
        .all(db)
        .await?;

    let mut remaining = round2(quantity);
    for batch in batches {
        if remaining <= Decimal::ZERO {
            break;
        }
        if expiration_from(batch.created_at, hours) < now {
            continue;
        }

        let take = batch.quantity.min(remaining);
        let left = round2(batch.quantity - take);
        remaining = round2(remaining - take);

        let mut active: perishable::ActiveModel = batch.into();
        active.quantity = Set(left);
        active.updated_at = Set(Utc::now());
        if left <= Decimal::ZERO {
            active.deleted_at = Set(Some(Utc::now()));
        }
        active.update(db).await?;
    }

    Ok(())
}

/// A batch joined with its computed expiration.
#[derive(Debug, Clone, Serialize)]
pub struct PerishableBatch {
    #[serde(flatten)]
    pub batch: perishable::Model,
    pub expires_at: DateTime<Utc>,
}

/// Computes expirations for a set of loaded batches, caching the rule
/// lookups per (category, location type) pair.
pub async fn with_expirations<C: ConnectionTrait>(
    db: &C,
    batches: Vec<perishable::Model>,
) -> Result<Vec<PerishableBatch>, ServiceError> {
    let mut categories: HashMap<i32, Option<i32>> = HashMap::new();
    let mut location_types: HashMap<i32, i32> = HashMap::new();
    let mut shelf_lives: HashMap<(i32, i32), Option<i32>> = HashMap::new();

    let mut out = Vec::with_capacity(batches.len());
    for batch in batches {
        let category_id = match categories.get(&batch.ingredient_id) {
            Some(cached) => *cached,
            None => {
                let model = ingredient::Entity::find_by_id(batch.ingredient_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!(
                            "Ingredient {} not found",
                            batch.ingredient_id
                        ))
                    })?;
                categories.insert(batch.ingredient_id, model.category_id);
                model.category_id
            }
        };

        let location_type_id = match location_types.get(&batch.location_id) {
            Some(cached) => *cached,
            None => {
                let model = location::Entity::find_by_id(batch.location_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Location {} not found", batch.location_id))
                    })?;
                location_types.insert(batch.location_id, model.location_type_id);
                model.location_type_id
            }
        };

        let hours = match category_id {
            None => None,
            Some(category_id) => match shelf_lives.get(&(category_id, location_type_id)) {
                Some(cached) => *cached,
                None => {
                    let hours = category_location_type::Entity::find()
                        .filter(category_location_type::Column::CategoryId.eq(category_id))
                        .filter(
                            category_location_type::Column::LocationTypeId.eq(location_type_id),
                        )
                        .one(db)
                        .await?
                        .map(|rule| rule.shelf_life_hours);
                    shelf_lives.insert((category_id, location_type_id), hours);
                    hours
                }
            },
        };

        let expires_at = expiration_from(batch.created_at, hours);
        out.push(PerishableBatch { batch, expires_at });
    }

    Ok(out)
}

/// Outcome summary of one expiry sweep.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SweepOutcome {
    pub examined: usize,
    pub expired: usize,
    pub losses_recorded: usize,
    pub failures: usize,
}

/// Service for listing batches and running the expiry sweep.
#[derive(Clone)]
pub struct PerishableService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl PerishableService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists a company's active batches with expirations, soonest first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        only_unread: bool,
    ) -> Result<Vec<PerishableBatch>, ServiceError> {
        let mut query = perishable::Entity::find()
            .filter(perishable::Column::CompanyId.eq(company_id))
            .filter(perishable::Column::DeletedAt.is_null());
        if only_unread {
            query = query.filter(perishable::Column::IsRead.eq(false));
        }
        let batches = query.all(&*self.db).await?;

        let mut out = with_expirations(&*self.db, batches).await?;
        out.sort_by_key(|entry| entry.expires_at);
        Ok(out)
    }

    /// Lists soft-deleted (exhausted or expired) batches, newest first.
    #[instrument(skip(self))]
    pub async fn list_expired(&self, company_id: i32) -> Result<Vec<perishable::Model>, ServiceError> {
        Ok(perishable::Entity::find()
            .filter(perishable::Column::CompanyId.eq(company_id))
            .filter(perishable::Column::DeletedAt.is_not_null())
            .order_by_desc(perishable::Column::DeletedAt)
            .all(&*self.db)
            .await?)
    }

    /// Acknowledges a batch notification.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        company_id: i32,
        perishable_id: i32,
    ) -> Result<perishable::Model, ServiceError> {
        let batch = perishable::Entity::find_by_id(perishable_id)
            .filter(perishable::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .filter(|b| b.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Perishable {} not found", perishable_id))
            })?;

        let mut active: perishable::ActiveModel = batch.into();
        active.is_read = Set(true);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Finds every expired batch and converts it into a loss.
    ///
    /// Each batch commits in its own transaction: a crash mid-sweep leaves
    /// partial state, which the next run completes (already-deleted batches
    /// are skipped). Per-batch failures are logged, counted, and skipped.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> Result<SweepOutcome, ServiceError> {
        let now = Utc::now();
        let batches = perishable::Entity::find()
            .filter(perishable::Column::DeletedAt.is_null())
            .order_by_asc(perishable::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut outcome = SweepOutcome {
            examined: batches.len(),
            ..Default::default()
        };

        for entry in with_expirations(&*self.db, batches).await? {
            if entry.expires_at >= now {
                continue;
            }
            outcome.expired += 1;
            match self.expire_batch(&entry.batch).await {
                Ok(true) => outcome.losses_recorded += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome.failures += 1;
                    error!("Failed to expire perishable {}: {}", entry.batch.id, e);
                }
            }
        }

        info!(
            "Expiry sweep done: {} examined, {} expired, {} losses recorded, {} failures",
            outcome.examined, outcome.expired, outcome.losses_recorded, outcome.failures
        );
        Ok(outcome)
    }

    /// Expires one batch in its own transaction. Returns `false` when the
    /// batch was already gone.
    async fn expire_batch(&self, batch: &perishable::Model) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        // Another sweep may have finished this batch since the scan.
        let current = perishable::Entity::find_by_id(batch.id)
            .filter(perishable::Column::DeletedAt.is_null())
            .one(&txn)
            .await?;
        let Some(current) = current else {
            return Ok(false);
        };

        losses::record_within(
            &txn,
            current.company_id,
            None,
            StockableKind::Ingredient,
            current.ingredient_id,
            current.location_id,
            current.quantity,
            Some("expired"),
        )
        .await?;

        let quantity = current.quantity;
        let (ingredient_id, location_id) = (current.ingredient_id, current.location_id);

        let mut active: perishable::ActiveModel = current.into();
        active.is_read = Set(false);
        active.deleted_at = Set(Some(Utc::now()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PerishableExpired {
                perishable_id: batch.id,
                ingredient_id,
                location_id,
                quantity,
            })
            .await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn expiration_uses_shelf_life_hours() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap();
        let expires = expiration_from(created, Some(48));
        assert_eq!(
            expires,
            Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).single().unwrap()
        );
    }

    #[test]
    fn missing_rule_yields_far_future_sentinel() {
        let created = Utc::now();
        let expires = expiration_from(created, None);
        assert_eq!(expires, far_future());
        assert_eq!(expires.format("%Y-%m-%d %H:%M:%S").to_string(), "9999-12-31 23:59:59");
    }

    #[test]
    fn rounding_drains_to_exact_zero() {
        // A batch of 0.10 drained by 0.10 must land on zero, not dust.
        let left = round2(dec!(0.10) - dec!(0.10));
        assert_eq!(left, Decimal::ZERO);
    }
}
