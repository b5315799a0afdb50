//! Stock mutation orchestrator.
//!
//! Adds, removals, and transfers share the same shape: convert the caller's
//! quantity into the entity's unit, lock the pivot row, write the new
//! rounded quantity, record the movement, and keep perishable batches in
//! step, all inside one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use crate::entities::{ingredient, ingredient_location, location, preparation_location};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conversion::{convert, round2};
use crate::services::stockable::{self, StockableInfo};
use crate::services::{perishables, stock_movements};

/// Quantity of one entity at one location, for stock listings.
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub location_id: i32,
    pub location_name: String,
    pub quantity: Decimal,
}

#[derive(Clone)]
pub struct StockService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl StockService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Adds quantity at a location. `unit` converts from the caller's unit
    /// into the entity's own; `None` means the quantity is already in the
    /// entity's unit. Returns the new pivot quantity.
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn add(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        kind: StockableKind,
        stockable_id: i32,
        location_id: i32,
        quantity: Decimal,
        unit: Option<MeasurementUnit>,
        reason: Option<String>,
    ) -> Result<Decimal, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let (entity, location) =
            load_guarded(&txn, company_id, kind, stockable_id, location_id).await?;

        let amount = match unit {
            Some(unit) => convert(quantity, unit, entity.unit)?,
            None => quantity,
        };

        let old = stockable::quantity_at(&txn, kind, stockable_id, location_id, true)
            .await?
            .unwrap_or(Decimal::ZERO);
        let new = round2(old + amount);

        stockable::set_quantity(&txn, kind, stockable_id, location_id, new).await?;
        stock_movements::record(
            &txn,
            &entity,
            &location,
            user_id,
            old,
            new,
            Some(reason.as_deref().unwrap_or("Manual Addition")),
        )
        .await?;
        sync_perishables_on_add(&txn, company_id, kind, stockable_id, &location, amount).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockAdded {
                stockable_kind: kind,
                stockable_id,
                location_id,
                quantity: amount,
            })
            .await;

        info!(
            "Added {} {} to {} {} at {} (now {})",
            amount, entity.unit, kind, stockable_id, location.name, new
        );
        Ok(new)
    }

    /// Removes quantity at a location. Returns the new pivot quantity.
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn remove(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        kind: StockableKind,
        stockable_id: i32,
        location_id: i32,
        quantity: Decimal,
        unit: Option<MeasurementUnit>,
        reason: Option<String>,
    ) -> Result<Decimal, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let (entity, location) =
            load_guarded(&txn, company_id, kind, stockable_id, location_id).await?;

        let amount = match unit {
            Some(unit) => convert(quantity, unit, entity.unit)?,
            None => quantity,
        };

        let old = stockable::quantity_at(&txn, kind, stockable_id, location_id, true)
            .await?
            .unwrap_or(Decimal::ZERO);
        let new = round2(old - amount);
        if new < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Quantity cannot be negative".to_string(),
            ));
        }

        stockable::set_quantity(&txn, kind, stockable_id, location_id, new).await?;
        stock_movements::record(
            &txn,
            &entity,
            &location,
            user_id,
            old,
            new,
            Some(reason.as_deref().unwrap_or("Manual Withdrawal")),
        )
        .await?;
        sync_perishables_on_remove(&txn, company_id, kind, stockable_id, &location, amount).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockRemoved {
                stockable_kind: kind,
                stockable_id,
                location_id,
                quantity: amount,
            })
            .await;

        info!(
            "Removed {} {} of {} {} from {} (now {})",
            amount, entity.unit, kind, stockable_id, location.name, new
        );
        Ok(new)
    }

    /// Moves quantity between two locations of the same company in one
    /// transaction.
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        kind: StockableKind,
        stockable_id: i32,
        from_location_id: i32,
        to_location_id: i32,
        quantity: Decimal,
        unit: Option<MeasurementUnit>,
    ) -> Result<(), ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Quantity must be positive".to_string(),
            ));
        }
        if from_location_id == to_location_id {
            return Err(ServiceError::InvalidInput(
                "Source and destination locations are identical".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let (entity, from_location) =
            load_guarded(&txn, company_id, kind, stockable_id, from_location_id).await?;
        let to_location = location::Entity::find_by_id(to_location_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", to_location_id))
            })?;
        if to_location.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "Location {} belongs to a different company",
                to_location_id
            )));
        }

        let amount = match unit {
            Some(unit) => convert(quantity, unit, entity.unit)?,
            None => quantity,
        };

        // Row locks in location order; two opposite transfers would
        // otherwise deadlock.
        let mut location_ids = [from_location_id, to_location_id];
        location_ids.sort_unstable();
        let mut held = HashMap::new();
        for loc_id in location_ids {
            let quantity = stockable::quantity_at(&txn, kind, stockable_id, loc_id, true)
                .await?
                .unwrap_or(Decimal::ZERO);
            held.insert(loc_id, quantity);
        }

        let old_from = held[&from_location_id];
        let old_to = held[&to_location_id];
        let new_from = round2(old_from - amount);
        if new_from < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Quantity cannot be negative".to_string(),
            ));
        }
        let new_to = round2(old_to + amount);

        let reason = format!("Moved from {} to {}", from_location.name, to_location.name);
        stockable::set_quantity(&txn, kind, stockable_id, from_location_id, new_from).await?;
        stock_movements::record(
            &txn,
            &entity,
            &from_location,
            user_id,
            old_from,
            new_from,
            Some(&reason),
        )
        .await?;
        stockable::set_quantity(&txn, kind, stockable_id, to_location_id, new_to).await?;
        stock_movements::record(
            &txn,
            &entity,
            &to_location,
            user_id,
            old_to,
            new_to,
            Some(&reason),
        )
        .await?;

        sync_perishables_on_remove(&txn, company_id, kind, stockable_id, &from_location, amount)
            .await?;
        sync_perishables_on_add(&txn, company_id, kind, stockable_id, &to_location, amount).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockTransferred {
                stockable_kind: kind,
                stockable_id,
                from_location_id,
                to_location_id,
                quantity: amount,
            })
            .await;

        info!(
            "Moved {} {} of {} {} from {} to {}",
            amount, entity.unit, kind, stockable_id, from_location.name, to_location.name
        );
        Ok(())
    }

    /// Current quantity of one entity at every location holding it.
    #[instrument(skip(self))]
    pub async fn levels(
        &self,
        company_id: i32,
        kind: StockableKind,
        stockable_id: i32,
    ) -> Result<Vec<StockLevel>, ServiceError> {
        let entity = stockable::info(&*self.db, kind, stockable_id).await?;
        if entity.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "{} {} belongs to a different company",
                kind, stockable_id
            )));
        }

        let levels = match kind {
            StockableKind::Ingredient => ingredient_location::Entity::find()
                .filter(ingredient_location::Column::IngredientId.eq(stockable_id))
                .find_also_related(location::Entity)
                .all(&*self.db)
                .await?
                .into_iter()
                .filter_map(|(pivot, loc)| {
                    loc.map(|loc| StockLevel {
                        location_id: loc.id,
                        location_name: loc.name,
                        quantity: pivot.quantity,
                    })
                })
                .collect(),
            StockableKind::Preparation => preparation_location::Entity::find()
                .filter(preparation_location::Column::PreparationId.eq(stockable_id))
                .find_also_related(location::Entity)
                .all(&*self.db)
                .await?
                .into_iter()
                .filter_map(|(pivot, loc)| {
                    loc.map(|loc| StockLevel {
                        location_id: loc.id,
                        location_name: loc.name,
                        quantity: pivot.quantity,
                    })
                })
                .collect(),
        };

        Ok(levels)
    }
}

async fn load_guarded<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    kind: StockableKind,
    stockable_id: i32,
    location_id: i32,
) -> Result<(StockableInfo, location::Model), ServiceError> {
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

    Ok((entity, location))
}

/// Perishable batches track ingredients only; preparations pass through.
async fn sync_perishables_on_add<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    kind: StockableKind,
    stockable_id: i32,
    location: &location::Model,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if kind != StockableKind::Ingredient {
        return Ok(());
    }
    let Some(model) = ingredient::Entity::find_by_id(stockable_id).one(db).await? else {
        return Ok(());
    };
    perishables::add_within(db, company_id, &model, location, quantity).await?;
    Ok(())
}

async fn sync_perishables_on_remove<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    kind: StockableKind,
    stockable_id: i32,
    location: &location::Model,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    if kind != StockableKind::Ingredient {
        return Ok(());
    }
    let Some(model) = ingredient::Entity::find_by_id(stockable_id).one(db).await? else {
        return Ok(());
    };
    perishables::remove_within(db, company_id, &model, location, quantity).await?;
    Ok(())
}
