//! Preparations: in-house recipes stocked like ingredients.
//!
//! `prepare` is the production operation: it consumes component stock at a
//! location and credits the produced quantity there, all in one
//! transaction. Movements written by production carry the reason
//! `"Preparation"`.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::{
    MeasurementUnit, PreparationKind, StockableKind,
};
use crate::entities::{
    ingredient, location, menu_item, preparation, preparation_component, preparation_location,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::conversion::{convert, round2};
use crate::services::{perishables, stock_movements, stockable};

const PRODUCTION_REASON: &str = "Preparation";

/// One recipe line when creating or replacing components.
#[derive(Debug, Clone)]
pub struct NewComponent {
    pub component_kind: StockableKind,
    pub component_id: i32,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
}

/// Fields for creating a preparation.
#[derive(Debug, Clone)]
pub struct NewPreparation {
    pub name: String,
    pub unit: MeasurementUnit,
    pub kind: PreparationKind,
    pub image_url: Option<String>,
    pub components: Vec<NewComponent>,
}

/// Partial update; `components` replaces the whole recipe when present.
#[derive(Debug, Default, Clone)]
pub struct PreparationUpdate {
    pub name: Option<String>,
    pub kind: Option<PreparationKind>,
    pub image_url: Option<Option<String>>,
    pub components: Option<Vec<NewComponent>>,
}

/// A preparation with its recipe lines.
#[derive(Debug, Clone, Serialize)]
pub struct PreparationDetail {
    #[serde(flatten)]
    pub preparation: preparation::Model,
    pub components: Vec<preparation_component::Model>,
}

/// Outcome of one production run.
#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutcome {
    pub preparation_id: i32,
    pub produced_quantity: Decimal,
    pub location_id: i32,
    pub new_stock_at_location: Decimal,
}

#[derive(Clone)]
pub struct PreparationService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl PreparationService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a preparation and its recipe in one transaction.
    #[instrument(skip(self, new))]
    pub async fn create(
        &self,
        company_id: i32,
        new: NewPreparation,
    ) -> Result<PreparationDetail, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Preparation name cannot be empty".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let created = preparation::ActiveModel {
            company_id: Set(company_id),
            name: Set(new.name),
            unit: Set(new.unit),
            kind: Set(new.kind),
            image_url: Set(new.image_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let components =
            insert_components(&txn, company_id, &created, &new.components).await?;
        txn.commit().await?;

        info!("Created preparation {} ({})", created.id, created.name);
        Ok(PreparationDetail {
            preparation: created,
            components,
        })
    }

    /// Applies a partial update; replaces the recipe when given.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        company_id: i32,
        preparation_id: i32,
        update: PreparationUpdate,
    ) -> Result<PreparationDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = load_scoped(&txn, company_id, preparation_id).await?;

        let mut active: preparation::ActiveModel = existing.into();
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Preparation name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(kind) = update.kind {
            active.kind = Set(kind);
        }
        if let Some(image_url) = update.image_url {
            active.image_url = Set(image_url);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let components = match update.components {
            Some(components) => {
                preparation_component::Entity::delete_many()
                    .filter(preparation_component::Column::PreparationId.eq(updated.id))
                    .exec(&txn)
                    .await?;
                insert_components(&txn, company_id, &updated, &components).await?
            }
            None => {
                preparation_component::Entity::find()
                    .filter(preparation_component::Column::PreparationId.eq(updated.id))
                    .all(&txn)
                    .await?
            }
        };

        txn.commit().await?;
        Ok(PreparationDetail {
            preparation: updated,
            components,
        })
    }

    /// Deletes a preparation with its recipe and pivots. Rejected while
    /// menus or other preparations reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, preparation_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = load_scoped(&txn, company_id, preparation_id).await?;

        let in_menus = menu_item::Entity::find()
            .filter(menu_item::Column::StockableKind.eq(StockableKind::Preparation))
            .filter(menu_item::Column::StockableId.eq(existing.id))
            .count(&txn)
            .await?;
        let in_preparations = preparation_component::Entity::find()
            .filter(preparation_component::Column::ComponentKind.eq(StockableKind::Preparation))
            .filter(preparation_component::Column::ComponentId.eq(existing.id))
            .count(&txn)
            .await?;
        if in_menus + in_preparations > 0 {
            return Err(ServiceError::Conflict(format!(
                "{} is referenced by {} recipe lines and cannot be deleted",
                existing.name,
                in_menus + in_preparations
            )));
        }

        preparation_component::Entity::delete_many()
            .filter(preparation_component::Column::PreparationId.eq(existing.id))
            .exec(&txn)
            .await?;
        preparation_location::Entity::delete_many()
            .filter(preparation_location::Column::PreparationId.eq(existing.id))
            .exec(&txn)
            .await?;
        preparation::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted preparation {}", preparation_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        company_id: i32,
        preparation_id: i32,
    ) -> Result<PreparationDetail, ServiceError> {
        let preparation = load_scoped(&*self.db, company_id, preparation_id).await?;
        let components = preparation_component::Entity::find()
            .filter(preparation_component::Column::PreparationId.eq(preparation.id))
            .all(&*self.db)
            .await?;
        Ok(PreparationDetail {
            preparation,
            components,
        })
    }

    /// Lists a company's preparations by name.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<preparation::Model>, u64), ServiceError> {
        let mut query = preparation::Entity::find()
            .filter(preparation::Column::CompanyId.eq(company_id))
            .order_by_asc(preparation::Column::Name);
        if let Some(fragment) = search {
            if !fragment.trim().is_empty() {
                query = query.filter(preparation::Column::Name.contains(fragment.trim()));
            }
        }
        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    /// Produces `quantity` (in the preparation's unit) at a location,
    /// consuming each component from the same location.
    ///
    /// Every withdrawal and the final credit happen in one transaction; a
    /// single under-stocked component aborts the whole run.
    #[instrument(skip(self))]
    pub async fn prepare(
        &self,
        company_id: i32,
        user_id: Option<i32>,
        preparation_id: i32,
        location_id: i32,
        quantity: Decimal,
    ) -> Result<ProductionOutcome, ServiceError> {
        if quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Production quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let preparation = load_scoped(&txn, company_id, preparation_id).await?;

        let location = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await?
            .filter(|l| l.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", location_id))
            })?;

        let components = preparation_component::Entity::find()
            .filter(preparation_component::Column::PreparationId.eq(preparation.id))
            .all(&txn)
            .await?;
        if components.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "{} has no recipe and cannot be produced",
                preparation.name
            )));
        }

        let produced = round2(quantity);
        for component in &components {
            let entity =
                stockable::info(&txn, component.component_kind, component.component_id).await?;
            let needed = round2(convert(
                component.quantity * produced,
                component.unit,
                entity.unit,
            )?);
            if needed <= Decimal::ZERO {
                continue;
            }

            let available = stockable::quantity_at(
                &txn,
                component.component_kind,
                component.component_id,
                location.id,
                true,
            )
            .await?
            .unwrap_or(Decimal::ZERO);
            if available < needed {
                return Err(ServiceError::InsufficientStock(format!(
                    "Cannot produce {} of {}: need {} {} of {} at {}, have {}",
                    produced,
                    preparation.name,
                    needed,
                    entity.unit,
                    entity.name,
                    location.name,
                    available
                )));
            }

            let left = round2(available - needed);
            stockable::set_quantity(
                &txn,
                component.component_kind,
                component.component_id,
                location.id,
                left,
            )
            .await?;
            stock_movements::record(
                &txn,
                &entity,
                &location,
                user_id,
                available,
                left,
                Some(PRODUCTION_REASON),
            )
            .await?;

            if component.component_kind == StockableKind::Ingredient {
                if let Some(model) = ingredient::Entity::find_by_id(component.component_id)
                    .one(&txn)
                    .await?
                {
                    perishables::remove_within(&txn, company_id, &model, &location, needed).await?;
                }
            }
        }

        let prep_info = stockable::info(&txn, StockableKind::Preparation, preparation.id).await?;
        let old = stockable::quantity_at(&txn, StockableKind::Preparation, preparation.id, location.id, true)
            .await?
            .unwrap_or(Decimal::ZERO);
        let new = round2(old + produced);
        stockable::set_quantity(&txn, StockableKind::Preparation, preparation.id, location.id, new)
            .await?;
        stock_movements::record(
            &txn,
            &prep_info,
            &location,
            user_id,
            old,
            new,
            Some(PRODUCTION_REASON),
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockAdded {
                stockable_kind: StockableKind::Preparation,
                stockable_id: preparation.id,
                location_id: location.id,
                quantity: produced,
            })
            .await;

        info!(
            "Produced {} {} of {} at {}",
            produced, preparation.unit, preparation.name, location.name
        );
        Ok(ProductionOutcome {
            preparation_id: preparation.id,
            produced_quantity: produced,
            location_id: location.id,
            new_stock_at_location: new,
        })
    }
}

async fn load_scoped<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    preparation_id: i32,
) -> Result<preparation::Model, ServiceError> {
    preparation::Entity::find_by_id(preparation_id)
        .one(db)
        .await?
        .filter(|p| p.company_id == company_id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Preparation {} not found", preparation_id))
        })
}

/// Validates and inserts recipe lines. Simple preparations take ingredient
/// components only; composite ones may nest other preparations, but never
/// themselves.
async fn insert_components<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    preparation: &preparation::Model,
    components: &[NewComponent],
) -> Result<Vec<preparation_component::Model>, ServiceError> {
    let mut created = Vec::with_capacity(components.len());
    for component in components {
        if component.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Component quantities must be positive".to_string(),
            ));
        }
        if preparation.kind == PreparationKind::Simple
            && component.component_kind == StockableKind::Preparation
        {
            return Err(ServiceError::ValidationError(format!(
                "{} is a simple preparation and can only contain ingredients",
                preparation.name
            )));
        }
        if component.component_kind == StockableKind::Preparation
            && component.component_id == preparation.id
        {
            return Err(ServiceError::ValidationError(format!(
                "{} cannot contain itself",
                preparation.name
            )));
        }

        let entity =
            stockable::info(db, component.component_kind, component.component_id).await?;
        if entity.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "{} {} belongs to a different company",
                component.component_kind, component.component_id
            )));
        }
        // The line's unit must convert into the component's at production.
        convert(component.quantity, component.unit, entity.unit)?;

        let now = Utc::now();
        let row = preparation_component::ActiveModel {
            preparation_id: Set(preparation.id),
            component_kind: Set(component.component_kind),
            component_id: Set(component.component_id),
            quantity: Set(component.quantity),
            unit: Set(component.unit),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(row);
    }
    Ok(created)
}
