//! Static resolution of `(StockableKind, id)` references.
//!
//! Losses, stock movements, menu items, and preparation components all point
//! at "an ingredient or a preparation". The shared behavior lives in the
//! [`Stockable`] trait, implemented once per entity family; callers holding
//! only a discriminant go through the kind-dispatching free functions.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QuerySelect, Set,
};

use crate::entities::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use crate::entities::{ingredient, ingredient_location, preparation, preparation_location};
use crate::errors::ServiceError;

/// Core fields shared by every stockable entity.
#[derive(Debug, Clone)]
pub struct StockableInfo {
    pub kind: StockableKind,
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub unit: MeasurementUnit,
}

/// Shared stock behavior of the two stockable entity families.
#[async_trait]
pub trait Stockable {
    const KIND: StockableKind;

    async fn info<C: ConnectionTrait>(db: &C, id: i32)
        -> Result<Option<StockableInfo>, ServiceError>;

    /// Quantity held at a location; `None` when the entity was never stocked
    /// there. `for_update` takes a row lock on Postgres. SQLite has no row
    /// locks and serializes writers on its own.
    async fn quantity_at<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        for_update: bool,
    ) -> Result<Option<Decimal>, ServiceError>;

    /// Writes the pivot row, creating it when missing. The quantity must
    /// already be rounded and non-negative.
    async fn set_quantity<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        quantity: Decimal,
    ) -> Result<(), ServiceError>;
}

#[async_trait]
impl Stockable for ingredient::Entity {
    const KIND: StockableKind = StockableKind::Ingredient;

    async fn info<C: ConnectionTrait>(
        db: &C,
        id: i32,
    ) -> Result<Option<StockableInfo>, ServiceError> {
        Ok(ingredient::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|model| StockableInfo {
                kind: Self::KIND,
                id: model.id,
                company_id: model.company_id,
                name: model.name,
                unit: model.unit,
            }))
    }

    async fn quantity_at<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        for_update: bool,
    ) -> Result<Option<Decimal>, ServiceError> {
        let mut query = ingredient_location::Entity::find()
            .filter(ingredient_location::Column::IngredientId.eq(id))
            .filter(ingredient_location::Column::LocationId.eq(location_id));
        if for_update && db.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        Ok(query.one(db).await?.map(|pivot| pivot.quantity))
    }

    async fn set_quantity<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        quantity: Decimal,
    ) -> Result<(), ServiceError> {
        let existing = ingredient_location::Entity::find()
            .filter(ingredient_location::Column::IngredientId.eq(id))
            .filter(ingredient_location::Column::LocationId.eq(location_id))
            .one(db)
            .await?;

        match existing {
            Some(pivot) => {
                let mut pivot: ingredient_location::ActiveModel = pivot.into();
                pivot.quantity = Set(quantity);
                pivot.updated_at = Set(Utc::now());
                pivot.update(db).await?;
            }
            None => {
                ingredient_location::ActiveModel {
                    ingredient_id: Set(id),
                    location_id: Set(location_id),
                    quantity: Set(quantity),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stockable for preparation::Entity {
    const KIND: StockableKind = StockableKind::Preparation;

    async fn info<C: ConnectionTrait>(
        db: &C,
        id: i32,
    ) -> Result<Option<StockableInfo>, ServiceError> {
        Ok(preparation::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(|model| StockableInfo {
                kind: Self::KIND,
                id: model.id,
                company_id: model.company_id,
                name: model.name,
                unit: model.unit,
            }))
    }

    async fn quantity_at<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        for_update: bool,
    ) -> Result<Option<Decimal>, ServiceError> {
        let mut query = preparation_location::Entity::find()
            .filter(preparation_location::Column::PreparationId.eq(id))
            .filter(preparation_location::Column::LocationId.eq(location_id));
        if for_update && db.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        Ok(query.one(db).await?.map(|pivot| pivot.quantity))
    }

    async fn set_quantity<C: ConnectionTrait>(
        db: &C,
        id: i32,
        location_id: i32,
        quantity: Decimal,
    ) -> Result<(), ServiceError> {
        let existing = preparation_location::Entity::find()
            .filter(preparation_location::Column::PreparationId.eq(id))
            .filter(preparation_location::Column::LocationId.eq(location_id))
            .one(db)
            .await?;

        match existing {
            Some(pivot) => {
                let mut pivot: preparation_location::ActiveModel = pivot.into();
                pivot.quantity = Set(quantity);
                pivot.updated_at = Set(Utc::now());
                pivot.update(db).await?;
            }
            None => {
                preparation_location::ActiveModel {
                    preparation_id: Set(id),
                    location_id: Set(location_id),
                    quantity: Set(quantity),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }
        Ok(())
    }
}

/// Loads the entity behind a `(kind, id)` reference, or `NotFound`.
pub async fn info<C: ConnectionTrait>(
    db: &C,
    kind: StockableKind,
    id: i32,
) -> Result<StockableInfo, ServiceError> {
    let info = match kind {
        StockableKind::Ingredient => ingredient::Entity::info(db, id).await?,
        StockableKind::Preparation => preparation::Entity::info(db, id).await?,
    };
    info.ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", kind, id)))
}

pub async fn quantity_at<C: ConnectionTrait>(
    db: &C,
    kind: StockableKind,
    id: i32,
    location_id: i32,
    for_update: bool,
) -> Result<Option<Decimal>, ServiceError> {
    match kind {
        StockableKind::Ingredient => {
            ingredient::Entity::quantity_at(db, id, location_id, for_update).await
        }
        StockableKind::Preparation => {
            preparation::Entity::quantity_at(db, id, location_id, for_update).await
        }
    }
}

pub async fn set_quantity<C: ConnectionTrait>(
    db: &C,
    kind: StockableKind,
    id: i32,
    location_id: i32,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    match kind {
        StockableKind::Ingredient => {
            ingredient::Entity::set_quantity(db, id, location_id, quantity).await
        }
        StockableKind::Preparation => {
            preparation::Entity::set_quantity(db, id, location_id, quantity).await
        }
    }
}
