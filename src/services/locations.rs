//! Storage locations and their types.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::{
    category_location_type, ingredient_location, location, location_type, menu_item, perishable,
    preparation_location,
};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct LocationService {
    db: Arc<DbPool>,
}

impl LocationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_type(
        &self,
        company_id: i32,
        name: String,
    ) -> Result<location_type::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Location type name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let created = location_type::ActiveModel {
            company_id: Set(company_id),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!("Created location type {} ({})", created.id, created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn rename_type(
        &self,
        company_id: i32,
        type_id: i32,
        name: String,
    ) -> Result<location_type::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Location type name cannot be empty".to_string(),
            ));
        }
        let existing = self.load_type(company_id, type_id).await?;
        let mut active: location_type::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a location type. Rejected while locations or shelf-life
    /// rules still use it.
    #[instrument(skip(self))]
    pub async fn delete_type(&self, company_id: i32, type_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = location_type::Entity::find_by_id(type_id)
            .one(&txn)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location type {} not found", type_id))
            })?;

        let locations = location::Entity::find()
            .filter(location::Column::LocationTypeId.eq(existing.id))
            .count(&txn)
            .await?;
        let rules = category_location_type::Entity::find()
            .filter(category_location_type::Column::LocationTypeId.eq(existing.id))
            .count(&txn)
            .await?;
        if locations + rules > 0 {
            return Err(ServiceError::Conflict(format!(
                "Location type {} is still in use",
                existing.name
            )));
        }

        location_type::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_types(
        &self,
        company_id: i32,
    ) -> Result<Vec<location_type::Model>, ServiceError> {
        Ok(location_type::Entity::find()
            .filter(location_type::Column::CompanyId.eq(company_id))
            .order_by_asc(location_type::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        company_id: i32,
        location_type_id: i32,
        name: String,
    ) -> Result<location::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Location name cannot be empty".to_string(),
            ));
        }
        self.load_type(company_id, location_type_id).await?;

        let now = Utc::now();
        let created = location::ActiveModel {
            company_id: Set(company_id),
            location_type_id: Set(location_type_id),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!("Created location {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Renames a location or moves it to another type. Re-typing changes
    /// which shelf-life rules apply to future batches; existing batches
    /// keep their creation time and pick up the new rule on read.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        company_id: i32,
        location_id: i32,
        name: Option<String>,
        location_type_id: Option<i32>,
    ) -> Result<location::Model, ServiceError> {
        let existing = self.load(company_id, location_id).await?;
        if let Some(type_id) = location_type_id {
            self.load_type(company_id, type_id).await?;
        }

        let mut active: location::ActiveModel = existing.into();
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Location name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(type_id) = location_type_id {
            active.location_type_id = Set(type_id);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a location. Rejected while stock, batches, or recipes still
    /// point at it.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, location_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await?
            .filter(|l| l.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", location_id))
            })?;

        let ingredient_pivots = ingredient_location::Entity::find()
            .filter(ingredient_location::Column::LocationId.eq(existing.id))
            .count(&txn)
            .await?;
        let preparation_pivots = preparation_location::Entity::find()
            .filter(preparation_location::Column::LocationId.eq(existing.id))
            .count(&txn)
            .await?;
        let batches = perishable::Entity::find()
            .filter(perishable::Column::LocationId.eq(existing.id))
            .filter(perishable::Column::DeletedAt.is_null())
            .count(&txn)
            .await?;
        let recipes = menu_item::Entity::find()
            .filter(menu_item::Column::LocationId.eq(existing.id))
            .count(&txn)
            .await?;
        if ingredient_pivots + preparation_pivots + batches + recipes > 0 {
            return Err(ServiceError::Conflict(format!(
                "Location {} is still in use",
                existing.name
            )));
        }

        location::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        info!("Deleted location {}", location_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        company_id: i32,
        location_id: i32,
    ) -> Result<location::Model, ServiceError> {
        self.load(company_id, location_id).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, company_id: i32) -> Result<Vec<location::Model>, ServiceError> {
        Ok(location::Entity::find()
            .filter(location::Column::CompanyId.eq(company_id))
            .order_by_asc(location::Column::Name)
            .all(&*self.db)
            .await?)
    }

    async fn load(
        &self,
        company_id: i32,
        location_id: i32,
    ) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(location_id)
            .one(&*self.db)
            .await?
            .filter(|l| l.company_id == company_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))
    }

    async fn load_type(
        &self,
        company_id: i32,
        type_id: i32,
    ) -> Result<location_type::Model, ServiceError> {
        location_type::Entity::find_by_id(type_id)
            .one(&*self.db)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location type {} not found", type_id))
            })
    }
}
