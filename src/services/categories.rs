//! Ingredient categories and their shelf-life rules.
//!
//! A shelf-life rule says how many hours an ingredient of a category keeps
//! at locations of a given type. Adding or changing a rule only affects how
//! existing batches' expirations are computed; batches themselves are not
//! touched.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::{category, category_location_type, ingredient, location_type};
use crate::errors::ServiceError;

/// A category with its shelf-life rules.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: category::Model,
    pub shelf_life_rules: Vec<category_location_type::Model>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        company_id: i32,
        name: String,
    ) -> Result<category::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let created = category::ActiveModel {
            company_id: Set(company_id),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!("Created category {} ({})", created.id, created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn rename(
        &self,
        company_id: i32,
        category_id: i32,
        name: String,
    ) -> Result<category::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        let existing = load_scoped(&*self.db, company_id, category_id).await?;
        let mut active: category::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a category and its rules. Rejected while ingredients are
    /// still categorized under it.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, category_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .filter(|c| c.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })?;

        let in_use = ingredient::Entity::find()
            .filter(ingredient::Column::CategoryId.eq(existing.id))
            .count(&txn)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} ingredients",
                existing.name, in_use
            )));
        }

        category_location_type::Entity::delete_many()
            .filter(category_location_type::Column::CategoryId.eq(existing.id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        info!("Deleted category {}", category_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        company_id: i32,
        category_id: i32,
    ) -> Result<CategoryDetail, ServiceError> {
        let category = load_scoped(&*self.db, company_id, category_id).await?;
        let shelf_life_rules = category_location_type::Entity::find()
            .filter(category_location_type::Column::CategoryId.eq(category.id))
            .all(&*self.db)
            .await?;
        Ok(CategoryDetail {
            category,
            shelf_life_rules,
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, company_id: i32) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .filter(category::Column::CompanyId.eq(company_id))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Sets the shelf life for a (category, location type) pair, creating
    /// or updating the rule.
    #[instrument(skip(self))]
    pub async fn set_shelf_life(
        &self,
        company_id: i32,
        category_id: i32,
        location_type_id: i32,
        shelf_life_hours: i32,
    ) -> Result<category_location_type::Model, ServiceError> {
        if shelf_life_hours < 1 {
            return Err(ServiceError::ValidationError(
                "Shelf life must be at least one hour".to_string(),
            ));
        }

        load_scoped(&*self.db, company_id, category_id).await?;
        location_type::Entity::find_by_id(location_type_id)
            .one(&*self.db)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location type {} not found", location_type_id))
            })?;

        let existing = category_location_type::Entity::find()
            .filter(category_location_type::Column::CategoryId.eq(category_id))
            .filter(category_location_type::Column::LocationTypeId.eq(location_type_id))
            .one(&*self.db)
            .await?;

        let rule = match existing {
            Some(rule) => {
                let mut active: category_location_type::ActiveModel = rule.into();
                active.shelf_life_hours = Set(shelf_life_hours);
                active.updated_at = Set(Utc::now());
                active.update(&*self.db).await?
            }
            None => {
                let now = Utc::now();
                category_location_type::ActiveModel {
                    category_id: Set(category_id),
                    location_type_id: Set(location_type_id),
                    shelf_life_hours: Set(shelf_life_hours),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!(
            "Shelf life for category {} at type {} set to {}h",
            category_id, location_type_id, shelf_life_hours
        );
        Ok(rule)
    }

    /// Removes the rule, making the combination non-perishable. Batches at
    /// affected locations fall back to the never-expiring sentinel.
    #[instrument(skip(self))]
    pub async fn remove_shelf_life(
        &self,
        company_id: i32,
        category_id: i32,
        location_type_id: i32,
    ) -> Result<(), ServiceError> {
        load_scoped(&*self.db, company_id, category_id).await?;
        let deleted = category_location_type::Entity::delete_many()
            .filter(category_location_type::Column::CategoryId.eq(category_id))
            .filter(category_location_type::Column::LocationTypeId.eq(location_type_id))
            .exec(&*self.db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "No shelf-life rule for category {} at location type {}",
                category_id, location_type_id
            )));
        }
        Ok(())
    }
}

async fn load_scoped<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    category_id: i32,
) -> Result<category::Model, ServiceError> {
    category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .filter(|c| c.company_id == company_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
}
