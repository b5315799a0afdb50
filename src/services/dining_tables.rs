//! Dining tables.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, instrument};

use crate::db::DbPool;
use crate::entities::sea_orm_active_enums::OrderStatus;
use crate::entities::{dining_table, order};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct DiningTableService {
    db: Arc<DbPool>,
}

impl DiningTableService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        company_id: i32,
        name: String,
    ) -> Result<dining_table::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Table name cannot be empty".to_string(),
            ));
        }
        let now = Utc::now();
        let created = dining_table::ActiveModel {
            company_id: Set(company_id),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        info!("Created table {} ({})", created.id, created.name);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn rename(
        &self,
        company_id: i32,
        table_id: i32,
        name: String,
    ) -> Result<dining_table::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Table name cannot be empty".to_string(),
            ));
        }
        let existing = self.load(company_id, table_id).await?;
        let mut active: dining_table::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes a table. Rejected while an order is still open on it.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, table_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = dining_table::Entity::find_by_id(table_id)
            .one(&txn)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", table_id)))?;

        let open_orders = order::Entity::find()
            .filter(order::Column::DiningTableId.eq(existing.id))
            .filter(order::Column::Status.is_in([OrderStatus::Pending, OrderStatus::Served]))
            .count(&txn)
            .await?;
        if open_orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Table {} still has {} open orders",
                existing.name, open_orders
            )));
        }

        dining_table::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;
        info!("Deleted table {}", table_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        company_id: i32,
        table_id: i32,
    ) -> Result<dining_table::Model, ServiceError> {
        self.load(company_id, table_id).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, company_id: i32) -> Result<Vec<dining_table::Model>, ServiceError> {
        Ok(dining_table::Entity::find()
            .filter(dining_table::Column::CompanyId.eq(company_id))
            .order_by_asc(dining_table::Column::Name)
            .all(&*self.db)
            .await?)
    }

    async fn load(
        &self,
        company_id: i32,
        table_id: i32,
    ) -> Result<dining_table::Model, ServiceError> {
        dining_table::Entity::find_by_id(table_id)
            .one(&*self.db)
            .await?
            .filter(|t| t.company_id == company_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", table_id)))
    }
}
