//! Ingredient catalog, low-stock insight, and in-stock search.

use std::collections::HashMap;
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
use crate::entities::sea_orm_active_enums::{Allergen, Allergens, MeasurementUnit, StockableKind};
use crate::entities::{
    category, category_location_type, ingredient, ingredient_location, menu_item, perishable,
    preparation, preparation_component, preparation_location,
};
use crate::errors::ServiceError;
use crate::services::conversion::round2;

/// Fields for creating an ingredient.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub unit: MeasurementUnit,
    pub category_id: Option<i32>,
    pub threshold: Option<Decimal>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    pub allergens: Vec<Allergen>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Default, Clone)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub unit: Option<MeasurementUnit>,
    pub category_id: Option<Option<i32>>,
    pub threshold: Option<Option<Decimal>>,
    pub barcode: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    /// An empty list clears the declarations.
    pub allergens: Option<Vec<Allergen>>,
}

/// An ingredient with its total quantity across all locations.
#[derive(Debug, Clone, Serialize)]
pub struct IngredientWithStock {
    #[serde(flatten)]
    pub ingredient: ingredient::Model,
    pub total_quantity: Decimal,
}

/// One hit of the in-stock search, tagged with the entity family.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub kind: StockableKind,
    pub id: i32,
    pub name: String,
    pub unit: MeasurementUnit,
    pub total_quantity: Decimal,
}

#[derive(Clone)]
pub struct IngredientService {
    db: Arc<DbPool>,
}

impl IngredientService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, new))]
    pub async fn create(
        &self,
        company_id: i32,
        new: NewIngredient,
    ) -> Result<ingredient::Model, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Ingredient name cannot be empty".to_string(),
            ));
        }
        if let Some(threshold) = new.threshold {
            if threshold < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Threshold cannot be negative".to_string(),
                ));
            }
        }
        if let Some(category_id) = new.category_id {
            check_category(&*self.db, company_id, category_id).await?;
        }

        let now = Utc::now();
        let created = ingredient::ActiveModel {
            company_id: Set(company_id),
            name: Set(new.name),
            unit: Set(new.unit),
            category_id: Set(new.category_id),
            threshold: Set(new.threshold.map(round2)),
            barcode: Set(new.barcode),
            image_url: Set(new.image_url),
            allergens: Set(Allergens::normalized(new.allergens)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!("Created ingredient {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Applies a partial update. Changing the unit is rejected while stock
    /// is held anywhere, because stored quantities do not re-convert.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        company_id: i32,
        ingredient_id: i32,
        update: IngredientUpdate,
    ) -> Result<ingredient::Model, ServiceError> {
        let existing = self.load(company_id, ingredient_id).await?;

        if let Some(unit) = update.unit {
            if unit != existing.unit {
                let total = total_ingredient_stock(&*self.db, existing.id).await?;
                if total > Decimal::ZERO {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Cannot change the unit of {} while stock is held",
                        existing.name
                    )));
                }
            }
        }
        if let Some(Some(category_id)) = update.category_id {
            check_category(&*self.db, company_id, category_id).await?;
        }

        let mut active: ingredient::ActiveModel = existing.into();
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Ingredient name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(unit) = update.unit {
            active.unit = Set(unit);
        }
        if let Some(category_id) = update.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(threshold) = update.threshold {
            if let Some(value) = threshold {
                if value < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "Threshold cannot be negative".to_string(),
                    ));
                }
            }
            active.threshold = Set(threshold.map(round2));
        }
        if let Some(barcode) = update.barcode {
            active.barcode = Set(barcode);
        }
        if let Some(image_url) = update.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(allergens) = update.allergens {
            active.allergens = Set(Allergens::normalized(allergens));
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db).await?)
    }

    /// Deletes an ingredient together with its pivots and batches. Rejected
    /// while recipes still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, ingredient_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = ingredient::Entity::find_by_id(ingredient_id)
            .one(&txn)
            .await?
            .filter(|i| i.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", ingredient_id))
            })?;

        let in_menus = menu_item::Entity::find()
            .filter(menu_item::Column::StockableKind.eq(StockableKind::Ingredient))
            .filter(menu_item::Column::StockableId.eq(existing.id))
            .count(&txn)
            .await?;
        let in_preparations = preparation_component::Entity::find()
            .filter(preparation_component::Column::ComponentKind.eq(StockableKind::Ingredient))
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

        ingredient_location::Entity::delete_many()
            .filter(ingredient_location::Column::IngredientId.eq(existing.id))
            .exec(&txn)
            .await?;
        perishable::Entity::delete_many()
            .filter(perishable::Column::IngredientId.eq(existing.id))
            .exec(&txn)
            .await?;
        ingredient::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted ingredient {}", ingredient_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        company_id: i32,
        ingredient_id: i32,
    ) -> Result<IngredientWithStock, ServiceError> {
        let ingredient = self.load(company_id, ingredient_id).await?;
        let total_quantity = total_ingredient_stock(&*self.db, ingredient.id).await?;
        Ok(IngredientWithStock {
            ingredient,
            total_quantity,
        })
    }

    /// Lists a company's ingredients by name, optionally filtered by a
    /// case-insensitive name fragment.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<ingredient::Model>, u64), ServiceError> {
        let mut query = ingredient::Entity::find()
            .filter(ingredient::Column::CompanyId.eq(company_id))
            .order_by_asc(ingredient::Column::Name);
        if let Some(fragment) = search {
            if !fragment.trim().is_empty() {
                query = query.filter(ingredient::Column::Name.contains(fragment.trim()));
            }
        }
        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    /// Ingredients whose total stock across locations fell below their
    /// alert threshold. Ingredients without a threshold never appear.
    #[instrument(skip(self))]
    pub async fn below_threshold(
        &self,
        company_id: i32,
    ) -> Result<Vec<IngredientWithStock>, ServiceError> {
        let candidates = ingredient::Entity::find()
            .filter(ingredient::Column::CompanyId.eq(company_id))
            .filter(ingredient::Column::Threshold.is_not_null())
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?;

        let totals = ingredient_totals(&*self.db, &candidates).await?;
        Ok(candidates
            .into_iter()
            .filter_map(|ingredient| {
                let total = totals.get(&ingredient.id).copied().unwrap_or(Decimal::ZERO);
                match ingredient.threshold {
                    Some(threshold) if total < threshold => Some(IngredientWithStock {
                        ingredient,
                        total_quantity: total,
                    }),
                    _ => None,
                }
            })
            .collect())
    }

    /// Ingredients that no shelf-life rule applies to: either uncategorized,
    /// or in a category with no rule for any location type.
    #[instrument(skip(self))]
    pub async fn non_perishable(
        &self,
        company_id: i32,
    ) -> Result<Vec<ingredient::Model>, ServiceError> {
        let ingredients = ingredient::Entity::find()
            .filter(ingredient::Column::CompanyId.eq(company_id))
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?;

        let rules = category_location_type::Entity::find()
            .all(&*self.db)
            .await?;
        let perishable_categories: Vec<i32> = rules.iter().map(|r| r.category_id).collect();

        Ok(ingredients
            .into_iter()
            .filter(|ingredient| match ingredient.category_id {
                None => true,
                Some(category_id) => !perishable_categories.contains(&category_id),
            })
            .collect())
    }

    /// Name search over ingredients and preparations that currently hold
    /// stock somewhere.
    #[instrument(skip(self))]
    pub async fn search_in_stock(
        &self,
        company_id: i32,
        keyword: &str,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let ingredients = ingredient::Entity::find()
            .filter(ingredient::Column::CompanyId.eq(company_id))
            .filter(ingredient::Column::Name.contains(keyword))
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?;
        let ingredient_sums = ingredient_totals(&*self.db, &ingredients).await?;

        let preparations = preparation::Entity::find()
            .filter(preparation::Column::CompanyId.eq(company_id))
            .filter(preparation::Column::Name.contains(keyword))
            .order_by_asc(preparation::Column::Name)
            .all(&*self.db)
            .await?;

        let mut hits = Vec::new();
        for ingredient in ingredients {
            let total = ingredient_sums
                .get(&ingredient.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            if total > Decimal::ZERO {
                hits.push(SearchHit {
                    kind: StockableKind::Ingredient,
                    id: ingredient.id,
                    name: ingredient.name,
                    unit: ingredient.unit,
                    total_quantity: total,
                });
            }
        }
        for preparation in preparations {
            let total = total_preparation_stock(&*self.db, preparation.id).await?;
            if total > Decimal::ZERO {
                hits.push(SearchHit {
                    kind: StockableKind::Preparation,
                    id: preparation.id,
                    name: preparation.name,
                    unit: preparation.unit,
                    total_quantity: total,
                });
            }
        }

        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }

    async fn load(
        &self,
        company_id: i32,
        ingredient_id: i32,
    ) -> Result<ingredient::Model, ServiceError> {
        ingredient::Entity::find_by_id(ingredient_id)
            .one(&*self.db)
            .await?
            .filter(|i| i.company_id == company_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", ingredient_id))
            })
    }
}

/// Total quantity of one ingredient across every location.
pub async fn total_ingredient_stock<C: ConnectionTrait>(
    db: &C,
    ingredient_id: i32,
) -> Result<Decimal, ServiceError> {
    let pivots = ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.eq(ingredient_id))
        .all(db)
        .await?;
    Ok(round2(pivots.iter().map(|p| p.quantity).sum()))
}

/// Total quantity of one preparation across every location.
pub async fn total_preparation_stock<C: ConnectionTrait>(
    db: &C,
    preparation_id: i32,
) -> Result<Decimal, ServiceError> {
    let pivots = preparation_location::Entity::find()
        .filter(preparation_location::Column::PreparationId.eq(preparation_id))
        .all(db)
        .await?;
    Ok(round2(pivots.iter().map(|p| p.quantity).sum()))
}

/// Sums pivot quantities for a batch of ingredients in one query.
async fn ingredient_totals<C: ConnectionTrait>(
    db: &C,
    ingredients: &[ingredient::Model],
) -> Result<HashMap<i32, Decimal>, ServiceError> {
    if ingredients.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<i32> = ingredients.iter().map(|i| i.id).collect();
    let pivots = ingredient_location::Entity::find()
        .filter(ingredient_location::Column::IngredientId.is_in(ids))
        .all(db)
        .await?;

    let mut totals: HashMap<i32, Decimal> = HashMap::new();
    for pivot in pivots {
        *totals.entry(pivot.ingredient_id).or_default() += pivot.quantity;
    }
    for total in totals.values_mut() {
        *total = round2(*total);
    }
    Ok(totals)
}

async fn check_category<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    category_id: i32,
) -> Result<(), ServiceError> {
    let found = category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .filter(|c| c.company_id == company_id);
    if found.is_none() {
        return Err(ServiceError::NotFound(format!(
            "Category {} not found",
            category_id
        )));
    }
    Ok(())
}
