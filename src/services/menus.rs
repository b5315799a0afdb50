//! Menu catalog and availability.
//!
//! A menu carries a recipe (`menu_items`) that decides what gets lost when a
//! portion is canceled after cooking, and how many portions the current
//! stock can cover. The public restaurant card is served from here too.

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
    Allergen, MeasurementUnit, MenuServiceKind, StockableKind,
};
use crate::entities::{company, company_business_hour, ingredient, location, menu, menu_item, step_menu};
use crate::errors::ServiceError;
use crate::services::conversion::convert;
use crate::services::stockable;

/// One recipe line when creating or replacing a menu's items.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub stockable_kind: StockableKind,
    pub stockable_id: i32,
    pub location_id: i32,
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
}

/// Fields for creating a menu.
#[derive(Debug, Clone)]
pub struct NewMenu {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub service_kind: MenuServiceKind,
    pub is_returnable: bool,
    pub image_url: Option<String>,
    pub public_priority: i32,
    pub items: Vec<NewMenuItem>,
}

/// Partial update; `None` leaves the field untouched. `items` replaces the
/// whole recipe when present.
#[derive(Debug, Default, Clone)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub service_kind: Option<MenuServiceKind>,
    pub is_returnable: Option<bool>,
    pub image_url: Option<Option<String>>,
    pub public_priority: Option<i32>,
    pub items: Option<Vec<NewMenuItem>>,
}

/// A menu with its recipe lines.
#[derive(Debug, Clone, Serialize)]
pub struct MenuDetail {
    #[serde(flatten)]
    pub menu: menu::Model,
    pub items: Vec<menu_item::Model>,
}

/// One entry of the public restaurant card.
#[derive(Debug, Clone, Serialize)]
pub struct PublicMenu {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub has_sufficient_stock: bool,
    /// Union of the declared allergens of the menu's ingredients.
    pub allergens: Vec<Allergen>,
}

/// One opening range as rendered on the card.
#[derive(Debug, Clone, Serialize)]
pub struct PublicBusinessHour {
    pub day_of_week: i32,
    pub opens_at: String,
    pub closes_at: String,
    pub is_overnight: bool,
}

/// The public menu card of one restaurant.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantCard {
    pub restaurant_name: String,
    pub menus: Vec<PublicMenu>,
    pub business_hours: Vec<PublicBusinessHour>,
}

#[derive(Clone)]
pub struct MenuService {
    db: Arc<DbPool>,
}

impl MenuService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a menu and its recipe in one transaction.
    #[instrument(skip(self, menu))]
    pub async fn create(&self, company_id: i32, menu: NewMenu) -> Result<MenuDetail, ServiceError> {
        if menu.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Menu name cannot be empty".to_string(),
            ));
        }
        if menu.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Menu price cannot be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let created = menu::ActiveModel {
            company_id: Set(company_id),
            name: Set(menu.name),
            description: Set(menu.description),
            price: Set(menu.price),
            service_kind: Set(menu.service_kind),
            is_returnable: Set(menu.is_returnable),
            image_url: Set(menu.image_url),
            public_priority: Set(menu.public_priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let items = insert_items(&txn, company_id, created.id, &menu.items).await?;
        txn.commit().await?;

        info!("Created menu {} ({})", created.id, created.name);
        Ok(MenuDetail {
            menu: created,
            items,
        })
    }

    /// Applies a partial update; replaces the recipe when `items` is given.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        company_id: i32,
        menu_id: i32,
        update: MenuUpdate,
    ) -> Result<MenuDetail, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = load_scoped_menu(&txn, company_id, menu_id).await?;

        let mut active: menu::ActiveModel = existing.into();
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Menu name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        if let Some(price) = update.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Menu price cannot be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(service_kind) = update.service_kind {
            active.service_kind = Set(service_kind);
        }
        if let Some(is_returnable) = update.is_returnable {
            active.is_returnable = Set(is_returnable);
        }
        if let Some(image_url) = update.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(public_priority) = update.public_priority {
            active.public_priority = Set(public_priority);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        let items = match update.items {
            Some(items) => {
                menu_item::Entity::delete_many()
                    .filter(menu_item::Column::MenuId.eq(updated.id))
                    .exec(&txn)
                    .await?;
                insert_items(&txn, company_id, updated.id, &items).await?
            }
            None => {
                menu_item::Entity::find()
                    .filter(menu_item::Column::MenuId.eq(updated.id))
                    .all(&txn)
                    .await?
            }
        };

        txn.commit().await?;
        Ok(MenuDetail {
            menu: updated,
            items,
        })
    }

    /// Deletes a menu and its recipe. Menus referenced by order lines stay.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, menu_id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let existing = load_scoped_menu(&txn, company_id, menu_id).await?;

        let referenced = step_menu::Entity::find()
            .filter(step_menu::Column::MenuId.eq(existing.id))
            .count(&txn)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(format!(
                "Menu {} is used by {} order lines and cannot be deleted",
                existing.name, referenced
            )));
        }

        menu_item::Entity::delete_many()
            .filter(menu_item::Column::MenuId.eq(existing.id))
            .exec(&txn)
            .await?;
        menu::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!("Deleted menu {}", menu_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, company_id: i32, menu_id: i32) -> Result<MenuDetail, ServiceError> {
        let menu = load_scoped_menu(&*self.db, company_id, menu_id).await?;
        let items = menu_item::Entity::find()
            .filter(menu_item::Column::MenuId.eq(menu.id))
            .all(&*self.db)
            .await?;
        Ok(MenuDetail { menu, items })
    }

    /// Lists a company's menus, highest card priority first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        company_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<menu::Model>, u64), ServiceError> {
        let paginator = menu::Entity::find()
            .filter(menu::Column::CompanyId.eq(company_id))
            .order_by_desc(menu::Column::PublicPriority)
            .order_by_asc(menu::Column::Name)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.max(1) - 1).await?;
        Ok((items, total))
    }

    /// Whether current stock covers `servings` portions of the menu.
    #[instrument(skip(self))]
    pub async fn has_sufficient_stock(
        &self,
        company_id: i32,
        menu_id: i32,
        servings: i32,
    ) -> Result<bool, ServiceError> {
        let menu = load_scoped_menu(&*self.db, company_id, menu_id).await?;
        menu_has_sufficient_stock(&*self.db, &menu, servings).await
    }

    /// The public card for the restaurant reachable under `public_url`.
    ///
    /// No authentication: the slug itself is the lookup key. Images are
    /// stripped when the restaurant disabled them, and restaurants that
    /// turned off `show_out_of_stock_menus_on_card` get menus the kitchen
    /// cannot currently produce hidden instead of flagged.
    #[instrument(skip(self))]
    pub async fn restaurant_card(&self, public_url: &str) -> Result<RestaurantCard, ServiceError> {
        let company = company::Entity::find()
            .filter(company::Column::PublicMenuCardUrl.eq(public_url))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Restaurant not found".to_string()))?;

        let menus = menu::Entity::find()
            .filter(menu::Column::CompanyId.eq(company.id))
            .order_by_desc(menu::Column::PublicPriority)
            .order_by_asc(menu::Column::Name)
            .all(&*self.db)
            .await?;

        let mut entries = Vec::with_capacity(menus.len());
        for menu in menus {
            let available = menu_has_sufficient_stock(&*self.db, &menu, 1).await?;
            if !company.show_out_of_stock_menus_on_card && !available {
                continue;
            }
            let allergens = menu_allergens(&*self.db, menu.id).await?;
            entries.push(PublicMenu {
                name: menu.name,
                description: menu.description,
                price: menu.price,
                image_url: company.show_menu_images.then_some(menu.image_url).flatten(),
                has_sufficient_stock: available,
                allergens,
            });
        }

        let business_hours = company_business_hour::Entity::find()
            .filter(company_business_hour::Column::CompanyId.eq(company.id))
            .order_by_asc(company_business_hour::Column::DayOfWeek)
            .order_by_asc(company_business_hour::Column::Sequence)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|hour| PublicBusinessHour {
                day_of_week: hour.day_of_week,
                opens_at: hour.opens_at,
                closes_at: hour.closes_at,
                is_overnight: hour.is_overnight,
            })
            .collect();

        Ok(RestaurantCard {
            restaurant_name: company.name,
            menus: entries,
            business_hours,
        })
    }
}

/// Union of the declared allergens across a menu's ingredient lines.
/// Preparations do not carry declarations of their own.
async fn menu_allergens<C: ConnectionTrait>(
    db: &C,
    menu_id: i32,
) -> Result<Vec<Allergen>, ServiceError> {
    let ingredient_ids: Vec<i32> = menu_item::Entity::find()
        .filter(menu_item::Column::MenuId.eq(menu_id))
        .filter(menu_item::Column::StockableKind.eq(StockableKind::Ingredient))
        .all(db)
        .await?
        .into_iter()
        .map(|item| item.stockable_id)
        .collect();
    if ingredient_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut allergens: Vec<Allergen> = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids))
        .all(db)
        .await?
        .into_iter()
        .flat_map(|ingredient| ingredient.allergens.0)
        .collect();
    allergens.sort();
    allergens.dedup();
    Ok(allergens)
}

/// Checks every recipe line against the stock pivot at its location.
///
/// A menu without recipe lines is always available. A line whose entity or
/// pivot row is missing makes the menu unavailable rather than erroring;
/// the card must keep rendering while the catalog is being edited.
pub async fn menu_has_sufficient_stock<C: ConnectionTrait>(
    db: &C,
    menu: &menu::Model,
    servings: i32,
) -> Result<bool, ServiceError> {
    if servings < 1 {
        return Err(ServiceError::InvalidInput(
            "Servings must be at least 1".to_string(),
        ));
    }

    let items = menu_item::Entity::find()
        .filter(menu_item::Column::MenuId.eq(menu.id))
        .all(db)
        .await?;

    for item in items {
        let entity = match stockable::info(db, item.stockable_kind, item.stockable_id).await {
            Ok(entity) => entity,
            Err(ServiceError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let needed = convert(
            item.quantity * Decimal::from(servings),
            item.unit,
            entity.unit,
        )?;
        let available =
            stockable::quantity_at(db, item.stockable_kind, item.stockable_id, item.location_id, false)
                .await?
                .unwrap_or(Decimal::ZERO);
        if available < needed {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn load_scoped_menu<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    menu_id: i32,
) -> Result<menu::Model, ServiceError> {
    menu::Entity::find_by_id(menu_id)
        .one(db)
        .await?
        .filter(|m| m.company_id == company_id)
        .ok_or_else(|| ServiceError::NotFound(format!("Menu {} not found", menu_id)))
}

/// Validates each line's entity and location against the company before
/// inserting.
async fn insert_items<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    menu_id: i32,
    items: &[NewMenuItem],
) -> Result<Vec<menu_item::Model>, ServiceError> {
    let mut created = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Recipe quantities must be positive".to_string(),
            ));
        }

        let entity = stockable::info(db, item.stockable_kind, item.stockable_id).await?;
        if entity.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "{} {} belongs to a different company",
                item.stockable_kind, item.stockable_id
            )));
        }
        // The line's unit must convert into the entity's at serving time.
        convert(item.quantity, item.unit, entity.unit)?;

        let location = location::Entity::find_by_id(item.location_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Location {} not found", item.location_id))
            })?;
        if location.company_id != company_id {
            return Err(ServiceError::Forbidden(format!(
                "Location {} belongs to a different company",
                item.location_id
            )));
        }

        let now = Utc::now();
        let row = menu_item::ActiveModel {
            menu_id: Set(menu_id),
            stockable_kind: Set(item.stockable_kind),
            stockable_id: Set(item.stockable_id),
            location_id: Set(item.location_id),
            quantity: Set(item.quantity),
            unit: Set(item.unit),
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
