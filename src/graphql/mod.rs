//! GraphQL read surface.
//!
//! Mutations go through REST; GraphQL serves the dashboard's read queries
//! and insights. Every resolver is scoped to the authenticated user's
//! company, taken from the request context.

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema, SimpleObject};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::auth::AuthUser;
use crate::entities::sea_orm_active_enums::{
    Allergen, MeasurementUnit, MenuServiceKind, MovementType, OrderStatus, PreparationKind,
    StockableKind,
};
use crate::entities::{ingredient, loss, menu, order, preparation, stock_movement};
use crate::errors::ServiceError;
use crate::services::ingredients::{IngredientWithStock, SearchHit};
use crate::services::orders::{OrderFilter, OrderStats};
use crate::services::perishables::PerishableBatch;
use crate::services::stock_movements::MovementFilter;
use crate::AppState;

pub type ApiSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// The state and the authenticated user are injected per request by the
/// HTTP handler, so the schema itself carries no data.
pub fn build_schema() -> ApiSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish()
}

/// How close to expiry a perishable batch is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, async_graphql::Enum)]
pub enum Freshness {
    /// Expires more than 48 hours from now.
    Fresh,
    /// Expires within the next 48 hours.
    Soon,
    /// Already swept and converted to a loss.
    Expired,
}

#[derive(SimpleObject)]
struct IngredientGql {
    id: i32,
    name: String,
    unit: MeasurementUnit,
    category_id: Option<i32>,
    threshold: Option<Decimal>,
    barcode: Option<String>,
    image_url: Option<String>,
    allergens: Vec<Allergen>,
}

impl From<ingredient::Model> for IngredientGql {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit: model.unit,
            category_id: model.category_id,
            threshold: model.threshold,
            barcode: model.barcode,
            image_url: model.image_url,
            allergens: model.allergens.0,
        }
    }
}

#[derive(SimpleObject)]
struct IngredientStockGql {
    id: i32,
    name: String,
    unit: MeasurementUnit,
    threshold: Option<Decimal>,
    total_quantity: Decimal,
}

impl From<IngredientWithStock> for IngredientStockGql {
    fn from(entry: IngredientWithStock) -> Self {
        Self {
            id: entry.ingredient.id,
            name: entry.ingredient.name,
            unit: entry.ingredient.unit,
            threshold: entry.ingredient.threshold,
            total_quantity: entry.total_quantity,
        }
    }
}

#[derive(SimpleObject)]
struct SearchHitGql {
    kind: StockableKind,
    id: i32,
    name: String,
    unit: MeasurementUnit,
    total_quantity: Decimal,
}

impl From<SearchHit> for SearchHitGql {
    fn from(hit: SearchHit) -> Self {
        Self {
            kind: hit.kind,
            id: hit.id,
            name: hit.name,
            unit: hit.unit,
            total_quantity: hit.total_quantity,
        }
    }
}

#[derive(SimpleObject)]
struct PreparationGql {
    id: i32,
    name: String,
    unit: MeasurementUnit,
    kind: PreparationKind,
    image_url: Option<String>,
}

impl From<preparation::Model> for PreparationGql {
    fn from(model: preparation::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit: model.unit,
            kind: model.kind,
            image_url: model.image_url,
        }
    }
}

#[derive(SimpleObject)]
struct MenuGql {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    service_kind: MenuServiceKind,
    is_returnable: bool,
    image_url: Option<String>,
    public_priority: i32,
}

impl From<menu::Model> for MenuGql {
    fn from(model: menu::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            service_kind: model.service_kind,
            is_returnable: model.is_returnable,
            image_url: model.image_url,
            public_priority: model.public_priority,
        }
    }
}

#[derive(SimpleObject)]
struct LossGql {
    id: i32,
    stockable_kind: StockableKind,
    stockable_id: i32,
    location_id: i32,
    quantity: Decimal,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<loss::Model> for LossGql {
    fn from(model: loss::Model) -> Self {
        Self {
            id: model.id,
            stockable_kind: model.stockable_kind,
            stockable_id: model.stockable_id,
            location_id: model.location_id,
            quantity: model.quantity,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

#[derive(SimpleObject)]
struct StockMovementGql {
    id: i32,
    stockable_kind: StockableKind,
    stockable_id: i32,
    location_id: i32,
    movement_type: MovementType,
    quantity: Decimal,
    quantity_before: Decimal,
    quantity_after: Decimal,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for StockMovementGql {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            stockable_kind: model.stockable_kind,
            stockable_id: model.stockable_id,
            location_id: model.location_id,
            movement_type: model.movement_type,
            quantity: model.quantity,
            quantity_before: model.quantity_before,
            quantity_after: model.quantity_after,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

#[derive(SimpleObject)]
struct OrderGql {
    id: i32,
    dining_table_id: i32,
    user_id: Option<i32>,
    status: OrderStatus,
    pending_at: Option<DateTime<Utc>>,
    served_at: Option<DateTime<Utc>>,
    payed_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<order::Model> for OrderGql {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            dining_table_id: model.dining_table_id,
            user_id: model.user_id,
            status: model.status,
            pending_at: model.pending_at,
            served_at: model.served_at,
            payed_at: model.payed_at,
            canceled_at: model.canceled_at,
            created_at: model.created_at,
        }
    }
}

#[derive(SimpleObject)]
struct OrderStatsGql {
    pending: u64,
    served: u64,
    payed: u64,
    canceled: u64,
    total: u64,
    revenue: Decimal,
}

impl From<OrderStats> for OrderStatsGql {
    fn from(stats: OrderStats) -> Self {
        Self {
            pending: stats.pending,
            served: stats.served,
            payed: stats.payed,
            canceled: stats.canceled,
            total: stats.total,
            revenue: stats.revenue,
        }
    }
}

#[derive(SimpleObject)]
struct PerishableGql {
    id: i32,
    ingredient_id: i32,
    location_id: i32,
    quantity: Decimal,
    is_read: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<PerishableBatch> for PerishableGql {
    fn from(entry: PerishableBatch) -> Self {
        Self {
            id: entry.batch.id,
            ingredient_id: entry.batch.ingredient_id,
            location_id: entry.batch.location_id,
            quantity: entry.batch.quantity,
            is_read: entry.batch.is_read,
            created_at: entry.batch.created_at,
            expires_at: entry.expires_at,
        }
    }
}

fn scope<'a>(ctx: &Context<'a>) -> async_graphql::Result<(&'a AppState, &'a AuthUser)> {
    let state = ctx.data::<AppState>()?;
    let user = ctx.data::<AuthUser>()?;
    Ok((state, user))
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Ingredients, optionally filtered by a name fragment.
    async fn ingredients(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<IngredientGql>> {
        let (state, user) = scope(ctx)?;
        let (items, _) = state
            .services
            .ingredients
            .list(user.company_id, search.as_deref(), page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Ingredients whose total stock fell below their alert threshold.
    async fn ingredients_below_threshold(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<IngredientStockGql>> {
        let (state, user) = scope(ctx)?;
        let entries = state
            .services
            .ingredients
            .below_threshold(user.company_id)
            .await?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    /// Ingredients with no applicable shelf-life rule.
    async fn non_perishable_ingredients(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<IngredientGql>> {
        let (state, user) = scope(ctx)?;
        let items = state
            .services
            .ingredients
            .non_perishable(user.company_id)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Name search over ingredients and preparations currently in stock.
    async fn search_in_stock(
        &self,
        ctx: &Context<'_>,
        keyword: String,
    ) -> async_graphql::Result<Vec<SearchHitGql>> {
        let (state, user) = scope(ctx)?;
        let hits = state
            .services
            .ingredients
            .search_in_stock(user.company_id, &keyword)
            .await?;
        Ok(hits.into_iter().map(Into::into).collect())
    }

    async fn preparations(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<PreparationGql>> {
        let (state, user) = scope(ctx)?;
        let (items, _) = state
            .services
            .preparations
            .list(user.company_id, search.as_deref(), page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn menus(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<MenuGql>> {
        let (state, user) = scope(ctx)?;
        let (items, _) = state
            .services
            .menus
            .list(user.company_id, page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn losses(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<LossGql>> {
        let (state, user) = scope(ctx)?;
        let (items, _) = state
            .services
            .losses
            .list(user.company_id, Default::default(), page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn stock_movements(
        &self,
        ctx: &Context<'_>,
        stockable_kind: Option<StockableKind>,
        stockable_id: Option<i32>,
        location_id: Option<i32>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<StockMovementGql>> {
        let (state, user) = scope(ctx)?;
        let filter = MovementFilter {
            stockable_kind,
            stockable_id,
            location_id,
        };
        let (items, _) = state
            .services
            .stock_movements
            .list(user.company_id, filter, page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    async fn orders(
        &self,
        ctx: &Context<'_>,
        status: Option<OrderStatus>,
        dining_table_id: Option<i32>,
        #[graphql(default = 1)] page: u64,
        #[graphql(default = 50)] per_page: u64,
    ) -> async_graphql::Result<Vec<OrderGql>> {
        let (state, user) = scope(ctx)?;
        let filter = OrderFilter {
            dining_table_id,
            statuses: status.into_iter().collect(),
            ..Default::default()
        };
        let (items, _) = state
            .services
            .orders
            .list(user.company_id, filter, page, per_page)
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Counts per order status plus revenue over payed orders.
    async fn order_stats(
        &self,
        ctx: &Context<'_>,
        dining_table_id: Option<i32>,
        created_after: Option<DateTime<Utc>>,
        created_before: Option<DateTime<Utc>>,
    ) -> async_graphql::Result<OrderStatsGql> {
        let (state, user) = scope(ctx)?;
        let filter = OrderFilter {
            dining_table_id,
            created_after,
            created_before,
            ..Default::default()
        };
        let stats = state.services.orders.stats(user.company_id, filter).await?;
        Ok(stats.into())
    }

    /// Perishable batches bucketed by how close to expiry they are.
    async fn perishables(
        &self,
        ctx: &Context<'_>,
        #[graphql(default_with = "Freshness::Soon")] freshness: Freshness,
    ) -> async_graphql::Result<Vec<PerishableGql>> {
        let (state, user) = scope(ctx)?;

        if freshness == Freshness::Expired {
            let swept = state
                .services
                .perishables
                .list_expired(user.company_id)
                .await?;
            let batches = crate::services::perishables::with_expirations(&*state.db, swept)
                .await
                .map_err(ServiceError::from)?;
            return Ok(batches.into_iter().map(Into::into).collect());
        }

        let horizon = Utc::now() + Duration::hours(48);
        let batches = state.services.perishables.list(user.company_id, false).await?;
        Ok(batches
            .into_iter()
            .filter(|entry| match freshness {
                Freshness::Fresh => entry.expires_at > horizon,
                Freshness::Soon => entry.expires_at <= horizon,
                Freshness::Expired => false,
            })
            .map(Into::into)
            .collect())
    }
}
