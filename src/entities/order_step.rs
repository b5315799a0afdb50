use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StepStatus;

/// One course of an order (starters, mains, ...). Its status is derived
/// from the portions inside it, never set directly by clients.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_steps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    /// 1-based course position within the order.
    pub position: i32,
    pub status: StepStatus,
    pub served_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(has_many = "super::step_menu::Entity")]
    StepMenu,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::step_menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StepMenu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
