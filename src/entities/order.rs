use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::OrderStatus;

/// A table's order. Status only ever moves forward: PENDING while food is
/// flowing, SERVED once every portion reached the table, PAYED at the
/// till, or CANCELED at any point. Each transition stamps its own column.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub dining_table_id: i32,
    pub user_id: Option<i32>,
    pub status: OrderStatus,
    pub pending_at: Option<DateTimeUtc>,
    pub served_at: Option<DateTimeUtc>,
    pub payed_at: Option<DateTimeUtc>,
    pub canceled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::dining_table::Entity",
        from = "Column::DiningTableId",
        to = "super::dining_table::Column::Id"
    )]
    DiningTable,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::order_step::Entity")]
    OrderStep,
    #[sea_orm(has_many = "super::order_history::Entity")]
    OrderHistory,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::dining_table::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiningTable.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderStep.def()
    }
}

impl Related<super::order_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
