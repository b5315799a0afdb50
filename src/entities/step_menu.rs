use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::StepMenuStatus;

/// A menu line inside one course: which menu, how many portions, and how
/// far along the kitchen is with them. DIRECT menus are born READY,
/// PREP menus are born IN_PREP.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "step_menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_step_id: i32,
    pub menu_id: i32,
    pub quantity: i32,
    pub status: StepMenuStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub served_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_step::Entity",
        from = "Column::OrderStepId",
        to = "super::order_step::Column::Id"
    )]
    OrderStep,
    #[sea_orm(
        belongs_to = "super::menu::Entity",
        from = "Column::MenuId",
        to = "super::menu::Column::Id"
    )]
    Menu,
}

impl Related<super::order_step::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderStep.def()
    }
}

impl Related<super::menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
