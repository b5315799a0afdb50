use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MenuServiceKind;

/// A sellable menu entry. `service_kind` decides how ordered portions
/// start out: DIRECT menus (bottled drinks, packaged desserts) are ready
/// the moment they are added, PREP menus go through the kitchen.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub service_kind: MenuServiceKind,
    /// Whether an unopened DIRECT portion can return to stock on cancel.
    pub is_returnable: bool,
    pub image_url: Option<String>,
    /// Sort weight on the public menu card; higher floats to the top.
    pub public_priority: i32,
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
    #[sea_orm(has_many = "super::menu_item::Entity")]
    MenuItem,
    #[sea_orm(has_many = "super::step_menu::Entity")]
    StepMenu,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItem.def()
    }
}

impl Related<super::step_menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StepMenu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
