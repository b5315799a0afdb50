use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tenant root. Every other record hangs off a company, and every service
/// operation takes the acting company id explicitly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Slug under which the public menu card is reachable.
    #[sea_orm(unique)]
    pub public_menu_card_url: String,
    pub show_menu_images: bool,
    /// When false, menus without sufficient stock are hidden from the
    /// public card instead of being flagged.
    pub show_out_of_stock_menus_on_card: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    User,
    #[sea_orm(has_many = "super::location::Entity")]
    Location,
    #[sea_orm(has_many = "super::menu::Entity")]
    Menu,
    #[sea_orm(has_many = "super::company_business_hour::Entity")]
    CompanyBusinessHour,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menu.def()
    }
}

impl Related<super::company_business_hour::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompanyBusinessHour.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
