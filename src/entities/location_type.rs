use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of storage a location offers (freezer, fridge, dry storage, ...).
/// Shelf-life rules are keyed on (category, location type).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub name: String,
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
    #[sea_orm(has_many = "super::location::Entity")]
    Location,
    #[sea_orm(has_many = "super::category_location_type::Entity")]
    ShelfLifeRule,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::category_location_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShelfLifeRule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
