use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shelf-life rule: how many hours an ingredient of `category_id` stays
/// usable when stored at a location of `location_type_id`. Absence of a row
/// means the combination is not perishable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_location_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_id: i32,
    pub location_type_id: i32,
    pub shelf_life_hours: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::location_type::Entity",
        from = "Column::LocationTypeId",
        to = "super::location_type::Column::Id"
    )]
    LocationType,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::location_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
