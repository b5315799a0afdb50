use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub location_type_id: i32,
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
    #[sea_orm(
        belongs_to = "super::location_type::Entity",
        from = "Column::LocationTypeId",
        to = "super::location_type::Column::Id"
    )]
    LocationType,
    #[sea_orm(has_many = "super::ingredient_location::Entity")]
    IngredientLocation,
    #[sea_orm(has_many = "super::preparation_location::Entity")]
    PreparationLocation,
    #[sea_orm(has_many = "super::perishable::Entity")]
    Perishable,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::location_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationType.def()
    }
}

impl Related<super::ingredient_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientLocation.def()
    }
}

impl Related<super::preparation_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PreparationLocation.def()
    }
}

impl Related<super::perishable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Perishable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
