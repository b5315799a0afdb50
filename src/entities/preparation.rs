use super::sea_orm_active_enums::{MeasurementUnit, PreparationKind};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Something made in-house from components (see `preparation_component`).
/// Stocked per location like an ingredient, but never perishable-tracked.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "preparations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub unit: MeasurementUnit,
    pub kind: PreparationKind,
    pub image_url: Option<String>,
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
    #[sea_orm(has_many = "super::preparation_location::Entity")]
    PreparationLocation,
    #[sea_orm(has_many = "super::preparation_component::Entity")]
    Component,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::preparation_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PreparationLocation.def()
    }
}

impl Related<super::preparation_component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Component.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
