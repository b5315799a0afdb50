use super::sea_orm_active_enums::{Allergens, MeasurementUnit};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub unit: MeasurementUnit,
    pub category_id: Option<i32>,
    /// Low-stock alert threshold, summed across all locations. `None`
    /// disables the alert.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub threshold: Option<Decimal>,
    pub barcode: Option<String>,
    pub image_url: Option<String>,
    /// Declared allergens, aggregated onto the public card.
    #[sea_orm(column_type = "Json")]
    pub allergens: Allergens,
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
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::ingredient_location::Entity")]
    IngredientLocation,
    #[sea_orm(has_many = "super::perishable::Entity")]
    Perishable,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::ingredient_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientLocation.def()
    }
}

impl Related<super::perishable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Perishable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
