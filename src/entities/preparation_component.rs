use super::sea_orm_active_enums::{MeasurementUnit, StockableKind};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One recipe line of a preparation: `quantity` (in `unit`) of the stockable
/// identified by (`component_kind`, `component_id`) per produced unit.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "preparation_components")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub preparation_id: i32,
    pub component_kind: StockableKind,
    pub component_id: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub quantity: Decimal,
    pub unit: MeasurementUnit,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::preparation::Entity",
        from = "Column::PreparationId",
        to = "super::preparation::Column::Id"
    )]
    Preparation,
}

impl Related<super::preparation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Preparation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
