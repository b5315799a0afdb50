use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One opening range of a company's weekly schedule.
///
/// `day_of_week` runs 1 (Monday) through 7 (Sunday). Times are stored as
/// `HH:MM` strings; a range whose close precedes its open spills into the
/// next day and carries `is_overnight`. `sequence` orders multiple ranges
/// within the same day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company_business_hours")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub day_of_week: i32,
    pub opens_at: String,
    pub closes_at: String,
    pub is_overnight: bool,
    pub sequence: i32,
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
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
