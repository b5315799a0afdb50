//! String-backed enums shared by the entity models.
//!
//! Values are stored exactly as written by the measurement and workflow
//! tables, so renaming a variant's `string_value` is a schema migration.

use async_graphql::Enum;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Measurement unit of a stockable quantity.
///
/// Mass and volume units follow the metric ladder; `Unit` counts discrete
/// pieces. Conversion factors live in `services::conversion`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum, Serialize,
    Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum MeasurementUnit {
    #[sea_orm(string_value = "kg")]
    #[serde(rename = "kg")]
    Kilogram,
    #[sea_orm(string_value = "hg")]
    #[serde(rename = "hg")]
    Hectogram,
    #[sea_orm(string_value = "dag")]
    #[serde(rename = "dag")]
    Decagram,
    #[sea_orm(string_value = "g")]
    #[serde(rename = "g")]
    Gram,
    #[sea_orm(string_value = "dg")]
    #[serde(rename = "dg")]
    Decigram,
    #[sea_orm(string_value = "cg")]
    #[serde(rename = "cg")]
    Centigram,
    #[sea_orm(string_value = "mg")]
    #[serde(rename = "mg")]
    Milligram,
    #[sea_orm(string_value = "kL")]
    #[serde(rename = "kL")]
    Kilolitre,
    #[sea_orm(string_value = "hL")]
    #[serde(rename = "hL")]
    Hectolitre,
    #[sea_orm(string_value = "daL")]
    #[serde(rename = "daL")]
    Decalitre,
    #[sea_orm(string_value = "L")]
    #[serde(rename = "L")]
    Litre,
    #[sea_orm(string_value = "dL")]
    #[serde(rename = "dL")]
    Decilitre,
    #[sea_orm(string_value = "cL")]
    #[serde(rename = "cL")]
    Centilitre,
    #[sea_orm(string_value = "mL")]
    #[serde(rename = "mL")]
    Millilitre,
    #[sea_orm(string_value = "unit")]
    #[serde(rename = "unit")]
    Unit,
}

impl MeasurementUnit {
    pub fn as_symbol(&self) -> &'static str {
        match self {
            Self::Kilogram => "kg",
            Self::Hectogram => "hg",
            Self::Decagram => "dag",
            Self::Gram => "g",
            Self::Decigram => "dg",
            Self::Centigram => "cg",
            Self::Milligram => "mg",
            Self::Kilolitre => "kL",
            Self::Hectolitre => "hL",
            Self::Decalitre => "daL",
            Self::Litre => "L",
            Self::Decilitre => "dL",
            Self::Centilitre => "cL",
            Self::Millilitre => "mL",
            Self::Unit => "unit",
        }
    }

    /// Case-insensitive parse used for external data (product databases
    /// report units in inconsistent casing). Returns `None` rather than
    /// guessing for unknown symbols.
    pub fn parse_loose(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        [
            Self::Kilogram,
            Self::Hectogram,
            Self::Decagram,
            Self::Gram,
            Self::Decigram,
            Self::Centigram,
            Self::Milligram,
            Self::Kilolitre,
            Self::Hectolitre,
            Self::Decalitre,
            Self::Litre,
            Self::Decilitre,
            Self::Centilitre,
            Self::Millilitre,
            Self::Unit,
        ]
        .into_iter()
        .find(|unit| unit.as_symbol().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

/// Whether the entity behind a polymorphic reference is an ingredient or a
/// preparation. Stored as an explicit discriminant column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Enum, Serialize,
    Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum StockableKind {
    #[sea_orm(string_value = "ingredient")]
    Ingredient,
    #[sea_orm(string_value = "preparation")]
    Preparation,
}

impl fmt::Display for StockableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingredient => f.write_str("ingredient"),
            Self::Preparation => f.write_str("preparation"),
        }
    }
}

/// Direction of an audited stock quantity change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    #[sea_orm(string_value = "addition")]
    Addition,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
}

/// Order lifecycle. `Payed` and `Canceled` are terminal; `Pending`/`Served`
/// are derived from the order's steps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SERVED")]
    Served,
    #[sea_orm(string_value = "PAYED")]
    Payed,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

/// Order step status, derived from the step's menu lines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    #[sea_orm(string_value = "IN_PREP")]
    InPrep,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "SERVED")]
    Served,
}

/// Status of a single menu line within a step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepMenuStatus {
    #[sea_orm(string_value = "IN_PREP")]
    InPrep,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "SERVED")]
    Served,
}

/// How a menu reaches the guest: cooked to order (`Prep`), or handed over
/// directly from stock (`Direct`, e.g. a bottled drink).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuServiceKind {
    #[sea_orm(string_value = "PREP")]
    Prep,
    #[sea_orm(string_value = "DIRECT")]
    Direct,
}

/// Whether a preparation is made from raw ingredients only, or can include
/// other preparations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PreparationKind {
    #[sea_orm(string_value = "simple")]
    Simple,
    #[sea_orm(string_value = "composite")]
    Composite,
}

/// The fourteen allergens restaurants must declare on the card.
///
/// Stored inside the `allergens` JSON column of ingredients rather than as
/// a lookup table, so this is a plain serde enum, not an active enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Serialize, Deserialize,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Allergen {
    Gluten,
    Crustaceans,
    Eggs,
    Fish,
    Peanuts,
    Soy,
    Milk,
    TreeNuts,
    Celery,
    Mustard,
    Sesame,
    Sulphites,
    Lupin,
    Molluscs,
}

/// JSON-backed allergen list of an ingredient.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct Allergens(pub Vec<Allergen>);

impl Allergens {
    /// Sorted, deduplicated list; the canonical stored form.
    pub fn normalized(mut list: Vec<Allergen>) -> Self {
        list.sort();
        list.dedup();
        Self(list)
    }
}

/// Audit action recorded in `order_histories`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum HistoryAction {
    #[sea_orm(string_value = "order.created")]
    #[serde(rename = "order.created")]
    OrderCreated,
    #[sea_orm(string_value = "order.status_updated")]
    #[serde(rename = "order.status_updated")]
    OrderStatusUpdated,
    #[sea_orm(string_value = "order_step.created")]
    #[serde(rename = "order_step.created")]
    OrderStepCreated,
    #[sea_orm(string_value = "order_step.status_updated")]
    #[serde(rename = "order_step.status_updated")]
    OrderStepStatusUpdated,
    #[sea_orm(string_value = "step_menu.added")]
    #[serde(rename = "step_menu.added")]
    StepMenuAdded,
    #[sea_orm(string_value = "step_menu.updated")]
    #[serde(rename = "step_menu.updated")]
    StepMenuUpdated,
    #[sea_orm(string_value = "step_menu.removed")]
    #[serde(rename = "step_menu.removed")]
    StepMenuRemoved,
    #[sea_orm(string_value = "step_menu.status_updated")]
    #[serde(rename = "step_menu.status_updated")]
    StepMenuStatusUpdated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_unit_loose_parse_is_case_insensitive() {
        assert_eq!(
            MeasurementUnit::parse_loose("KG"),
            Some(MeasurementUnit::Kilogram)
        );
        assert_eq!(
            MeasurementUnit::parse_loose(" ml "),
            Some(MeasurementUnit::Millilitre)
        );
        assert_eq!(MeasurementUnit::parse_loose("stone"), None);
    }

    #[test]
    fn measurement_unit_symbols_round_trip() {
        for unit in [
            MeasurementUnit::Kilogram,
            MeasurementUnit::Gram,
            MeasurementUnit::Litre,
            MeasurementUnit::Millilitre,
            MeasurementUnit::Unit,
        ] {
            assert_eq!(MeasurementUnit::parse_loose(unit.as_symbol()), Some(unit));
        }
    }
}
