//! Measurement unit arithmetic shared by the stock services.
//!
//! Quantities are converted through each dimension's base unit (gram,
//! litre, or piece) and stored rounded to two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::entities::sea_orm_active_enums::MeasurementUnit;
use crate::errors::ServiceError;

/// Physical dimension of a measurement unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

/// Smallest stock change worth recording. Deltas below this are rounding
/// noise, not movements.
pub const MOVEMENT_THRESHOLD: Decimal = dec!(0.01);

impl MeasurementUnit {
    /// Physical dimension this unit measures.
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Kilogram
            | Self::Hectogram
            | Self::Decagram
            | Self::Gram
            | Self::Decigram
            | Self::Centigram
            | Self::Milligram => Dimension::Mass,
            Self::Kilolitre
            | Self::Hectolitre
            | Self::Decalitre
            | Self::Litre
            | Self::Decilitre
            | Self::Centilitre
            | Self::Millilitre => Dimension::Volume,
            Self::Unit => Dimension::Count,
        }
    }

    /// Factor to the dimension's base unit (gram, litre, or piece).
    pub fn base_factor(&self) -> Decimal {
        match self {
            Self::Kilogram | Self::Kilolitre => dec!(1000),
            Self::Hectogram | Self::Hectolitre => dec!(100),
            Self::Decagram | Self::Decalitre => dec!(10),
            Self::Gram | Self::Litre | Self::Unit => Decimal::ONE,
            Self::Decigram | Self::Decilitre => dec!(0.1),
            Self::Centigram | Self::Centilitre => dec!(0.01),
            Self::Milligram | Self::Millilitre => dec!(0.001),
        }
    }
}

/// Converts a quantity between two units of the same dimension.
///
/// Converting across dimensions (say grams to litres) has no universal
/// factor without a density, so it is rejected outright.
pub fn convert(
    quantity: Decimal,
    from: MeasurementUnit,
    to: MeasurementUnit,
) -> Result<Decimal, ServiceError> {
    if from == to {
        return Ok(quantity);
    }
    if from.dimension() != to.dimension() {
        return Err(ServiceError::InvalidInput(format!(
            "Cannot convert between {} and {}: incompatible dimensions",
            from, to
        )));
    }
    Ok(quantity * from.base_factor() / to.base_factor())
}

/// Rounds to two decimal places, away from zero on midpoints. Stored stock
/// quantities and movement records all pass through this.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whether a signed stock delta is large enough to record.
pub fn exceeds_movement_threshold(delta: Decimal) -> bool {
    delta.abs() >= MOVEMENT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_within_mass_ladder() {
        let result = convert(dec!(2.5), MeasurementUnit::Kilogram, MeasurementUnit::Gram).unwrap();
        assert_eq!(result, dec!(2500));

        let result = convert(dec!(250), MeasurementUnit::Gram, MeasurementUnit::Kilogram).unwrap();
        assert_eq!(result, dec!(0.25));
    }

    #[test]
    fn converts_within_volume_ladder() {
        let result =
            convert(dec!(330), MeasurementUnit::Millilitre, MeasurementUnit::Litre).unwrap();
        assert_eq!(result, dec!(0.33));

        let result =
            convert(dec!(1.5), MeasurementUnit::Litre, MeasurementUnit::Centilitre).unwrap();
        assert_eq!(result, dec!(150));
    }

    #[test]
    fn same_unit_is_identity() {
        let result = convert(dec!(7.77), MeasurementUnit::Unit, MeasurementUnit::Unit).unwrap();
        assert_eq!(result, dec!(7.77));
    }

    #[test]
    fn cross_dimension_conversion_is_rejected() {
        let err = convert(dec!(1), MeasurementUnit::Gram, MeasurementUnit::Litre).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = convert(dec!(1), MeasurementUnit::Unit, MeasurementUnit::Kilogram).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn round2_rounds_midpoints_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(2.004)), dec!(2.00));
        assert_eq!(round2(dec!(2.996)), dec!(3.00));
    }

    #[test]
    fn movement_threshold_boundary() {
        assert!(exceeds_movement_threshold(dec!(0.01)));
        assert!(exceeds_movement_threshold(dec!(-0.01)));
        assert!(!exceeds_movement_threshold(dec!(0.009)));
        assert!(!exceeds_movement_threshold(dec!(-0.009)));
        assert!(!exceeds_movement_threshold(Decimal::ZERO));
    }
}
