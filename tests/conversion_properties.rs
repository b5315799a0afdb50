//! Property tests over unit conversion and quantity rounding.

use proptest::prelude::*;
use rust_decimal::Decimal;

use brigade_api::entities::sea_orm_active_enums::MeasurementUnit;
use brigade_api::services::conversion::{convert, exceeds_movement_threshold, round2};

const MASS: [MeasurementUnit; 7] = [
    MeasurementUnit::Kilogram,
    MeasurementUnit::Hectogram,
    MeasurementUnit::Decagram,
    MeasurementUnit::Gram,
    MeasurementUnit::Decigram,
    MeasurementUnit::Centigram,
    MeasurementUnit::Milligram,
];

const VOLUME: [MeasurementUnit; 7] = [
    MeasurementUnit::Kilolitre,
    MeasurementUnit::Hectolitre,
    MeasurementUnit::Decalitre,
    MeasurementUnit::Litre,
    MeasurementUnit::Decilitre,
    MeasurementUnit::Centilitre,
    MeasurementUnit::Millilitre,
];

/// Quantities with up to four decimal places, as they arrive from clients.
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

proptest! {
    #[test]
    fn mass_conversion_round_trips_exactly(
        q in quantity(),
        from in 0usize..MASS.len(),
        to in 0usize..MASS.len(),
    ) {
        let converted = convert(q, MASS[from], MASS[to]).unwrap();
        let back = convert(converted, MASS[to], MASS[from]).unwrap();
        // Factors are powers of ten, so Decimal arithmetic is exact.
        prop_assert_eq!(back, q);
    }

    #[test]
    fn volume_conversion_round_trips_exactly(
        q in quantity(),
        from in 0usize..VOLUME.len(),
        to in 0usize..VOLUME.len(),
    ) {
        let converted = convert(q, VOLUME[from], VOLUME[to]).unwrap();
        let back = convert(converted, VOLUME[to], VOLUME[from]).unwrap();
        prop_assert_eq!(back, q);
    }

    #[test]
    fn conversion_scales_by_the_factor_ratio(
        q in quantity(),
        from in 0usize..MASS.len(),
        to in 0usize..MASS.len(),
    ) {
        let converted = convert(q, MASS[from], MASS[to]).unwrap();
        prop_assert_eq!(
            converted * MASS[to].base_factor(),
            q * MASS[from].base_factor()
        );
    }

    #[test]
    fn mass_to_volume_always_fails(
        q in quantity(),
        from in 0usize..MASS.len(),
        to in 0usize..VOLUME.len(),
    ) {
        prop_assert!(convert(q, MASS[from], VOLUME[to]).is_err());
    }

    #[test]
    fn counting_unit_converts_only_to_itself(
        q in quantity(),
        other in 0usize..MASS.len(),
    ) {
        prop_assert_eq!(convert(q, MeasurementUnit::Unit, MeasurementUnit::Unit).unwrap(), q);
        prop_assert!(convert(q, MeasurementUnit::Unit, MASS[other]).is_err());
        prop_assert!(convert(q, MASS[other], MeasurementUnit::Unit).is_err());
    }

    #[test]
    fn round2_is_idempotent_and_close(q in quantity()) {
        let rounded = round2(q);
        prop_assert_eq!(round2(rounded), rounded);
        prop_assert!((rounded - q).abs() <= Decimal::new(5, 3));
        prop_assert!(rounded.scale() <= 2);
    }

    #[test]
    fn threshold_matches_rounded_visibility(q in quantity()) {
        // A delta that survives rounding to cents is exactly a delta the
        // movement ledger records.
        let rounded = round2(q);
        prop_assert_eq!(
            exceeds_movement_threshold(rounded),
            rounded >= Decimal::new(1, 2)
        );
    }
}
