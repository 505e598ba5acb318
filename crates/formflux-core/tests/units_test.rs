use formflux_core::units::{
    ALL_UNITS, MeasurementType, base_unit, convert_to_base_unit, format_currency, units_for,
};

#[test]
fn test_base_units_per_category() {
    assert_eq!(base_unit(MeasurementType::Mass), "g");
    assert_eq!(base_unit(MeasurementType::Volume), "ml");
    assert_eq!(base_unit(MeasurementType::Pieces), "pcs");
}

#[test]
fn test_mass_conversions() {
    assert_eq!(
        convert_to_base_unit(2.0, "kg", MeasurementType::Mass),
        Some(2000.0)
    );
    assert_eq!(
        convert_to_base_unit(1000.0, "mg", MeasurementType::Mass),
        Some(1.0)
    );
    let lb = convert_to_base_unit(1.0, "lb", MeasurementType::Mass).unwrap();
    assert!((lb - 453.592).abs() < 1e-9);
}

#[test]
fn test_volume_and_piece_conversions() {
    let cup = convert_to_base_unit(1.0, "cup", MeasurementType::Volume).unwrap();
    assert!((cup - 236.588).abs() < 1e-9);
    assert_eq!(
        convert_to_base_unit(2.0, "dozen", MeasurementType::Pieces),
        Some(24.0)
    );
}

#[test]
fn test_unit_outside_category_is_rejected() {
    assert_eq!(convert_to_base_unit(1.0, "kg", MeasurementType::Volume), None);
    assert_eq!(convert_to_base_unit(1.0, "cup", MeasurementType::Mass), None);
    assert_eq!(convert_to_base_unit(1.0, "nonsense", MeasurementType::Pieces), None);
}

#[test]
fn test_no_rounding_is_applied() {
    let tsp = convert_to_base_unit(3.0, "tsp", MeasurementType::Volume).unwrap();
    assert!((tsp - 14.786_76).abs() < 1e-9);
}

#[test]
fn test_currency_formatting() {
    assert_eq!(format_currency(0.0), "$0.00");
    assert_eq!(format_currency(20.0), "$20.00");
    assert_eq!(format_currency(1234.5), "$1,234.50");
    assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
    assert_eq!(format_currency(-4.0), "-$4.00");
}

#[test]
fn test_unit_tables_are_consistent() {
    // Every category's base unit must be in its own table with factor 1.
    for mt in [
        MeasurementType::Mass,
        MeasurementType::Volume,
        MeasurementType::Pieces,
    ] {
        let base = base_unit(mt);
        let def = units_for(mt).iter().find(|u| u.value == base).unwrap();
        assert_eq!(def.base_factor, 1.0);
    }
    assert_eq!(
        ALL_UNITS.len(),
        units_for(MeasurementType::Mass).len()
            + units_for(MeasurementType::Volume).len()
            + units_for(MeasurementType::Pieces).len()
    );
}
