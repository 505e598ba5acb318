use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Measurement category an inventory item is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    Mass,
    Volume,
    Pieces,
}

impl MeasurementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Mass => "mass",
            MeasurementType::Volume => "volume",
            MeasurementType::Pieces => "pieces",
        }
    }
}

/// One selectable unit: its symbol, display label, and the factor that
/// converts a quantity into the category's base unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitDef {
    pub value: &'static str,
    pub label: &'static str,
    pub base_factor: f64,
}

const MASS_UNITS: &[UnitDef] = &[
    UnitDef { value: "g", label: "g (gram)", base_factor: 1.0 },
    UnitDef { value: "kg", label: "kg (kilogram)", base_factor: 1000.0 },
    UnitDef { value: "mg", label: "mg (milligram)", base_factor: 0.001 },
    UnitDef { value: "oz", label: "oz (ounce)", base_factor: 28.3495 },
    UnitDef { value: "lb", label: "lb (pound)", base_factor: 453.592 },
];

const VOLUME_UNITS: &[UnitDef] = &[
    UnitDef { value: "ml", label: "ml (milliliter)", base_factor: 1.0 },
    UnitDef { value: "L", label: "L (liter)", base_factor: 1000.0 },
    // US customary kitchen units
    UnitDef { value: "tsp", label: "tsp (teaspoon)", base_factor: 4.92892 },
    UnitDef { value: "tbsp", label: "tbsp (tablespoon)", base_factor: 14.7868 },
    UnitDef { value: "fl oz", label: "fl oz (fluid ounce)", base_factor: 29.5735 },
    UnitDef { value: "cup", label: "cup (cup)", base_factor: 236.588 },
];

const PIECE_UNITS: &[UnitDef] = &[
    UnitDef { value: "pcs", label: "pcs (pieces)", base_factor: 1.0 },
    UnitDef { value: "unit", label: "unit(s)", base_factor: 1.0 },
    UnitDef { value: "slice", label: "slice(s)", base_factor: 1.0 },
    UnitDef { value: "clove", label: "clove(s)", base_factor: 1.0 },
    UnitDef { value: "dozen", label: "dozen", base_factor: 12.0 },
];

/// Every unit across all categories, for pickers that are not yet
/// narrowed to a measurement type.
pub static ALL_UNITS: Lazy<Vec<UnitDef>> = Lazy::new(|| {
    MASS_UNITS
        .iter()
        .chain(VOLUME_UNITS)
        .chain(PIECE_UNITS)
        .copied()
        .collect()
});

pub fn units_for(measurement_type: MeasurementType) -> &'static [UnitDef] {
    match measurement_type {
        MeasurementType::Mass => MASS_UNITS,
        MeasurementType::Volume => VOLUME_UNITS,
        MeasurementType::Pieces => PIECE_UNITS,
    }
}

/// The canonical base unit every cost is priced against.
pub fn base_unit(measurement_type: MeasurementType) -> &'static str {
    match measurement_type {
        MeasurementType::Mass => "g",
        MeasurementType::Volume => "ml",
        MeasurementType::Pieces => "pcs",
    }
}

/// Converts `quantity` of `unit` into the category's base unit.
///
/// Returns `None` when the unit does not belong to the category. No
/// rounding is applied; callers get full floating-point precision.
pub fn convert_to_base_unit(
    quantity: f64,
    unit: &str,
    measurement_type: MeasurementType,
) -> Option<f64> {
    let def = units_for(measurement_type)
        .iter()
        .find(|u| u.value == unit)?;
    Some(quantity * def.base_factor)
}

/// Fixed-locale currency formatting: symbol-prefixed, two decimals,
/// thousands separators (`$1,234.50`).
pub fn format_currency(value: f64) -> String {
    let negative = value.is_sign_negative() && value != 0.0;
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}.{frac_part}")
    } else {
        format!("${grouped}.{frac_part}")
    }
}
