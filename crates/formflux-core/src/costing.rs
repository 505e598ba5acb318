use crate::units::{self, MeasurementType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingredient line inside a recipe under construction.
///
/// Quantity is kept as the raw entered string: half-typed rows ("",
/// "0.", "abc") are a normal state of the builder and must not poison
/// the cost fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeComponent {
    pub id: Uuid,
    #[serde(default)]
    pub inventory_item_id: Option<Uuid>,
    #[serde(default)]
    pub inventory_item_name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
}

impl RecipeComponent {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            inventory_item_id: None,
            inventory_item_name: String::new(),
            quantity: String::new(),
            unit: String::new(),
        }
    }
}

impl Default for RecipeComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// A catalog entry a recipe component can reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub measurement_type: Option<MeasurementType>,
    #[serde(default)]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub cost_per_base_unit: Option<f64>,
    #[serde(default)]
    pub base_unit_for_cost: Option<String>,
}

/// Answer-bag key the estimated recipe cost is published under.
pub const ESTIMATED_COST_FIELD: &str = "estimatedCost";

/// Folds recipe components against the inventory catalog into a total
/// monetary cost.
///
/// Components that cannot be costed are skipped, never errors: the row
/// may reference a missing item, carry an unpriced item, an empty or
/// non-positive quantity, a unit outside the item's category, or an
/// item whose declared cost base unit disagrees with the category's
/// canonical base unit. The fold always returns a number.
pub fn calculate_raw_recipe_cost(
    components: &[RecipeComponent],
    inventory: &[InventoryItem],
) -> f64 {
    if components.is_empty() || inventory.is_empty() {
        return 0.0;
    }

    components.iter().fold(0.0, |total, comp| {
        match component_cost(comp, inventory) {
            Some(cost) => total + cost,
            None => total,
        }
    })
}

/// Recomputes the recipe cost and publishes it into the engine's
/// answer bag under [`ESTIMATED_COST_FIELD`]. Called whenever the
/// components or the catalog change.
pub async fn refresh_estimated_cost(
    engine: &mut crate::engine::FormEngine,
    components: &[RecipeComponent],
    inventory: &[InventoryItem],
) -> f64 {
    let total = calculate_raw_recipe_cost(components, inventory);
    engine
        .update_field(ESTIMATED_COST_FIELD, serde_json::json!(total))
        .await;
    total
}

fn component_cost(comp: &RecipeComponent, inventory: &[InventoryItem]) -> Option<f64> {
    let item_id = comp.inventory_item_id?;
    let Some(item) = inventory.iter().find(|item| item.id == item_id) else {
        tracing::debug!(component = %comp.id, "skipping component: inventory item not found");
        return None;
    };

    let cost_per_base_unit = match item.cost_per_base_unit {
        Some(cost) if cost.is_finite() => cost,
        _ => {
            tracing::debug!(item = %item.name, "skipping component: item has no finite cost");
            return None;
        }
    };
    let measurement_type = item.measurement_type?;
    let base_unit_for_cost = item.base_unit_for_cost.as_deref()?;

    let quantity: f64 = comp.quantity.trim().parse().ok()?;
    if !quantity.is_finite() || quantity <= 0.0 {
        return None;
    }
    if comp.unit.trim().is_empty() {
        return None;
    }

    let Some(quantity_in_base) =
        units::convert_to_base_unit(quantity, &comp.unit, measurement_type)
    else {
        tracing::debug!(
            item = %item.name,
            unit = %comp.unit,
            "skipping component: unit does not belong to the item's category"
        );
        return None;
    };

    let expected_base_unit = units::base_unit(measurement_type);
    if base_unit_for_cost != expected_base_unit {
        tracing::warn!(
            item = %item.name,
            declared = %base_unit_for_cost,
            expected = %expected_base_unit,
            "skipping component: mismatched cost base unit"
        );
        return None;
    }

    Some(quantity_in_base * cost_per_base_unit)
}
