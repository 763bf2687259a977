//! Ingredients chosen for a meal.
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Category, Exchange, ResultEngine,
    calories::calories_for_category,
    catalog::{ResolvedMeasurement, resolve_default},
    foods::{Food, MeasurementState},
    util::round2,
};

/// Identity of an ingredient inside one meal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IngredientKey {
    pub food_id: i32,
    pub category: Category,
}

/// A food picked for a meal, with its measurement and exchange amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedIngredient {
    pub food_id: i32,
    pub name: String,
    #[serde(rename = "group")]
    pub category: Category,
    pub state: MeasurementState,
    pub unit: String,
    pub amount: Exchange,
    /// Physical quantity of one exchange in `unit`.
    #[serde(alias = "baseAmount")]
    pub base_quantity: f64,
}

impl SelectedIngredient {
    /// Builds an ingredient from the food's default measurement.
    pub fn from_food(food: &Food, amount: Exchange) -> ResultEngine<Self> {
        let resolved = resolve_default(food)?;
        Ok(Self::with_measurement(food, resolved, amount))
    }

    #[must_use]
    pub fn with_measurement(food: &Food, measurement: ResolvedMeasurement, amount: Exchange) -> Self {
        Self {
            food_id: food.id,
            name: food.name.clone(),
            category: food.category,
            state: measurement.state,
            unit: measurement.unit,
            amount,
            base_quantity: measurement.base_quantity,
        }
    }

    #[must_use]
    pub fn key(&self) -> IngredientKey {
        IngredientKey {
            food_id: self.food_id,
            category: self.category,
        }
    }

    /// Physical quantity to serve, in `unit`.
    #[must_use]
    pub fn quantity(&self) -> f64 {
        round2(self.amount.as_f64() * self.base_quantity)
    }

    #[must_use]
    pub fn calories(&self) -> f64 {
        calories_for_category(self.category, self.amount)
    }
}

/// Reads a stored ingredient list. Entries that no longer deserialize, such
/// as foods of an unknown category, are skipped.
pub(crate) fn parse_ingredients(json: &str) -> ResultEngine<Vec<SelectedIngredient>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(ingredient) => Some(ingredient),
            Err(err) => {
                warn!(%err, "ignoring unreadable stored ingredient");
                None
            }
        })
        .collect())
}
