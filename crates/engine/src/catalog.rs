//! Immutable food catalog snapshot and the ingredient resolver.
//!
//! The catalog is loaded once (from JSON or from the store) and then passed
//! explicitly to whatever needs food data.
use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    Category, EngineError, ResultEngine,
    foods::{Food, MeasurementState},
    util::normalize_key,
};

/// Top-level shape of a catalog document. Foods are read one by one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FoodsWrapper {
    food_exchange_table: Vec<serde_json::Value>,
}

/// A state/unit pair resolved against a food, with the physical quantity of
/// one exchange in that unit.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMeasurement {
    pub state: MeasurementState,
    pub unit: String,
    pub base_quantity: f64,
}

/// Resolves `(state, unit)` for `food`.
///
/// The exact unit is looked up among the state's net quantities, then the
/// gross ones. When the unit is missing the first quantity of the state is
/// used instead. Only a state with no quantity at all is unavailable.
pub fn resolve(food: &Food, state: MeasurementState, unit: &str) -> ResultEngine<ResolvedMeasurement> {
    let detail = food.measurements.detail(state);
    let exact = detail.and_then(|detail| detail.units().find(|m| m.unit == unit));
    let first = detail.and_then(|detail| detail.units().next());

    match exact.or(first) {
        Some(found) => Ok(ResolvedMeasurement {
            state,
            unit: found.unit.clone(),
            base_quantity: found.amount,
        }),
        None => Err(EngineError::MeasurementUnavailable(format!(
            "{} has no {state} measurement",
            food.name
        ))),
    }
}

/// Resolves the food's default measurement.
pub fn resolve_default(food: &Food) -> ResultEngine<ResolvedMeasurement> {
    resolve(
        food,
        food.default_measurement.state,
        &food.default_measurement.unit,
    )
}

/// States with at least one quantity, in raw, cooked, neutral order.
#[must_use]
pub fn available_states(food: &Food) -> Vec<MeasurementState> {
    MeasurementState::ALL
        .into_iter()
        .filter(|state| food.measurements.has(*state))
        .collect()
}

/// Every selectable measurement of a food, state by state.
#[must_use]
pub fn measurement_options(food: &Food) -> Vec<ResolvedMeasurement> {
    available_states(food)
        .into_iter()
        .flat_map(|state| {
            food.measurements
                .detail(state)
                .into_iter()
                .flat_map(|detail| detail.units())
                .map(move |m| ResolvedMeasurement {
                    state,
                    unit: m.unit.clone(),
                    base_quantity: m.amount,
                })
        })
        .collect()
}

/// Foods indexed by id.
#[derive(Clone, Debug, Default)]
pub struct FoodCatalog {
    foods: BTreeMap<i32, Food>,
}

impl FoodCatalog {
    #[must_use]
    pub fn new(foods: Vec<Food>) -> Self {
        Self {
            foods: foods.into_iter().map(|food| (food.id, food)).collect(),
        }
    }

    /// Parses a `{"foodExchangeTable": [...]}` document.
    ///
    /// Foods that fail to parse, e.g. with an unknown group, are skipped.
    pub fn from_json(json: &str) -> ResultEngine<Self> {
        let wrapper: FoodsWrapper = serde_json::from_str(json)?;
        let listed = wrapper.food_exchange_table.len();
        let foods: Vec<Food> = wrapper
            .food_exchange_table
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Food>(entry) {
                Ok(food) => Some(food),
                Err(err) => {
                    warn!(%err, "skipping unreadable catalog food");
                    None
                }
            })
            .collect();
        debug!(foods = foods.len(), skipped = listed - foods.len(), "food catalog parsed");
        Ok(Self::new(foods))
    }

    #[must_use]
    pub fn get(&self, id: i32) -> Option<&Food> {
        self.foods.get(&id)
    }

    /// Like [`FoodCatalog::get`], with a lookup error for unknown ids.
    pub fn food(&self, id: i32) -> ResultEngine<&Food> {
        self.get(id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("food {id}")))
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    #[must_use]
    pub fn in_category(&self, category: Category) -> Vec<&Food> {
        self.foods()
            .filter(|food| food.category == category)
            .collect()
    }

    /// Foods of `category` that can be added to a meal: the default state
    /// must have some quantity.
    #[must_use]
    pub fn selectable(&self, category: Category) -> Vec<&Food> {
        self.foods()
            .filter(|food| food.category == category && resolve_default(food).is_ok())
            .collect()
    }

    /// Foods whose name contains `query`, ignoring case and diacritics.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Food> {
        let Some(key) = normalize_key(query) else {
            return Vec::new();
        };
        self.foods()
            .filter(|food| normalize_key(&food.name).is_some_and(|name| name.contains(&key)))
            .collect()
    }
}
