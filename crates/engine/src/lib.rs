//! Food exchange planning engine.
//!
//! A daily budget of exchange units per food category is distributed across
//! meals, then across the ingredients of each meal. [`AllocationLedger`]
//! holds that state and enforces conservation at both levels; [`Engine`]
//! loads and saves it from a SQLite store.
pub use budget::{CategoryAmounts, DailyBudget, MealAllocation};
pub use calories::{calories_for_category, calories_for_label, total_calories};
pub use catalog::{
    FoodCatalog, ResolvedMeasurement, available_states, measurement_options,
    resolve, resolve_default,
};
pub use categories::{Category, ExchangeCoefficients, coefficients_for_label};
pub use error::EngineError;
pub use exchange::{Exchange, Step, parse_exchange_input, validate_divisible_by_step};
pub use foods::{
    DefaultMeasurement, Food, MeasurementDetail, MeasurementState, Measurements,
    SingleMeasurement,
};
pub use ingredients::{IngredientKey, SelectedIngredient};
pub use journal::JournalEntry;
pub use ledger::{AllocationLedger, AllocationSnapshot, LedgerEvent};
pub use meals::{Meal, MealKind, default_snack_window};
pub use ops::{DEFAULT_SCOPE, Engine, EngineBuilder, SetupStatus};
pub use window::{DEFAULT_UPCOMING_LIMIT, MealWindow, Schedule, schedule};

mod budget;
mod calories;
mod catalog;
mod categories;
mod error;
mod exchange;
mod foods;
mod ingredients;
mod journal;
mod ledger;
mod meals;
mod ops;
mod preferences;
mod util;
mod window;

type ResultEngine<T> = Result<T, EngineError>;
