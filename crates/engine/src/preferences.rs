//! Key/value preferences, grouped by scope.
//!
//! Budget entries, the allocation snapshot, ingredient drafts and setup flags
//! all live here as text values.
use sea_orm::entity::{ActiveValue, prelude::*};

/// Prefix of the per-category daily budget keys.
pub(crate) const BUDGET_PREFIX: &str = "exchange:";
/// Prefix of the per-meal ingredient draft keys.
pub(crate) const DRAFT_PREFIX: &str = "ingredients:";
pub(crate) const ALLOCATION_KEY: &str = "allocation";
pub(crate) const PLANNED_CALORIES_KEY: &str = "planned_daily_calories";
pub(crate) const BUDGET_SET_KEY: &str = "food_exchange_set";
pub(crate) const DISTRIBUTION_SET_KEY: &str = "nutrient_split_set";
pub(crate) const REALLOCATION_KEY: &str = "reallocation_required";
pub(crate) const FOODS_LOADED_KEY: &str = "foods_loaded";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active(scope: &str, key: &str, value: String) -> ActiveModel {
    ActiveModel {
        scope: ActiveValue::Set(scope.to_string()),
        key: ActiveValue::Set(key.to_string()),
        value: ActiveValue::Set(value),
    }
}
