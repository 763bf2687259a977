//! The module contains the food journal: what was eaten for a meal on a day.
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SelectedIngredient, ingredients::parse_ingredients};

/// One saved meal. There is at most one entry per meal and calendar day;
/// saving again the same day replaces the previous content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub meal_name: String,
    pub recorded_at: NaiveDateTime,
    pub ingredients: Vec<SelectedIngredient>,
    pub total_calories: f64,
}

impl JournalEntry {
    #[must_use]
    pub fn recorded_on(&self) -> NaiveDate {
        self.recorded_at.date()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "food_journal")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub meal_id: Uuid,
    pub meal_name: String,
    pub recorded_at: DateTime,
    pub recorded_on: Date,
    /// JSON encoded list of [`SelectedIngredient`].
    pub ingredients: String,
    pub total_calories: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for JournalEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            meal_id: model.meal_id,
            meal_name: model.meal_name,
            recorded_at: model.recorded_at,
            ingredients: parse_ingredients(&model.ingredients)?,
            total_calories: model.total_calories,
        })
    }
}

impl TryFrom<&JournalEntry> for ActiveModel {
    type Error = EngineError;

    fn try_from(entry: &JournalEntry) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(entry.id),
            meal_id: ActiveValue::Set(entry.meal_id),
            meal_name: ActiveValue::Set(entry.meal_name.clone()),
            recorded_at: ActiveValue::Set(entry.recorded_at),
            recorded_on: ActiveValue::Set(entry.recorded_on()),
            ingredients: ActiveValue::Set(serde_json::to_string(&entry.ingredients)?),
            total_calories: ActiveValue::Set(entry.total_calories),
        })
    }
}
