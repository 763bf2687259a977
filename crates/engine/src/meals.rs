//! The module contains the representation of a meal.
use chrono::{NaiveTime, TimeDelta};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::normalize_required_name,
    window::MealWindow,
};

/// Main meals carry the day; snacks hang off a main meal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MealKind {
    #[default]
    #[serde(alias = "MAIN_MEAL")]
    Main,
    Snack,
}

impl MealKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MealKind::Main => "MAIN",
            MealKind::Snack => "SNACK",
        }
    }
}

impl TryFrom<&str> for MealKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MAIN" | "MAIN_MEAL" => Ok(MealKind::Main),
            "SNACK" => Ok(MealKind::Snack),
            other => Err(EngineError::InvalidMeal(format!("unknown meal type: {other}"))),
        }
    }
}

/// A planned meal with its daily time window.
///
/// A snack always references the main meal it belongs to; a main meal never
/// has a parent. Windows may wrap past midnight (`start > end`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub name: String,
    pub kind: MealKind,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub parent_id: Option<Uuid>,
}

impl Meal {
    /// Creates a main meal.
    pub fn main(name: &str, start: NaiveTime, end: NaiveTime) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_required_name(name, "meal")?,
            kind: MealKind::Main,
            start,
            end,
            parent_id: None,
        })
    }

    /// Creates a snack attached to `parent`.
    ///
    /// Without an explicit window the snack starts one hour after the parent
    /// ends and lasts one hour.
    pub fn snack(
        name: &str,
        parent: &Meal,
        window: Option<(NaiveTime, NaiveTime)>,
    ) -> ResultEngine<Self> {
        if parent.kind != MealKind::Main {
            return Err(EngineError::InvalidMeal(format!(
                "snack parent '{}' is not a main meal",
                parent.name
            )));
        }
        let (start, end) = window.unwrap_or_else(|| default_snack_window(parent.end));
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_required_name(name, "snack")?,
            kind: MealKind::Snack,
            start,
            end,
            parent_id: Some(parent.id),
        })
    }

    /// Checks the name and the parent reference against the meal kind.
    pub fn validate(&self) -> ResultEngine<()> {
        normalize_required_name(&self.name, "meal")?;
        match (self.kind, self.parent_id) {
            (MealKind::Main, Some(_)) => Err(EngineError::InvalidMeal(format!(
                "main meal '{}' cannot have a parent",
                self.name
            ))),
            (MealKind::Snack, None) => Err(EngineError::InvalidMeal(format!(
                "snack '{}' requires a parent meal",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn window(&self) -> MealWindow {
        MealWindow::new(self.start, self.end)
    }

    #[must_use]
    pub fn is_snack(&self) -> bool {
        self.kind == MealKind::Snack
    }
}

/// `[parent_end + 1h, parent_end + 2h)`, wrapping past midnight.
#[must_use]
pub fn default_snack_window(parent_end: NaiveTime) -> (NaiveTime, NaiveTime) {
    (
        parent_end + TimeDelta::hours(1),
        parent_end + TimeDelta::hours(2),
    )
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "meals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub start_time: Time,
    pub end_time: Time,
    pub parent_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Meal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            kind: MealKind::try_from(model.kind.as_str())?,
            start: model.start_time,
            end: model.end_time,
            parent_id: model.parent_id,
        })
    }
}

impl From<&Meal> for ActiveModel {
    fn from(meal: &Meal) -> Self {
        Self {
            id: ActiveValue::Set(meal.id),
            name: ActiveValue::Set(meal.name.clone()),
            kind: ActiveValue::Set(meal.kind.as_str().to_string()),
            start_time: ActiveValue::Set(meal.start),
            end_time: ActiveValue::Set(meal.end),
            parent_id: ActiveValue::Set(meal.parent_id),
        }
    }
}
