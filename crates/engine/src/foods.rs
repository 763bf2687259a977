//! The module contains the representation of a catalog food.
//!
//! A food lists, per preparation state, the physical quantity that makes up
//! one exchange in several units. `net` quantities are cleaned/edible weights,
//! `gross` ones include peel, bones and the like.
use std::fmt;

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{Category, EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementState {
    Raw,
    Cooked,
    #[default]
    Neutral,
}

impl MeasurementState {
    pub const ALL: [MeasurementState; 3] = [
        MeasurementState::Raw,
        MeasurementState::Cooked,
        MeasurementState::Neutral,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MeasurementState::Raw => "raw",
            MeasurementState::Cooked => "cooked",
            MeasurementState::Neutral => "neutral",
        }
    }
}

impl fmt::Display for MeasurementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MeasurementState {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(MeasurementState::Raw),
            "cooked" => Ok(MeasurementState::Cooked),
            "neutral" => Ok(MeasurementState::Neutral),
            other => Err(EngineError::MeasurementUnavailable(format!(
                "unknown measurement state: {other}"
            ))),
        }
    }
}

/// Physical quantity of one exchange in `unit`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleMeasurement {
    pub unit: String,
    pub amount: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDetail {
    #[serde(default)]
    pub gross: Vec<SingleMeasurement>,
    #[serde(default)]
    pub net: Vec<SingleMeasurement>,
}

impl MeasurementDetail {
    /// Net quantities first, then gross ones.
    pub fn units(&self) -> impl Iterator<Item = &SingleMeasurement> {
        self.net.iter().chain(self.gross.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.net.is_empty() && self.gross.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<MeasurementDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooked: Option<MeasurementDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<MeasurementDetail>,
}

impl Measurements {
    #[must_use]
    pub fn detail(&self, state: MeasurementState) -> Option<&MeasurementDetail> {
        match state {
            MeasurementState::Raw => self.raw.as_ref(),
            MeasurementState::Cooked => self.cooked.as_ref(),
            MeasurementState::Neutral => self.neutral.as_ref(),
        }
    }

    /// `true` when `state` has at least one unit.
    #[must_use]
    pub fn has(&self, state: MeasurementState) -> bool {
        self.detail(state).is_some_and(|detail| !detail.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultMeasurement {
    pub state: MeasurementState,
    #[serde(default)]
    pub weight_type: String,
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: i32,
    pub name: String,
    #[serde(rename = "group")]
    pub category: Category,
    pub default_measurement: DefaultMeasurement,
    #[serde(default)]
    pub measurements: Measurements,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "foods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub category: String,
    pub default_state: String,
    pub default_weight_type: String,
    pub default_unit: String,
    /// JSON encoded [`Measurements`].
    pub measurements: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Food {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            name: model.name,
            category: Category::try_from(model.category.as_str())?,
            default_measurement: DefaultMeasurement {
                state: MeasurementState::try_from(model.default_state.as_str())?,
                weight_type: model.default_weight_type,
                unit: model.default_unit,
            },
            measurements: serde_json::from_str(&model.measurements)?,
        })
    }
}

impl TryFrom<&Food> for ActiveModel {
    type Error = EngineError;

    fn try_from(food: &Food) -> ResultEngine<Self> {
        Ok(Self {
            id: ActiveValue::Set(food.id),
            name: ActiveValue::Set(food.name.clone()),
            category: ActiveValue::Set(food.category.label().to_string()),
            default_state: ActiveValue::Set(food.default_measurement.state.as_str().to_string()),
            default_weight_type: ActiveValue::Set(food.default_measurement.weight_type.clone()),
            default_unit: ActiveValue::Set(food.default_measurement.unit.clone()),
            measurements: ActiveValue::Set(serde_json::to_string(&food.measurements)?),
        })
    }
}
