//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`OverBudget`] returned when an allocation would exceed what is left.
//! - [`InvalidAmount`] returned when free text is not a usable exchange amount.
//! - [`MeasurementUnavailable`] returned when a food has no measurement for a
//!   state.
//! - [`KeyNotFound`] returned when an item is not found in the store.
//!
//! Stale references (a meal or an ingredient that no longer exists) are not
//! errors: the ledger drops them silently.
//!
//!  [`OverBudget`]: EngineError::OverBudget
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`MeasurementUnavailable`]: EngineError::MeasurementUnavailable
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Over budget: {0}")]
    OverBudget(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Measurement unavailable: {0}")]
    MeasurementUnavailable(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid meal: {0}")]
    InvalidMeal(String),
    #[error("Incomplete meal: {0}")]
    IncompleteMeal(String),
    #[error("Incomplete allocation: {0}")]
    IncompleteAllocation(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for rejections the user can fix by changing the input,
    /// as opposed to store or encoding failures.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::OverBudget(a), Self::OverBudget(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::MeasurementUnavailable(a), Self::MeasurementUnavailable(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidMeal(a), Self::InvalidMeal(b)) => a == b,
            (Self::IncompleteMeal(a), Self::IncompleteMeal(b)) => a == b,
            (Self::IncompleteAllocation(a), Self::IncompleteAllocation(b)) => a == b,
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
