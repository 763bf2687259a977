//! Category → amount maps used for the daily budget and meal allocations.
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::{Category, Exchange, Step, calories::total_calories};

/// Exchange amount per category. Categories never set read as 0.
///
/// Deserializing skips entries whose label is not a known category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryAmounts(BTreeMap<Category, Exchange>);

/// Exchanges per category for a whole day.
pub type DailyBudget = CategoryAmounts;

/// Exchanges per category assigned to a single meal.
pub type MealAllocation = CategoryAmounts;

impl CategoryAmounts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, category: Category) -> Exchange {
        self.0.get(&category).copied().unwrap_or_default()
    }

    /// Sets an amount; zero entries are dropped.
    pub fn set(&mut self, category: Category, amount: Exchange) {
        if amount.is_zero() {
            self.0.remove(&category);
        } else {
            self.0.insert(category, amount);
        }
    }

    /// Adds one step to the category.
    pub fn increment(&mut self, category: Category, step: Step) -> Exchange {
        let next = self.get(category) + step.amount();
        self.set(category, next);
        next
    }

    /// Removes one step from the category, floored at 0.
    pub fn decrement(&mut self, category: Category, step: Step) -> Exchange {
        let next = self.get(category).saturating_sub(step.amount());
        self.set(category, next);
        next
    }

    /// Non-zero entries in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Exchange)> + '_ {
        self.0.iter().map(|(category, amount)| (*category, *amount))
    }

    /// Every category, including the zero ones, in category order.
    pub fn all(&self) -> impl Iterator<Item = (Category, Exchange)> + '_ {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.get(category)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn total_calories(&self) -> f64 {
        total_calories(self.iter())
    }
}

impl FromIterator<(Category, Exchange)> for CategoryAmounts {
    fn from_iter<T: IntoIterator<Item = (Category, Exchange)>>(iter: T) -> Self {
        let mut amounts = CategoryAmounts::new();
        for (category, amount) in iter {
            amounts.set(category, amount);
        }
        amounts
    }
}

impl<'de> Deserialize<'de> for CategoryAmounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Exchange>::deserialize(deserializer)?;
        let mut amounts = CategoryAmounts::new();
        for (label, amount) in raw {
            match Category::from_label(&label) {
                Some(category) => amounts.set(category, amount),
                None => warn!(%label, "ignoring amount of unknown category"),
            }
        }
        Ok(amounts)
    }
}
