//! Food categories and their per-exchange macronutrient coefficients.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, util::normalize_key};

/// Closed, ordered set of exchange categories.
///
/// Each category has an English display label, a short slug used in
/// preference keys and on the command line, and a legacy label used by older
/// food catalogs. [`Category::from_label`] accepts all three, also in
/// diacritic/case-insensitive form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Dairy,
    MeatCheeseEgg,
    BreadGrainLegume,
    Fruit,
    Vegetable,
    Fat,
    NutsSeeds,
}

/// Grams of carbohydrate, protein and fat in one exchange unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExchangeCoefficients {
    pub carb_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
}

impl ExchangeCoefficients {
    pub const ZERO: ExchangeCoefficients = ExchangeCoefficients::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(carb_g: f64, protein_g: f64, fat_g: f64) -> Self {
        Self {
            carb_g,
            protein_g,
            fat_g,
        }
    }

    /// Calories of one unit: 4 kcal per gram of carbohydrate or protein, 9 per
    /// gram of fat.
    #[must_use]
    pub fn calories_per_unit(self) -> f64 {
        self.carb_g * 4.0 + self.protein_g * 4.0 + self.fat_g * 9.0
    }
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Dairy,
        Category::MeatCheeseEgg,
        Category::BreadGrainLegume,
        Category::Fruit,
        Category::Vegetable,
        Category::Fat,
        Category::NutsSeeds,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::Dairy => "Dairy",
            Category::MeatCheeseEgg => "Meat/Cheese/Egg",
            Category::BreadGrainLegume => "Bread/Grain/Legume",
            Category::Fruit => "Fruit",
            Category::Vegetable => "Vegetable",
            Category::Fat => "Fat",
            Category::NutsSeeds => "Nuts/Seeds",
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Category::Dairy => "dairy",
            Category::MeatCheeseEgg => "meat",
            Category::BreadGrainLegume => "bread",
            Category::Fruit => "fruit",
            Category::Vegetable => "vegetable",
            Category::Fat => "fat",
            Category::NutsSeeds => "nuts",
        }
    }

    /// Label used by legacy food catalogs.
    #[must_use]
    pub const fn legacy_label(self) -> &'static str {
        match self {
            Category::Dairy => "Süt/Yoğurt",
            Category::MeatCheeseEgg => "Et/Peynir/Yumurta",
            Category::BreadGrainLegume => "Ekmek/Tahıl/Kurubaklagil",
            Category::Fruit => "Meyve",
            Category::Vegetable => "Sebze",
            Category::Fat => "Yağ",
            Category::NutsSeeds => "Yağlı Tohumlar/Sert Kabuklu Kuruyemişler",
        }
    }

    #[must_use]
    pub const fn coefficients(self) -> ExchangeCoefficients {
        match self {
            Category::Dairy => ExchangeCoefficients::new(9.0, 6.0, 6.0),
            Category::MeatCheeseEgg => ExchangeCoefficients::new(0.0, 6.0, 5.0),
            Category::BreadGrainLegume => ExchangeCoefficients::new(15.0, 2.0, 0.0),
            Category::Fruit => ExchangeCoefficients::new(15.0, 0.0, 0.0),
            Category::Vegetable => ExchangeCoefficients::new(6.0, 2.0, 0.0),
            Category::Fat => ExchangeCoefficients::new(0.0, 0.0, 5.0),
            Category::NutsSeeds => ExchangeCoefficients::new(0.0, 2.0, 5.0),
        }
    }

    /// Resolves a display label, slug or legacy label.
    #[must_use]
    pub fn from_label(value: &str) -> Option<Category> {
        let trimmed = value.trim();
        if let Some(found) = Self::ALL
            .into_iter()
            .find(|c| c.label() == trimmed || c.legacy_label() == trimmed)
        {
            return Some(found);
        }
        let key = normalize_key(trimmed)?;
        Self::ALL.into_iter().find(|c| {
            [c.label(), c.slug(), c.legacy_label()]
                .iter()
                .any(|candidate| normalize_key(candidate).as_deref() == Some(key.as_str()))
        })
    }
}

/// Coefficients for a free-form label; unknown labels contribute nothing.
#[must_use]
pub fn coefficients_for_label(label: &str) -> ExchangeCoefficients {
    Category::from_label(label).map_or(ExchangeCoefficients::ZERO, Category::coefficients)
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Category::from_label(value)
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {}", value.trim())))
    }
}

impl TryFrom<String> for Category {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Category::try_from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calories_per_unit_follow_macro_table() {
        assert_eq!(Category::Dairy.coefficients().calories_per_unit(), 114.0);
        assert_eq!(Category::MeatCheeseEgg.coefficients().calories_per_unit(), 69.0);
        assert_eq!(Category::BreadGrainLegume.coefficients().calories_per_unit(), 68.0);
        assert_eq!(Category::Fruit.coefficients().calories_per_unit(), 60.0);
        assert_eq!(Category::Vegetable.coefficients().calories_per_unit(), 32.0);
        assert_eq!(Category::Fat.coefficients().calories_per_unit(), 45.0);
        assert_eq!(Category::NutsSeeds.coefficients().calories_per_unit(), 53.0);
    }

    #[test]
    fn from_label_accepts_every_spelling() {
        assert_eq!(Category::from_label("Dairy"), Some(Category::Dairy));
        assert_eq!(Category::from_label("Süt/Yoğurt"), Some(Category::Dairy));
        assert_eq!(Category::from_label("sut yogurt"), Some(Category::Dairy));
        assert_eq!(Category::from_label("meat"), Some(Category::MeatCheeseEgg));
        assert_eq!(
            Category::from_label("ekmek/tahil/kurubaklagil"),
            Some(Category::BreadGrainLegume)
        );
        assert_eq!(
            Category::from_label("Yağlı Tohumlar/Sert Kabuklu Kuruyemişler"),
            Some(Category::NutsSeeds)
        );
        assert_eq!(Category::from_label("Sweets"), None);
    }

    #[test]
    fn unknown_label_has_zero_coefficients() {
        assert_eq!(coefficients_for_label("Sweets"), ExchangeCoefficients::ZERO);
        assert_eq!(coefficients_for_label("Meyve"), Category::Fruit.coefficients());
    }

    #[test]
    fn serde_uses_display_label_and_reads_legacy() {
        assert_eq!(
            serde_json::to_string(&Category::NutsSeeds).unwrap(),
            "\"Nuts/Seeds\""
        );
        let parsed: Category = serde_json::from_str("\"Sebze\"").unwrap();
        assert_eq!(parsed, Category::Vegetable);
        assert!(serde_json::from_str::<Category>("\"Candy\"").is_err());
    }
}
