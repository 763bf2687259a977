//! Calorie derivation from exchange counts.
//!
//! All functions are pure. Every per-category term is rounded to 2 decimals
//! before it is summed.
use crate::{
    Category, Exchange,
    categories::coefficients_for_label,
    util::round2,
};

/// Calories of `count` exchanges of `category`, rounded to 2 decimals.
#[must_use]
pub fn calories_for_category(category: Category, count: Exchange) -> f64 {
    round2(category.coefficients().calories_per_unit() * count.as_f64())
}

/// Same as [`calories_for_category`] for a free-form label. Unknown labels
/// contribute 0.
#[must_use]
pub fn calories_for_label(label: &str, count: Exchange) -> f64 {
    round2(coefficients_for_label(label).calories_per_unit() * count.as_f64())
}

/// Sum of the rounded per-category terms.
#[must_use]
pub fn total_calories<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = (Category, Exchange)>,
{
    round2(
        amounts
            .into_iter()
            .map(|(category, count)| calories_for_category(category, count))
            .sum(),
    )
}
