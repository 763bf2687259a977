//! Exchange amounts and the step grid they move on.
use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{EngineError, ResultEngine};

/// Non-negative exchange amount represented as **integer hundredths** of a
/// unit.
///
/// Use this type for **all** exchange counts in the engine (daily budget, meal
/// allocations, ingredient amounts). Every stored or displayed amount has
/// exactly two decimals, so sums and comparisons never drift.
///
/// # Examples
///
/// ```rust
/// use engine::Exchange;
///
/// let amount = Exchange::from_hundredths(125);
/// assert_eq!(amount.to_string(), "1.25");
/// assert_eq!(amount.as_f64(), 1.25);
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator, rounds
/// half-up at the second decimal, rejects negatives):
///
/// ```rust
/// use engine::Exchange;
///
/// assert_eq!("2".parse::<Exchange>().unwrap().hundredths(), 200);
/// assert_eq!("0,5".parse::<Exchange>().unwrap().hundredths(), 50);
/// assert_eq!("0.275".parse::<Exchange>().unwrap().hundredths(), 28);
/// assert!("-1".parse::<Exchange>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Exchange(u32);

impl Exchange {
    pub const ZERO: Exchange = Exchange(0);
    pub const ONE: Exchange = Exchange(100);

    /// Creates a new amount from integer hundredths.
    #[must_use]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Returns the raw value in hundredths.
    #[must_use]
    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is greater than 0.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Converts a real number to an amount using its shortest decimal
    /// representation, rounded half-up at the second decimal.
    ///
    /// Returns `None` for negative, NaN or infinite values.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        value.to_string().parse().ok()
    }

    /// Rounds a real number of exchanges to the nearest multiple of `step`.
    ///
    /// Used when a physical quantity (grams from a scale, for instance) is
    /// turned back into exchanges.
    #[must_use]
    pub fn round_to_step(value: f64, step: Step) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let steps = (value / step.as_f64()).round();
        let hundredths = steps * f64::from(step.hundredths());
        if hundredths > f64::from(u32::MAX) {
            return None;
        }
        Some(Self(hundredths as u32))
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Exchange) -> Option<Exchange> {
        self.0.checked_add(rhs.0).map(Exchange)
    }

    /// Checked subtraction (returns `None` when `rhs` is larger).
    #[must_use]
    pub fn checked_sub(self, rhs: Exchange) -> Option<Exchange> {
        self.0.checked_sub(rhs.0).map(Exchange)
    }

    /// Subtraction floored at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Exchange) -> Exchange {
        Exchange(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / 100;
        let hundredths = self.0 % 100;
        f.pad(&format!("{units}.{hundredths:02}"))
    }
}

impl Add for Exchange {
    type Output = Exchange;

    fn add(self, rhs: Exchange) -> Self::Output {
        Exchange(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Exchange {
    fn add_assign(&mut self, rhs: Exchange) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Exchange {
    fn sum<I: Iterator<Item = Exchange>>(iter: I) -> Self {
        iter.fold(Exchange::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Exchange> for Exchange {
    fn sum<I: Iterator<Item = &'a Exchange>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl FromStr for Exchange {
    type Err = EngineError;

    /// Parses a decimal string into hundredths.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`.
    ///
    /// Validation rules:
    /// - rejects empty/invalid strings and negative values
    /// - digits past the second decimal are rounded half-up
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {}", s.trim()));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        if trimmed.starts_with('-') {
            return Err(EngineError::InvalidAmount(
                "amount must not be negative".to_string(),
            ));
        }
        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed).trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() && fraction_str.is_empty() {
            return Err(invalid());
        }
        if !units_str.chars().all(|c| c.is_ascii_digit())
            || !fraction_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        // ".5" reads as 0.5
        let units: u32 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| overflow())?
        };

        let digits: Vec<u32> = fraction_str
            .chars()
            .filter_map(|c| c.to_digit(10))
            .collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let carry = u32::from(digits.get(2).is_some_and(|d| *d >= 5));

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(tenths * 10 + hundredths + carry))
            .map(Exchange)
            .ok_or_else(overflow)
    }
}

impl Serialize for Exchange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Exchange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Exchange::from_f64(value)
            .ok_or_else(|| de::Error::custom(format!("invalid exchange amount: {value}")))
    }
}

/// Granularity of a single increment or decrement.
///
/// Steps never change stored budgets, only how far one `+`/`-` moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Step {
    #[default]
    One,
    Half,
    Quarter,
    Tenth,
    Twentieth,
}

impl Step {
    /// All steps, largest first.
    pub const ALL: [Step; 5] = [
        Step::One,
        Step::Half,
        Step::Quarter,
        Step::Tenth,
        Step::Twentieth,
    ];

    #[must_use]
    pub const fn hundredths(self) -> u32 {
        match self {
            Step::One => 100,
            Step::Half => 50,
            Step::Quarter => 25,
            Step::Tenth => 10,
            Step::Twentieth => 5,
        }
    }

    #[must_use]
    pub const fn amount(self) -> Exchange {
        Exchange(self.hundredths())
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.amount().as_f64()
    }

    /// Steps offered for an ingredient whose category allows `allowed`
    /// exchanges in the meal. A whole-unit step makes no sense below one unit.
    #[must_use]
    pub fn options_for(allowed: Exchange) -> &'static [Step] {
        if allowed < Exchange::ONE {
            &Self::ALL[1..]
        } else {
            &Self::ALL
        }
    }

    /// Largest step that still fits in `remaining`. `None` when less than
    /// the smallest step is left.
    #[must_use]
    pub fn largest_within(remaining: Exchange) -> Option<Step> {
        Self::ALL
            .into_iter()
            .find(|step| step.amount() <= remaining)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.amount().fmt(f)
    }
}

impl TryFrom<Exchange> for Step {
    type Error = EngineError;

    fn try_from(value: Exchange) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|step| step.hundredths() == value.hundredths())
            .ok_or_else(|| EngineError::InvalidAmount(format!("unsupported step: {value}")))
    }
}

impl FromStr for Step {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::try_from(s.parse::<Exchange>()?)
    }
}

/// Confirms `value` lies on the `step` grid, or snaps it there.
///
/// The value is already quantized to two decimals. When it is an exact
/// multiple of `step` it is returned unchanged; otherwise, with `round` set,
/// it snaps to the nearest multiple (ties go up), and without it the value is
/// rejected with `None`.
#[must_use]
pub fn validate_divisible_by_step(value: Exchange, step: Step, round: bool) -> Option<Exchange> {
    let step_h = u64::from(step.hundredths());
    let value_h = u64::from(value.hundredths());
    if value_h % step_h == 0 {
        return Some(value);
    }
    if !round {
        return None;
    }
    let snapped = (2 * value_h + step_h) / (2 * step_h) * step_h;
    u32::try_from(snapped).ok().map(Exchange)
}

/// Parses free text onto the allocation grid.
///
/// This is the input boundary: nothing that fails here ever reaches the
/// ledger.
pub fn parse_exchange_input(text: &str, step: Step, round: bool) -> ResultEngine<Exchange> {
    let value: Exchange = text.parse()?;
    validate_divisible_by_step(value, step, round).ok_or_else(|| {
        EngineError::InvalidAmount(format!("{value} is not a multiple of {step}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(s: &str) -> Exchange {
        s.parse().unwrap()
    }

    #[test]
    fn display_has_two_decimals() {
        assert_eq!(Exchange::from_hundredths(0).to_string(), "0.00");
        assert_eq!(Exchange::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Exchange::from_hundredths(150).to_string(), "1.50");
        assert_eq!(Exchange::from_hundredths(1200).to_string(), "12.00");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(ex("3").hundredths(), 300);
        assert_eq!(ex("0.5").hundredths(), 50);
        assert_eq!(ex("0,25").hundredths(), 25);
        assert_eq!(ex("+1.10").hundredths(), 110);
        assert_eq!(ex("  2.30 ").hundredths(), 230);
        assert_eq!(ex("4.").hundredths(), 400);
        assert_eq!(ex(".5").hundredths(), 50);
        assert_eq!(ex(",25").hundredths(), 25);
    }

    #[test]
    fn parse_rounds_half_up_past_second_decimal() {
        assert_eq!(ex("0.274").hundredths(), 27);
        assert_eq!(ex("0.275").hundredths(), 28);
        assert_eq!(ex("0.2749").hundredths(), 27);
        assert_eq!(ex("0.995").hundredths(), 100);
    }

    #[test]
    fn parse_rejects_garbage_and_negatives() {
        assert!("".parse::<Exchange>().is_err());
        assert!("abc".parse::<Exchange>().is_err());
        assert!("1.2.3".parse::<Exchange>().is_err());
        assert!(".".parse::<Exchange>().is_err());
        assert!("+.".parse::<Exchange>().is_err());
        assert!("1e3".parse::<Exchange>().is_err());
        assert_eq!(
            "-0.5".parse::<Exchange>(),
            Err(EngineError::InvalidAmount(
                "amount must not be negative".to_string()
            ))
        );
    }

    #[test]
    fn from_f64_uses_decimal_representation() {
        assert_eq!(Exchange::from_f64(0.29), Some(Exchange::from_hundredths(29)));
        assert_eq!(Exchange::from_f64(0.285), Some(Exchange::from_hundredths(29)));
        assert_eq!(Exchange::from_f64(2.0), Some(Exchange::from_hundredths(200)));
        assert_eq!(Exchange::from_f64(-0.1), None);
        assert_eq!(Exchange::from_f64(f64::NAN), None);
    }

    #[test]
    fn validate_divisible_by_step_confirms_or_snaps() {
        assert_eq!(
            validate_divisible_by_step(ex("0.30"), Step::Tenth, false),
            Some(ex("0.30"))
        );
        assert_eq!(validate_divisible_by_step(ex("0.27"), Step::Tenth, false), None);
        assert_eq!(
            validate_divisible_by_step(ex("0.27"), Step::Tenth, true),
            Some(ex("0.30"))
        );
        assert_eq!(
            validate_divisible_by_step(ex("0.25"), Step::Tenth, true),
            Some(ex("0.30"))
        );
        assert_eq!(
            validate_divisible_by_step(ex("0.24"), Step::Tenth, true),
            Some(ex("0.20"))
        );
        assert_eq!(
            validate_divisible_by_step(ex("1.12"), Step::Quarter, true),
            Some(ex("1.00"))
        );
        assert_eq!(
            validate_divisible_by_step(ex("1.13"), Step::Quarter, true),
            Some(ex("1.25"))
        );
    }

    #[test]
    fn parse_exchange_input_rejects_off_grid_text() {
        assert_eq!(
            parse_exchange_input("0.3", Step::Tenth, false).unwrap(),
            ex("0.30")
        );
        assert!(parse_exchange_input("0.33", Step::Twentieth, false).is_err());
        assert_eq!(
            parse_exchange_input("0.33", Step::Twentieth, true).unwrap(),
            ex("0.35")
        );
        assert!(parse_exchange_input("two", Step::One, true).is_err());
    }

    #[test]
    fn round_to_step_uses_nearest_multiple() {
        assert_eq!(Exchange::round_to_step(1.3, Step::Half), Some(ex("1.50")));
        assert_eq!(Exchange::round_to_step(1.2, Step::Half), Some(ex("1.00")));
        assert_eq!(Exchange::round_to_step(0.33, Step::Tenth), Some(ex("0.30")));
        assert_eq!(Exchange::round_to_step(-1.0, Step::Tenth), None);
    }

    #[test]
    fn step_options_drop_whole_unit_below_one() {
        assert_eq!(Step::options_for(ex("2")).len(), 5);
        assert_eq!(Step::options_for(ex("0.75")), &Step::ALL[1..]);
        assert_eq!(Step::options_for(ex("0.75"))[0], Step::Half);
    }

    #[test]
    fn largest_step_within_remaining() {
        assert_eq!(Step::largest_within(Exchange::ZERO), None);
        assert_eq!(Step::largest_within(ex("3")), Some(Step::One));
        assert_eq!(Step::largest_within(ex("0.6")), Some(Step::Half));
        assert_eq!(Step::largest_within(ex("0.3")), Some(Step::Quarter));
        assert_eq!(Step::largest_within(ex("0.1")), Some(Step::Tenth));
        assert_eq!(Step::largest_within(ex("0.05")), Some(Step::Twentieth));
        assert_eq!(Step::largest_within(ex("0.03")), None);
    }

    #[test]
    fn step_parses_only_supported_values() {
        assert_eq!("0.25".parse::<Step>().unwrap(), Step::Quarter);
        assert_eq!("1".parse::<Step>().unwrap(), Step::One);
        assert_eq!("0.1".parse::<Step>().unwrap(), Step::Tenth);
        assert!("0.2".parse::<Step>().is_err());
    }

    #[test]
    fn json_round_trip_keeps_two_decimals() {
        let value = ex("1.15");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "1.15");
        assert_eq!(serde_json::from_str::<Exchange>(&json).unwrap(), value);
        assert!(serde_json::from_str::<Exchange>("-1.0").is_err());
    }
}
