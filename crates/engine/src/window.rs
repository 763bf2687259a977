//! Meal time windows: which meals are happening now and which come next.
//!
//! A window is a pair of times of day. When `start > end` the window wraps
//! past midnight; when `start == end` it spans the whole day.
use chrono::{NaiveTime, TimeDelta, Timelike};

use crate::Meal;

/// How many upcoming meals a schedule lists when the caller has no
/// preference.
pub const DEFAULT_UPCOMING_LIMIT: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MealWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl MealWindow {
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    #[must_use]
    pub fn is_current(&self, now: NaiveTime) -> bool {
        if self.start == self.end {
            true
        } else if self.start < self.end {
            self.start <= now && now < self.end
        } else {
            now >= self.start || now < self.end
        }
    }

    /// A whole-day window is never upcoming. A wrapping window is upcoming
    /// only while both its start and its end lie after `now`.
    #[must_use]
    pub fn is_upcoming(&self, now: NaiveTime) -> bool {
        if self.start == self.end {
            false
        } else if self.start < self.end {
            self.start > now
        } else {
            self.start > now && self.end > now
        }
    }

    /// Offset from today's midnight of the next time this window opens.
    ///
    /// A regular window that already opened today moves to tomorrow, so it
    /// sorts after every start still ahead today.
    #[must_use]
    pub fn next_start(&self, now: NaiveTime) -> TimeDelta {
        let start = since_midnight(self.start);
        if self.start < now && self.start < self.end {
            start + TimeDelta::hours(24)
        } else {
            start
        }
    }
}

fn since_midnight(time: NaiveTime) -> TimeDelta {
    TimeDelta::seconds(i64::from(time.num_seconds_from_midnight()))
        + TimeDelta::nanoseconds(i64::from(time.nanosecond()))
}

/// Meals split into the ones in progress and the next few to come.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule<'a> {
    pub current: Vec<&'a Meal>,
    pub upcoming: Vec<&'a Meal>,
}

/// Orders `meals` by next start and classifies them at `now`.
///
/// Both lists keep that order; `upcoming` holds at most `upcoming_limit`
/// meals. The two lists are computed independently.
#[must_use]
pub fn schedule(meals: &[Meal], now: NaiveTime, upcoming_limit: usize) -> Schedule<'_> {
    let mut sorted: Vec<&Meal> = meals.iter().collect();
    sorted.sort_by_key(|meal| meal.window().next_start(now));

    let current = sorted
        .iter()
        .copied()
        .filter(|meal| meal.window().is_current(now))
        .collect();
    let upcoming = sorted
        .iter()
        .copied()
        .filter(|meal| meal.window().is_upcoming(now))
        .take(upcoming_limit)
        .collect();

    tracing::debug!(%now, total = meals.len(), "meal schedule computed");
    Schedule { current, upcoming }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn w(start: NaiveTime, end: NaiveTime) -> MealWindow {
        MealWindow::new(start, end)
    }

    #[test]
    fn regular_window() {
        let lunch = w(t(12, 0), t(13, 0));
        assert!(lunch.is_current(t(12, 30)));
        assert!(lunch.is_current(t(12, 0)));
        assert!(!lunch.is_current(t(13, 0)));
        assert!(!lunch.is_upcoming(t(12, 30)));
        assert!(lunch.is_upcoming(t(11, 0)));
        assert!(!lunch.is_upcoming(t(14, 0)));
    }

    #[test]
    fn wrapping_window() {
        let late = w(t(23, 0), t(1, 0));
        assert!(late.is_current(t(0, 30)));
        assert!(late.is_current(t(23, 30)));
        assert!(!late.is_current(t(12, 0)));
        // end (01:00) is already behind 12:00
        assert!(!late.is_upcoming(t(12, 0)));
        assert!(late.is_upcoming(t(0, 30)));
    }

    #[test]
    fn whole_day_window() {
        let always = w(t(8, 0), t(8, 0));
        assert!(always.is_current(t(3, 0)));
        assert!(always.is_current(t(20, 0)));
        assert!(!always.is_upcoming(t(3, 0)));
    }

    #[test]
    fn next_start_moves_past_windows_to_tomorrow() {
        let breakfast = w(t(7, 0), t(9, 0));
        assert_eq!(
            breakfast.next_start(t(10, 0)),
            TimeDelta::hours(31)
        );
        assert_eq!(breakfast.next_start(t(6, 0)), TimeDelta::hours(7));
        let late = w(t(23, 0), t(1, 0));
        assert_eq!(late.next_start(t(23, 30)), TimeDelta::hours(23));
    }

    #[test]
    fn schedule_orders_and_limits() {
        let breakfast = Meal::main("Breakfast", t(7, 0), t(9, 0)).unwrap();
        let lunch = Meal::main("Lunch", t(12, 0), t(13, 0)).unwrap();
        let snack = Meal::snack("Snack", &lunch, None).unwrap();
        let dinner = Meal::main("Dinner", t(19, 0), t(20, 0)).unwrap();
        let meals = vec![dinner.clone(), breakfast.clone(), snack.clone(), lunch.clone()];

        let plan = schedule(&meals, t(12, 15), DEFAULT_UPCOMING_LIMIT);
        assert_eq!(plan.current, vec![&lunch]);
        assert_eq!(plan.upcoming, vec![&snack, &dinner]);

        let plan = schedule(&meals, t(6, 0), 5);
        assert!(plan.current.is_empty());
        assert_eq!(plan.upcoming, vec![&breakfast, &lunch, &snack, &dinner]);
    }
}
