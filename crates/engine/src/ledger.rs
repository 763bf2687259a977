//! The allocation ledger: daily budget → meals → ingredients.
//!
//! The ledger owns the whole allocation state of one planning session and is
//! the only place where it changes. Two conservation rules hold after every
//! operation:
//!
//! - for every category, the sum of the meal allocations never exceeds the
//!   daily budget;
//! - inside a meal, for every category, the sum of the ingredient amounts
//!   never exceeds the meal allocation.
//!
//! Amounts are integer hundredths ([`Exchange`]), so every comparison is exact.
//!
//! References to meals or ingredients the ledger does not know are ignored:
//! they come from stale screens or snapshots, not from user mistakes.
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    Category, DailyBudget, EngineError, Exchange, JournalEntry, Meal, MealAllocation,
    ResultEngine, SelectedIngredient, Step,
    calories::total_calories,
    catalog::{FoodCatalog, resolve, resolve_default},
    foods::MeasurementState,
    ingredients::IngredientKey,
};

/// Meal id → allocation, as persisted between sessions.
pub type AllocationSnapshot = BTreeMap<Uuid, MealAllocation>;

/// Change notifications queued by successful mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    MealAllocationChanged {
        meal_id: Uuid,
        category: Category,
        amount: Exchange,
    },
    IngredientsChanged {
        meal_id: Uuid,
    },
    BudgetReset,
    MealForgotten {
        meal_id: Uuid,
    },
}

#[derive(Clone, Debug, Default)]
pub struct AllocationLedger {
    budget: DailyBudget,
    meals: AllocationSnapshot,
    ingredients: HashMap<Uuid, Vec<SelectedIngredient>>,
    step: Step,
    reallocation_required: bool,
    events: Vec<LedgerEvent>,
}

impl AllocationLedger {
    #[must_use]
    pub fn new(budget: DailyBudget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Rebuilds a ledger from persisted state.
    ///
    /// Snapshot entries of meals not in `meal_ids` are dropped and meals
    /// without an entry start empty. A snapshot that allocates more than the
    /// budget allows is discarded as a whole and re-allocation is required.
    pub fn restore<I>(budget: DailyBudget, meal_ids: I, mut snapshot: AllocationSnapshot) -> Self
    where
        I: IntoIterator<Item = Uuid>,
    {
        let mut ledger = Self::new(budget);
        for meal_id in meal_ids {
            let allocation = snapshot.remove(&meal_id).unwrap_or_default();
            ledger.meals.insert(meal_id, allocation);
        }
        if !snapshot.is_empty() {
            debug!(stale = snapshot.len(), "dropped allocations of unknown meals");
        }

        if let Some(category) = Category::ALL
            .into_iter()
            .find(|category| ledger.allocated(*category) > ledger.budget.get(*category))
        {
            warn!(%category, "allocation snapshot exceeds the daily budget, discarding it");
            for allocation in ledger.meals.values_mut() {
                *allocation = MealAllocation::new();
            }
            ledger.reallocation_required = true;
        }
        ledger
    }

    /// Re-applies saved ingredients of a meal. Entries that no longer fit are
    /// dropped; returns how many.
    pub fn restore_ingredients(
        &mut self,
        meal_id: Uuid,
        ingredients: Vec<SelectedIngredient>,
    ) -> usize {
        let mut dropped = 0;
        for ingredient in ingredients {
            if let Err(err) = self.allocate_ingredient(meal_id, ingredient) {
                debug!(%meal_id, %err, "dropping saved ingredient");
                dropped += 1;
            }
        }
        dropped
    }

    #[must_use]
    pub fn budget(&self) -> &DailyBudget {
        &self.budget
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    /// `true` after a budget reset (or a discarded snapshot) until the new
    /// allocation is acknowledged.
    #[must_use]
    pub fn reallocation_required(&self) -> bool {
        self.reallocation_required
    }

    pub fn require_reallocation(&mut self) {
        self.reallocation_required = true;
    }

    /// Registers a meal with an empty allocation. Known meals are left as is.
    pub fn track_meal(&mut self, meal_id: Uuid) {
        self.meals.entry(meal_id).or_default();
    }

    /// Drops a meal with its allocation and ingredients.
    ///
    /// Budget freed this way has to be allocated again.
    pub fn forget_meal(&mut self, meal_id: Uuid) {
        let Some(allocation) = self.meals.remove(&meal_id) else {
            debug!(%meal_id, "forget ignored, unknown meal");
            return;
        };
        self.ingredients.remove(&meal_id);
        if !allocation.is_empty() {
            self.reallocation_required = true;
        }
        self.events.push(LedgerEvent::MealForgotten { meal_id });
    }

    pub fn meal_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.meals.keys().copied()
    }

    #[must_use]
    pub fn contains_meal(&self, meal_id: Uuid) -> bool {
        self.meals.contains_key(&meal_id)
    }

    #[must_use]
    pub fn allocation(&self, meal_id: Uuid) -> Option<&MealAllocation> {
        self.meals.get(&meal_id)
    }

    /// Sum of every meal's allocation for `category`.
    #[must_use]
    pub fn allocated(&self, category: Category) -> Exchange {
        self.meals
            .values()
            .map(|allocation| allocation.get(category))
            .sum()
    }

    /// Budget left to distribute for `category`.
    #[must_use]
    pub fn remaining(&self, category: Category) -> Exchange {
        self.budget
            .get(category)
            .saturating_sub(self.allocated(category))
    }

    /// Every category of the budget is fully distributed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        Category::ALL
            .into_iter()
            .all(|category| self.remaining(category).is_zero())
    }

    /// Adds one step to a meal's category, capped at what is left of the
    /// budget. Returns the new amount, `None` for an unknown meal.
    pub fn increment_meal_allocation(
        &mut self,
        meal_id: Uuid,
        category: Category,
        step: Step,
    ) -> Option<Exchange> {
        let remaining = self.remaining(category);
        let Some(allocation) = self.meals.get_mut(&meal_id) else {
            debug!(%meal_id, "increment ignored, unknown meal");
            return None;
        };
        let current = allocation.get(category);
        if remaining.is_zero() {
            return Some(current);
        }

        let next = current + step.amount().min(remaining);
        allocation.set(category, next);
        self.events.push(LedgerEvent::MealAllocationChanged {
            meal_id,
            category,
            amount: next,
        });
        Some(next)
    }

    /// Removes one step from a meal's category. The result never drops below
    /// zero nor below what the meal's ingredients already use.
    pub fn decrement_meal_allocation(
        &mut self,
        meal_id: Uuid,
        category: Category,
        step: Step,
    ) -> Option<Exchange> {
        let used = self.used_in_category(meal_id, category);
        let Some(allocation) = self.meals.get_mut(&meal_id) else {
            debug!(%meal_id, "decrement ignored, unknown meal");
            return None;
        };
        let current = allocation.get(category);
        let next = current.saturating_sub(step.amount()).max(used);
        if next != current {
            allocation.set(category, next);
            self.events.push(LedgerEvent::MealAllocationChanged {
                meal_id,
                category,
                amount: next,
            });
        }
        Some(next)
    }

    /// Replaces the daily budget. Every allocation and ingredient is cleared.
    pub fn reset_daily_budget(&mut self, budget: DailyBudget) {
        self.budget = budget;
        for allocation in self.meals.values_mut() {
            *allocation = MealAllocation::new();
        }
        self.ingredients.clear();
        self.reallocation_required = true;
        self.events.push(LedgerEvent::BudgetReset);
        info!(meals = self.meals.len(), "daily budget reset, allocations cleared");
    }

    /// Confirms a complete allocation and lowers the re-allocation flag.
    pub fn acknowledge_reallocation(&mut self) -> ResultEngine<()> {
        if let Some(category) = Category::ALL
            .into_iter()
            .find(|category| self.remaining(*category).is_positive())
        {
            return Err(EngineError::IncompleteAllocation(format!(
                "{} {category} still to distribute",
                self.remaining(category)
            )));
        }
        self.reallocation_required = false;
        Ok(())
    }

    #[must_use]
    pub fn ingredients(&self, meal_id: Uuid) -> &[SelectedIngredient] {
        self.ingredients.get(&meal_id).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn ingredient(&self, meal_id: Uuid, key: IngredientKey) -> Option<&SelectedIngredient> {
        self.ingredients(meal_id)
            .iter()
            .find(|ingredient| ingredient.key() == key)
    }

    fn ingredient_mut(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
    ) -> Option<&mut SelectedIngredient> {
        self.ingredients
            .get_mut(&meal_id)?
            .iter_mut()
            .find(|ingredient| ingredient.key() == key)
    }

    fn allowed(&self, meal_id: Uuid, category: Category) -> Exchange {
        self.meals
            .get(&meal_id)
            .map_or(Exchange::ZERO, |allocation| allocation.get(category))
    }

    /// Sum of the meal's ingredient amounts for `category`.
    #[must_use]
    pub fn used_in_category(&self, meal_id: Uuid, category: Category) -> Exchange {
        self.ingredients(meal_id)
            .iter()
            .filter(|ingredient| ingredient.category == category)
            .map(|ingredient| ingredient.amount)
            .sum()
    }

    /// Allocation of the meal not yet taken by ingredients.
    #[must_use]
    pub fn meal_remaining(&self, meal_id: Uuid, category: Category) -> Exchange {
        self.allowed(meal_id, category)
            .saturating_sub(self.used_in_category(meal_id, category))
    }

    fn check_capacity(
        &self,
        meal_id: Uuid,
        category: Category,
        amount: Exchange,
        exclude: Option<IngredientKey>,
    ) -> ResultEngine<()> {
        let used: Exchange = self
            .ingredients(meal_id)
            .iter()
            .filter(|ingredient| {
                ingredient.category == category && Some(ingredient.key()) != exclude
            })
            .map(|ingredient| ingredient.amount)
            .sum();
        let allowed = self.allowed(meal_id, category);
        if used + amount > allowed {
            return Err(EngineError::OverBudget(format!(
                "{category}: {amount} requested, {} left",
                allowed.saturating_sub(used)
            )));
        }
        Ok(())
    }

    /// Adds an ingredient if the meal's allocation for its category still
    /// has room for it.
    pub fn allocate_ingredient(
        &mut self,
        meal_id: Uuid,
        ingredient: SelectedIngredient,
    ) -> ResultEngine<()> {
        if !self.contains_meal(meal_id) {
            debug!(%meal_id, "ingredient ignored, unknown meal");
            return Ok(());
        }
        if ingredient.amount.is_zero() {
            return Err(EngineError::InvalidAmount(
                "ingredient amount must be positive".to_string(),
            ));
        }
        let key = ingredient.key();
        if self.ingredient(meal_id, key).is_some() {
            return Err(EngineError::ExistingKey(ingredient.name));
        }
        self.check_capacity(meal_id, key.category, ingredient.amount, None)?;

        self.ingredients
            .entry(meal_id)
            .or_default()
            .push(ingredient);
        self.events.push(LedgerEvent::IngredientsChanged { meal_id });
        Ok(())
    }

    /// Removes an ingredient. Missing ingredients are ignored.
    pub fn remove_ingredient(&mut self, meal_id: Uuid, key: IngredientKey) {
        let Some(list) = self.ingredients.get_mut(&meal_id) else {
            return;
        };
        let before = list.len();
        list.retain(|ingredient| ingredient.key() != key);
        if list.len() != before {
            self.events.push(LedgerEvent::IngredientsChanged { meal_id });
        }
    }

    /// Sets an ingredient amount; zero removes it.
    pub fn adjust_ingredient_amount(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
        amount: Exchange,
    ) -> ResultEngine<()> {
        if self.ingredient(meal_id, key).is_none() {
            debug!(%meal_id, food_id = key.food_id, "adjust ignored, unknown ingredient");
            return Ok(());
        }
        if amount.is_zero() {
            self.remove_ingredient(meal_id, key);
            return Ok(());
        }
        self.check_capacity(meal_id, key.category, amount, Some(key))?;

        if let Some(ingredient) = self.ingredient_mut(meal_id, key) {
            ingredient.amount = amount;
        }
        self.events.push(LedgerEvent::IngredientsChanged { meal_id });
        Ok(())
    }

    pub fn increment_ingredient(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
        step: Step,
    ) -> ResultEngine<()> {
        let Some(current) = self.ingredient(meal_id, key).map(|i| i.amount) else {
            return Ok(());
        };
        self.adjust_ingredient_amount(meal_id, key, current + step.amount())
    }

    /// Removes one step; reaching zero removes the ingredient.
    pub fn decrement_ingredient(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
        step: Step,
    ) -> ResultEngine<()> {
        let Some(current) = self.ingredient(meal_id, key).map(|i| i.amount) else {
            return Ok(());
        };
        self.adjust_ingredient_amount(meal_id, key, current.saturating_sub(step.amount()))
    }

    /// Adds a catalog food with its default measurement.
    ///
    /// The initial amount is the largest step that fits in what the meal has
    /// left for the food's category.
    pub fn add_food(
        &mut self,
        meal_id: Uuid,
        food_id: i32,
        catalog: &FoodCatalog,
    ) -> ResultEngine<()> {
        if !self.contains_meal(meal_id) {
            debug!(%meal_id, "add food ignored, unknown meal");
            return Ok(());
        }
        let food = catalog.food(food_id)?;
        let key = IngredientKey {
            food_id,
            category: food.category,
        };
        if self.ingredient(meal_id, key).is_some() {
            return Err(EngineError::ExistingKey(food.name.clone()));
        }
        let measurement = resolve_default(food)?;
        let Some(step) = Step::largest_within(self.meal_remaining(meal_id, food.category)) else {
            return Err(EngineError::OverBudget(format!(
                "less than {} {} left in this meal",
                Step::Twentieth,
                food.category
            )));
        };

        self.allocate_ingredient(
            meal_id,
            SelectedIngredient::with_measurement(food, measurement, step.amount()),
        )
    }

    /// Switches an ingredient to another state/unit of its food.
    pub fn change_measurement(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
        state: MeasurementState,
        unit: &str,
        catalog: &FoodCatalog,
    ) -> ResultEngine<()> {
        if self.ingredient(meal_id, key).is_none() {
            debug!(%meal_id, food_id = key.food_id, "measurement change ignored, unknown ingredient");
            return Ok(());
        }
        let resolved = resolve(catalog.food(key.food_id)?, state, unit)?;
        if let Some(ingredient) = self.ingredient_mut(meal_id, key) {
            ingredient.state = resolved.state;
            ingredient.unit = resolved.unit;
            ingredient.base_quantity = resolved.base_quantity;
        }
        self.events.push(LedgerEvent::IngredientsChanged { meal_id });
        Ok(())
    }

    /// Turns a measured physical quantity (grams on a scale, for instance)
    /// into the ingredient amount.
    ///
    /// A quantity ≤ 0 removes the ingredient. Otherwise the quantity is
    /// converted with the ingredient's base quantity, rounded to `step` and
    /// clamped to what the meal still allows. Returns the stored amount,
    /// `None` for an unknown ingredient.
    pub fn apply_measured_quantity(
        &mut self,
        meal_id: Uuid,
        key: IngredientKey,
        quantity: f64,
        step: Step,
    ) -> ResultEngine<Option<Exchange>> {
        let Some(ingredient) = self.ingredient(meal_id, key) else {
            return Ok(None);
        };
        if quantity.is_nan() {
            return Err(EngineError::InvalidAmount(
                "measured quantity is not a number".to_string(),
            ));
        }
        if quantity <= 0.0 {
            self.remove_ingredient(meal_id, key);
            return Ok(Some(Exchange::ZERO));
        }
        if !(ingredient.base_quantity.is_finite() && ingredient.base_quantity > 0.0) {
            return Err(EngineError::MeasurementUnavailable(format!(
                "{} has no usable {} quantity",
                ingredient.name, ingredient.unit
            )));
        }

        let rounded = Exchange::round_to_step(quantity / ingredient.base_quantity, step)
            .ok_or_else(|| EngineError::InvalidAmount("measured quantity too large".to_string()))?;
        let others = self
            .used_in_category(meal_id, key.category)
            .saturating_sub(ingredient.amount);
        let ceiling = self.allowed(meal_id, key.category).saturating_sub(others);
        let amount = rounded.min(ceiling);

        self.adjust_ingredient_amount(meal_id, key, amount)?;
        Ok(Some(amount))
    }

    /// Step options offered for ingredients of `category` in the meal.
    #[must_use]
    pub fn ingredient_steps(&self, meal_id: Uuid, category: Category) -> &'static [Step] {
        Step::options_for(self.allowed(meal_id, category))
    }

    /// The meal has something allocated and its ingredients use all of it.
    #[must_use]
    pub fn is_meal_complete(&self, meal_id: Uuid) -> bool {
        let Some(allocation) = self.meals.get(&meal_id) else {
            return false;
        };
        !allocation.is_empty()
            && allocation
                .iter()
                .all(|(category, allowed)| self.used_in_category(meal_id, category) == allowed)
    }

    /// Calories of the meal's allocation.
    #[must_use]
    pub fn meal_calories(&self, meal_id: Uuid) -> f64 {
        self.meals
            .get(&meal_id)
            .map_or(0.0, MealAllocation::total_calories)
    }

    /// Calories of the meal's ingredients.
    #[must_use]
    pub fn ingredient_calories(&self, meal_id: Uuid) -> f64 {
        total_calories(
            self.ingredients(meal_id)
                .iter()
                .map(|ingredient| (ingredient.category, ingredient.amount)),
        )
    }

    /// Snapshot of a complete meal for the food journal.
    pub fn journal_entry(&self, meal: &Meal, at: NaiveDateTime) -> ResultEngine<JournalEntry> {
        if !self.is_meal_complete(meal.id) {
            return Err(EngineError::IncompleteMeal(meal.name.clone()));
        }
        Ok(JournalEntry {
            id: Uuid::new_v4(),
            meal_id: meal.id,
            meal_name: meal.name.clone(),
            recorded_at: at,
            ingredients: self.ingredients(meal.id).to_vec(),
            total_calories: self.ingredient_calories(meal.id),
        })
    }

    #[must_use]
    pub fn allocation_snapshot(&self) -> AllocationSnapshot {
        self.meals.clone()
    }

    /// Drains the queued change events.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::foods::Food;

    fn ex(s: &str) -> Exchange {
        s.parse().unwrap()
    }

    fn budget(entries: &[(Category, &str)]) -> DailyBudget {
        entries
            .iter()
            .map(|(category, amount)| (*category, ex(amount)))
            .collect()
    }

    fn catalog() -> FoodCatalog {
        FoodCatalog::from_json(
            r#"{"foodExchangeTable": [
                {"id": 1, "name": "Apple", "group": "Fruit",
                 "defaultMeasurement": {"state": "raw", "weightType": "net", "unit": "gram"},
                 "measurements": {"raw": {"net": [{"unit": "gram", "amount": 120.0}],
                                          "gross": [{"unit": "piece", "amount": 1.0}]}}},
                {"id": 2, "name": "Banana", "group": "Fruit",
                 "defaultMeasurement": {"state": "raw", "weightType": "net", "unit": "gram"},
                 "measurements": {"raw": {"net": [{"unit": "gram", "amount": 60.0}]}}},
                {"id": 3, "name": "Milk", "group": "Dairy",
                 "defaultMeasurement": {"state": "neutral", "weightType": "net", "unit": "ml"},
                 "measurements": {"neutral": {"net": [{"unit": "ml", "amount": 200.0}]}}},
                {"id": 4, "name": "Pasta", "group": "Bread/Grain/Legume",
                 "defaultMeasurement": {"state": "cooked", "weightType": "net", "unit": "gram"},
                 "measurements": {"raw": {"net": [{"unit": "gram", "amount": 20.0}]}}}
            ]}"#,
        )
        .unwrap()
    }

    fn food(catalog: &FoodCatalog, id: i32) -> &Food {
        catalog.get(id).unwrap()
    }

    fn ingredient(catalog: &FoodCatalog, id: i32, amount: &str) -> SelectedIngredient {
        SelectedIngredient::from_food(food(catalog, id), ex(amount)).unwrap()
    }

    fn key(id: i32, category: Category) -> IngredientKey {
        IngredientKey {
            food_id: id,
            category,
        }
    }

    fn ledger_with_meals(entries: &[(Category, &str)]) -> (AllocationLedger, Uuid, Uuid) {
        let mut ledger = AllocationLedger::new(budget(entries));
        let breakfast = Uuid::new_v4();
        let lunch = Uuid::new_v4();
        ledger.track_meal(breakfast);
        ledger.track_meal(lunch);
        (ledger, breakfast, lunch)
    }

    #[test]
    fn increment_caps_at_remaining() {
        let (mut ledger, breakfast, lunch) = ledger_with_meals(&[(Category::Fruit, "2")]);

        assert_eq!(
            ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One),
            Some(ex("1"))
        );
        assert_eq!(ledger.remaining(Category::Fruit), ex("1"));
        assert_eq!(
            ledger.increment_meal_allocation(lunch, Category::Fruit, Step::Half),
            Some(ex("0.5"))
        );
        assert_eq!(
            ledger.increment_meal_allocation(lunch, Category::Fruit, Step::One),
            Some(ex("1"))
        );
        assert_eq!(ledger.remaining(Category::Fruit), Exchange::ZERO);
        assert!(ledger.is_complete());

        // nothing left: no-op
        ledger.take_events();
        assert_eq!(
            ledger.increment_meal_allocation(lunch, Category::Fruit, Step::One),
            Some(ex("1"))
        );
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn decrement_floors_at_zero() {
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Dairy, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Dairy, Step::Quarter);
        assert_eq!(
            ledger.decrement_meal_allocation(breakfast, Category::Dairy, Step::One),
            Some(Exchange::ZERO)
        );
        assert_eq!(ledger.remaining(Category::Dairy), ex("1"));
        assert!(!ledger.is_complete());
    }

    #[test]
    fn decrement_floors_at_ingredient_usage() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "2")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "1.5"))
            .unwrap();

        assert_eq!(
            ledger.decrement_meal_allocation(breakfast, Category::Fruit, Step::One),
            Some(ex("1.5"))
        );
        assert_eq!(ledger.used_in_category(breakfast, Category::Fruit), ex("1.5"));
    }

    #[test]
    fn unknown_meal_is_ignored() {
        let (mut ledger, _, _) = ledger_with_meals(&[(Category::Fruit, "2")]);
        let ghost = Uuid::new_v4();
        assert_eq!(
            ledger.increment_meal_allocation(ghost, Category::Fruit, Step::One),
            None
        );
        assert!(ledger.allocate_ingredient(ghost, ingredient(&catalog(), 1, "1")).is_ok());
        assert!(ledger.ingredients(ghost).is_empty());
        assert_eq!(ledger.remaining(Category::Fruit), ex("2"));
    }

    #[test]
    fn allocate_ingredient_respects_meal_allocation() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);

        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.5"))
            .unwrap();
        let err = ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 2, "0.75"))
            .unwrap_err();
        assert!(matches!(err, EngineError::OverBudget(_)));
        assert_eq!(ledger.ingredients(breakfast).len(), 1);

        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 2, "0.5"))
            .unwrap();
        assert!(ledger.is_meal_complete(breakfast));
    }

    #[test]
    #[should_panic(expected = "ExistingKey(\"Apple\")")]
    fn fail_duplicate_ingredient() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "2")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.5"))
            .unwrap();
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.25"))
            .unwrap();
    }

    #[test]
    fn adjust_checks_capacity_without_itself() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.5"))
            .unwrap();
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 2, "0.25"))
            .unwrap();

        let apple = key(1, Category::Fruit);
        ledger
            .adjust_ingredient_amount(breakfast, apple, ex("0.75"))
            .unwrap();
        assert!(
            ledger
                .adjust_ingredient_amount(breakfast, apple, ex("0.80"))
                .is_err()
        );
        assert_eq!(ledger.ingredient(breakfast, apple).unwrap().amount, ex("0.75"));

        ledger
            .adjust_ingredient_amount(breakfast, apple, Exchange::ZERO)
            .unwrap();
        assert!(ledger.ingredient(breakfast, apple).is_none());
    }

    #[test]
    fn step_ingredient_up_and_down() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.5"))
            .unwrap();
        let apple = key(1, Category::Fruit);

        ledger
            .increment_ingredient(breakfast, apple, Step::Quarter)
            .unwrap();
        assert!(ledger.increment_ingredient(breakfast, apple, Step::Half).is_err());
        assert_eq!(ledger.ingredient(breakfast, apple).unwrap().amount, ex("0.75"));

        ledger
            .decrement_ingredient(breakfast, apple, Step::Half)
            .unwrap();
        assert_eq!(ledger.ingredient(breakfast, apple).unwrap().amount, ex("0.25"));
        ledger
            .decrement_ingredient(breakfast, apple, Step::Half)
            .unwrap();
        assert!(ledger.ingredients(breakfast).is_empty());

        // removing again is a no-op
        ledger.remove_ingredient(breakfast, apple);
        assert!(ledger.ingredients(breakfast).is_empty());
    }

    #[test]
    fn add_food_picks_largest_fitting_step() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "2")]);
        for _ in 0..3 {
            ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::Quarter);
        }

        ledger.add_food(breakfast, 1, &catalog).unwrap();
        let apple = ledger.ingredient(breakfast, key(1, Category::Fruit)).unwrap();
        assert_eq!(apple.amount, ex("0.5"));
        assert_eq!(apple.unit, "gram");
        assert_eq!(apple.quantity(), 60.0);

        ledger.add_food(breakfast, 2, &catalog).unwrap();
        let banana = ledger.ingredient(breakfast, key(2, Category::Fruit)).unwrap();
        assert_eq!(banana.amount, ex("0.25"));

        assert!(matches!(
            ledger.add_food(breakfast, 1, &catalog),
            Err(EngineError::ExistingKey(_))
        ));
    }

    #[test]
    fn add_food_needs_room_for_the_smallest_step() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "0.03")]);
        assert_eq!(
            ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One),
            Some(ex("0.03"))
        );

        let err = ledger.add_food(breakfast, 1, &catalog).unwrap_err();
        assert_eq!(
            err,
            EngineError::OverBudget("less than 0.05 Fruit left in this meal".to_string())
        );
        assert!(ledger.ingredients(breakfast).is_empty());
    }

    #[test]
    fn add_food_rejections() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[
            (Category::Fruit, "1"),
            (Category::BreadGrainLegume, "1"),
        ]);
        ledger.increment_meal_allocation(breakfast, Category::BreadGrainLegume, Step::One);

        assert!(matches!(
            ledger.add_food(breakfast, 2, &catalog),
            Err(EngineError::OverBudget(_))
        ));
        assert!(matches!(
            ledger.add_food(breakfast, 4, &catalog),
            Err(EngineError::MeasurementUnavailable(_))
        ));
        assert!(matches!(
            ledger.add_food(breakfast, 42, &catalog),
            Err(EngineError::KeyNotFound(_))
        ));
    }

    #[test]
    fn change_measurement_re_resolves() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger.add_food(breakfast, 1, &catalog).unwrap();
        let apple = key(1, Category::Fruit);

        ledger
            .change_measurement(breakfast, apple, MeasurementState::Raw, "piece", &catalog)
            .unwrap();
        let selected = ledger.ingredient(breakfast, apple).unwrap();
        assert_eq!(selected.unit, "piece");
        assert_eq!(selected.base_quantity, 1.0);

        assert!(matches!(
            ledger.change_measurement(breakfast, apple, MeasurementState::Cooked, "gram", &catalog),
            Err(EngineError::MeasurementUnavailable(_))
        ));
    }

    #[test]
    fn measured_quantity_rounds_and_clamps() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1.5")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::Half);
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 1, "0.5"))
            .unwrap();
        ledger
            .allocate_ingredient(breakfast, ingredient(&catalog, 2, "0.5"))
            .unwrap();
        let apple = key(1, Category::Fruit);

        // 100 g / 120 g = 0.833 → 0.8 at step 0.1
        assert_eq!(
            ledger
                .apply_measured_quantity(breakfast, apple, 100.0, Step::Tenth)
                .unwrap(),
            Some(ex("0.8"))
        );
        // 240 g = 2 exchanges, clamped to 1.5 - 0.5
        assert_eq!(
            ledger
                .apply_measured_quantity(breakfast, apple, 240.0, Step::Tenth)
                .unwrap(),
            Some(ex("1"))
        );
        assert_eq!(
            ledger
                .apply_measured_quantity(breakfast, apple, 0.0, Step::Tenth)
                .unwrap(),
            Some(Exchange::ZERO)
        );
        assert!(ledger.ingredient(breakfast, apple).is_none());
        assert_eq!(
            ledger
                .apply_measured_quantity(breakfast, apple, 50.0, Step::Tenth)
                .unwrap(),
            None
        );
    }

    #[test]
    fn ingredient_steps_follow_allowance() {
        let (mut ledger, breakfast, lunch) = ledger_with_meals(&[(Category::Fat, "1.5")]);
        ledger.increment_meal_allocation(breakfast, Category::Fat, Step::One);
        ledger.increment_meal_allocation(lunch, Category::Fat, Step::Half);
        assert_eq!(ledger.ingredient_steps(breakfast, Category::Fat).len(), 5);
        assert_eq!(
            ledger.ingredient_steps(lunch, Category::Fat)[0],
            Step::Half
        );
    }

    #[test]
    fn reset_daily_budget_clears_everything() {
        let catalog = catalog();
        let (mut ledger, breakfast, lunch) = ledger_with_meals(&[(Category::Fruit, "2")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger.increment_meal_allocation(lunch, Category::Fruit, Step::One);
        ledger.add_food(breakfast, 1, &catalog).unwrap();
        ledger.take_events();

        ledger.reset_daily_budget(budget(&[(Category::Fruit, "3"), (Category::Fat, "1")]));
        assert!(ledger.reallocation_required());
        assert_eq!(ledger.take_events(), vec![LedgerEvent::BudgetReset]);
        assert_eq!(ledger.allocated(Category::Fruit), Exchange::ZERO);
        assert!(ledger.ingredients(breakfast).is_empty());
        assert_eq!(ledger.remaining(Category::Fruit), ex("3"));
        assert_eq!(ledger.meal_ids().count(), 2);

        assert!(matches!(
            ledger.acknowledge_reallocation(),
            Err(EngineError::IncompleteAllocation(_))
        ));
        for _ in 0..3 {
            ledger.increment_meal_allocation(lunch, Category::Fruit, Step::One);
        }
        ledger.increment_meal_allocation(breakfast, Category::Fat, Step::One);
        ledger.acknowledge_reallocation().unwrap();
        assert!(!ledger.reallocation_required());
    }

    #[test]
    fn forget_meal_frees_budget() {
        let catalog = catalog();
        let (mut ledger, breakfast, lunch) = ledger_with_meals(&[(Category::Fruit, "2")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::One);
        ledger.increment_meal_allocation(lunch, Category::Fruit, Step::One);
        ledger.add_food(breakfast, 1, &catalog).unwrap();
        ledger.take_events();

        ledger.forget_meal(breakfast);
        assert_eq!(
            ledger.take_events(),
            vec![LedgerEvent::MealForgotten { meal_id: breakfast }]
        );
        assert!(!ledger.contains_meal(breakfast));
        assert!(ledger.ingredients(breakfast).is_empty());
        assert_eq!(ledger.remaining(Category::Fruit), ex("1"));
        assert!(ledger.reallocation_required());

        ledger.forget_meal(breakfast);
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn restore_drops_stale_meals() {
        let breakfast = Uuid::new_v4();
        let stale = Uuid::new_v4();
        let dinner = Uuid::new_v4();
        let mut snapshot = AllocationSnapshot::new();
        snapshot.insert(breakfast, budget(&[(Category::Fruit, "1")]));
        snapshot.insert(stale, budget(&[(Category::Fruit, "1")]));

        let ledger = AllocationLedger::restore(
            budget(&[(Category::Fruit, "2")]),
            [breakfast, dinner],
            snapshot,
        );
        assert!(!ledger.contains_meal(stale));
        assert_eq!(ledger.allocated(Category::Fruit), ex("1"));
        assert!(ledger.allocation(dinner).unwrap().is_empty());
        assert!(!ledger.reallocation_required());
    }

    #[test]
    fn restore_discards_overallocated_snapshot() {
        let breakfast = Uuid::new_v4();
        let lunch = Uuid::new_v4();
        let mut snapshot = AllocationSnapshot::new();
        snapshot.insert(breakfast, budget(&[(Category::Fruit, "1.5")]));
        snapshot.insert(lunch, budget(&[(Category::Fruit, "1")]));

        let ledger = AllocationLedger::restore(
            budget(&[(Category::Fruit, "2")]),
            [breakfast, lunch],
            snapshot,
        );
        assert!(ledger.reallocation_required());
        assert_eq!(ledger.allocated(Category::Fruit), Exchange::ZERO);
    }

    #[test]
    fn snapshot_json_round_trip() {
        let (mut ledger, breakfast, lunch) =
            ledger_with_meals(&[(Category::Fruit, "2"), (Category::Dairy, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::Quarter);
        ledger.increment_meal_allocation(lunch, Category::Dairy, Step::Tenth);

        let json = serde_json::to_string(&ledger.allocation_snapshot()).unwrap();
        let back: AllocationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger.allocation_snapshot());
        assert_eq!(back[&breakfast].get(Category::Fruit), ex("0.25"));
    }

    #[test]
    fn restore_ingredients_drops_what_no_longer_fits() {
        let catalog = catalog();
        let (mut ledger, breakfast, _) = ledger_with_meals(&[(Category::Fruit, "1")]);
        ledger.increment_meal_allocation(breakfast, Category::Fruit, Step::Half);
        let dropped = ledger.restore_ingredients(
            breakfast,
            vec![ingredient(&catalog, 1, "0.5"), ingredient(&catalog, 2, "0.5")],
        );
        assert_eq!(dropped, 1);
        assert_eq!(ledger.ingredients(breakfast).len(), 1);
    }

    #[test]
    fn journal_entry_requires_complete_meal() {
        let catalog = catalog();
        let mut ledger = AllocationLedger::new(budget(&[
            (Category::Fruit, "1"),
            (Category::Dairy, "1"),
        ]));
        let meal = Meal::main(
            "Breakfast",
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
        .unwrap();
        ledger.track_meal(meal.id);
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        assert!(matches!(
            ledger.journal_entry(&meal, at),
            Err(EngineError::IncompleteMeal(_))
        ));

        ledger.increment_meal_allocation(meal.id, Category::Fruit, Step::One);
        ledger.increment_meal_allocation(meal.id, Category::Dairy, Step::One);
        ledger.add_food(meal.id, 1, &catalog).unwrap();
        assert!(!ledger.is_meal_complete(meal.id));
        ledger.add_food(meal.id, 3, &catalog).unwrap();
        assert!(ledger.is_meal_complete(meal.id));

        let entry = ledger.journal_entry(&meal, at).unwrap();
        assert_eq!(entry.meal_name, "Breakfast");
        assert_eq!(entry.ingredients.len(), 2);
        assert_eq!(entry.total_calories, 174.0);
        assert_eq!(ledger.meal_calories(meal.id), 174.0);
    }

    #[test]
    fn invariants_hold_after_mixed_sequence() {
        let catalog = catalog();
        let (mut ledger, breakfast, lunch) = ledger_with_meals(&[
            (Category::Fruit, "2.5"),
            (Category::Dairy, "1.25"),
        ]);
        let meals = [breakfast, lunch];
        let categories = [Category::Fruit, Category::Dairy];
        let foods = [(1, Category::Fruit), (2, Category::Fruit), (3, Category::Dairy)];

        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let meal = meals[(seed % 2) as usize];
            let category = categories[((seed >> 3) % 2) as usize];
            let step = Step::ALL[((seed >> 5) % 5) as usize];
            let (food_id, food_category) = foods[((seed >> 9) % 3) as usize];
            let food_key = key(food_id, food_category);
            match (seed >> 12) % 6 {
                0 | 1 => {
                    ledger.increment_meal_allocation(meal, category, step);
                }
                2 => {
                    ledger.decrement_meal_allocation(meal, category, step);
                }
                3 => {
                    let _ = ledger.add_food(meal, food_id, &catalog);
                }
                4 => {
                    let _ = ledger.increment_ingredient(meal, food_key, step);
                }
                _ => {
                    let _ = ledger.decrement_ingredient(meal, food_key, step);
                }
            }

            for category in categories {
                assert!(ledger.allocated(category) <= ledger.budget().get(category));
                for meal in meals {
                    assert!(
                        ledger.used_in_category(meal, category)
                            <= ledger.allocation(meal).unwrap().get(category)
                    );
                }
            }
        }
    }
}
