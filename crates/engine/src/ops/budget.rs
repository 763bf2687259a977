use chrono::NaiveDate;
use sea_orm::{DatabaseTransaction, PaginatorTrait, TransactionTrait, prelude::*};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    AllocationLedger, Category, DailyBudget, Exchange, ResultEngine,
    ingredients::parse_ingredients,
    ledger::AllocationSnapshot,
    meals,
    preferences::{
        ALLOCATION_KEY, BUDGET_PREFIX, BUDGET_SET_KEY, DISTRIBUTION_SET_KEY, DRAFT_PREFIX,
        PLANNED_CALORIES_KEY, REALLOCATION_KEY,
    },
};

use super::{Engine, with_tx};

/// Which setup steps are done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetupStatus {
    pub budget_set: bool,
    pub meals_set: bool,
    pub distribution_set: bool,
    pub reallocation_required: bool,
}

impl SetupStatus {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.budget_set && self.meals_set && self.distribution_set && !self.reallocation_required
    }
}

fn draft_key(meal_id: Uuid) -> String {
    format!("{DRAFT_PREFIX}{meal_id}")
}

impl Engine {
    /// Return the stored daily budget. Categories never set read as 0.
    pub async fn daily_budget(&self) -> ResultEngine<DailyBudget> {
        with_tx!(self, |db_tx| self.load_budget(&db_tx).await)
    }

    /// Store the daily budget as set up by the user.
    ///
    /// A change to a budget that is already distributed clears every meal
    /// allocation and ingredient draft, and the budget has to be distributed
    /// again. Returns `true` when that happened.
    pub async fn save_daily_budget(&self, budget: &DailyBudget) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let previous = self.load_budget(&db_tx).await?;
            self.store_budget(&db_tx, budget).await?;
            if previous == *budget {
                Ok(false)
            } else {
                self.discard_distribution(&db_tx).await
            }
        })
    }

    /// Replace the daily budget and clear every allocation and ingredient.
    pub async fn reset_daily_budget(&self, budget: DailyBudget) -> ResultEngine<AllocationLedger> {
        let mut ledger = self.load_ledger(None).await?;
        ledger.reset_daily_budget(budget);
        self.save_ledger(&mut ledger).await?;
        Ok(ledger)
    }

    /// Rebuild the ledger from the store.
    ///
    /// Meals without a saved ingredient draft start from the journal entry
    /// recorded on `today`, when one is given and exists.
    pub async fn load_ledger(&self, today: Option<NaiveDate>) -> ResultEngine<AllocationLedger> {
        with_tx!(self, |db_tx| {
            let budget = self.load_budget(&db_tx).await?;
            let meal_ids: Vec<Uuid> = meals::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();
            let snapshot = self.load_snapshot(&db_tx).await?;

            let mut ledger = AllocationLedger::restore(budget, meal_ids.clone(), snapshot);
            if self.flag(&db_tx, REALLOCATION_KEY).await? {
                ledger.require_reallocation();
            }

            for meal_id in meal_ids {
                let saved = match self.preference(&db_tx, &draft_key(meal_id)).await? {
                    Some(json) => parse_ingredients(&json)?,
                    None => match today {
                        Some(day) => self
                            .journal_entry_on(&db_tx, meal_id, day)
                            .await?
                            .map(|entry| entry.ingredients)
                            .unwrap_or_default(),
                        None => Vec::new(),
                    },
                };
                if saved.is_empty() {
                    continue;
                }
                let dropped = ledger.restore_ingredients(meal_id, saved);
                if dropped > 0 {
                    warn!(%meal_id, dropped, "saved ingredients no longer fit the allocation");
                }
            }

            ledger.take_events();
            Ok(ledger)
        })
    }

    /// Persist the ledger: budget, allocation snapshot, ingredient drafts and
    /// flags. Queued events are drained.
    pub async fn save_ledger(&self, ledger: &mut AllocationLedger) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.store_budget(&db_tx, ledger.budget()).await?;
            let snapshot = serde_json::to_string(&ledger.allocation_snapshot())?;
            self.set_preference(&db_tx, ALLOCATION_KEY, snapshot).await?;

            self.delete_preferences_with_prefix(&db_tx, DRAFT_PREFIX)
                .await?;
            let meal_ids: Vec<Uuid> = ledger.meal_ids().collect();
            for meal_id in meal_ids {
                let ingredients = ledger.ingredients(meal_id);
                if ingredients.is_empty() {
                    continue;
                }
                let json = serde_json::to_string(ingredients)?;
                self.set_preference(&db_tx, &draft_key(meal_id), json)
                    .await?;
            }

            let reallocation_required = ledger.reallocation_required();
            self.set_flag(&db_tx, REALLOCATION_KEY, reallocation_required)
                .await?;
            self.set_flag(
                &db_tx,
                DISTRIBUTION_SET_KEY,
                ledger.is_complete() && !reallocation_required,
            )
            .await?;

            for event in ledger.take_events() {
                debug!(?event, "ledger change saved");
            }
            Ok(())
        })
    }

    /// Which setup steps have been completed.
    pub async fn setup_status(&self) -> ResultEngine<SetupStatus> {
        with_tx!(self, |db_tx| {
            Ok(SetupStatus {
                budget_set: self.flag(&db_tx, BUDGET_SET_KEY).await?,
                meals_set: meals::Entity::find().count(&db_tx).await? > 0,
                distribution_set: self.flag(&db_tx, DISTRIBUTION_SET_KEY).await?,
                reallocation_required: self.flag(&db_tx, REALLOCATION_KEY).await?,
            })
        })
    }

    pub(super) async fn load_budget(&self, db_tx: &DatabaseTransaction) -> ResultEngine<DailyBudget> {
        let mut budget = DailyBudget::new();
        for (key, value) in self.preferences_with_prefix(db_tx, BUDGET_PREFIX).await? {
            let label = key.trim_start_matches(BUDGET_PREFIX);
            let Some(category) = Category::from_label(label) else {
                warn!(%key, "ignoring budget entry of unknown category");
                continue;
            };
            match value.parse::<Exchange>() {
                Ok(amount) => budget.set(category, amount),
                Err(err) => warn!(%key, %err, "ignoring unreadable budget entry"),
            }
        }
        Ok(budget)
    }

    async fn store_budget(&self, db_tx: &DatabaseTransaction, budget: &DailyBudget) -> ResultEngine<()> {
        for (category, amount) in budget.all() {
            let key = format!("{BUDGET_PREFIX}{}", category.slug());
            self.set_preference(db_tx, &key, amount.to_string()).await?;
        }
        self.set_preference(
            db_tx,
            PLANNED_CALORIES_KEY,
            budget.total_calories().to_string(),
        )
        .await?;
        self.set_flag(db_tx, BUDGET_SET_KEY, !budget.is_empty()).await
    }

    /// Drop the allocation snapshot and every draft. Returns `false` when
    /// nothing was allocated yet.
    async fn discard_distribution(&self, db_tx: &DatabaseTransaction) -> ResultEngine<bool> {
        let snapshot = self.load_snapshot(db_tx).await?;
        if snapshot.values().all(|allocation| allocation.is_empty()) {
            return Ok(false);
        }
        self.delete_preference(db_tx, ALLOCATION_KEY).await?;
        self.delete_preferences_with_prefix(db_tx, DRAFT_PREFIX)
            .await?;
        self.set_flag(db_tx, REALLOCATION_KEY, true).await?;
        self.set_flag(db_tx, DISTRIBUTION_SET_KEY, false).await?;
        debug!(meals = snapshot.len(), "budget changed, distribution discarded");
        Ok(true)
    }

    pub(super) async fn load_snapshot(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<AllocationSnapshot> {
        match self.preference(db_tx, ALLOCATION_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(AllocationSnapshot::new()),
        }
    }

    /// Drop allocations and drafts of deleted meals. Freed budget requires a
    /// new distribution.
    pub(super) async fn prune_meals(
        &self,
        db_tx: &DatabaseTransaction,
        meal_ids: &[Uuid],
    ) -> ResultEngine<()> {
        let mut snapshot = self.load_snapshot(db_tx).await?;
        let mut freed = false;
        for meal_id in meal_ids {
            if let Some(allocation) = snapshot.remove(meal_id) {
                freed |= !allocation.is_empty();
            }
            self.delete_preference(db_tx, &draft_key(*meal_id)).await?;
        }
        self.set_preference(db_tx, ALLOCATION_KEY, serde_json::to_string(&snapshot)?)
            .await?;
        if freed {
            self.set_flag(db_tx, REALLOCATION_KEY, true).await?;
            self.set_flag(db_tx, DISTRIBUTION_SET_KEY, false).await?;
        }
        Ok(())
    }
}
