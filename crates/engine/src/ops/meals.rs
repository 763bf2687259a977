use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    EngineError, Meal, MealKind, ResultEngine, meals,
    preferences::{ALLOCATION_KEY, DISTRIBUTION_SET_KEY, DRAFT_PREFIX},
};

use super::{Engine, with_tx};

impl Engine {
    /// Return every meal, ordered by start time.
    pub async fn meals(&self) -> ResultEngine<Vec<Meal>> {
        with_tx!(self, |db_tx| {
            meals::Entity::find()
                .order_by_asc(meals::Column::StartTime)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Meal::try_from)
                .collect::<ResultEngine<Vec<Meal>>>()
        })
    }

    /// Return a meal snapshot from DB.
    pub async fn meal(&self, id: Uuid) -> ResultEngine<Meal> {
        with_tx!(self, |db_tx| self.require_meal(&db_tx, id).await)
    }

    /// Add a new meal. A snack's parent must be a stored main meal.
    pub async fn new_meal(&self, meal: &Meal) -> ResultEngine<Uuid> {
        meal.validate()?;
        with_tx!(self, |db_tx| {
            if meals::Entity::find_by_id(meal.id)
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(meal.id.to_string()));
            }
            self.check_parent(&db_tx, meal).await?;

            let model: meals::ActiveModel = meal.into();
            model.insert(&db_tx).await?;
            info!(meal_id = %meal.id, name = %meal.name, kind = meal.kind.as_str(), "meal added");
            Ok(meal.id)
        })
    }

    /// Update name, window and parent of an existing meal.
    pub async fn update_meal(&self, meal: &Meal) -> ResultEngine<()> {
        meal.validate()?;
        with_tx!(self, |db_tx| {
            self.require_meal(&db_tx, meal.id).await?;
            self.check_parent(&db_tx, meal).await?;
            if meal.is_snack()
                && meals::Entity::find()
                    .filter(meals::Column::ParentId.eq(meal.id))
                    .one(&db_tx)
                    .await?
                    .is_some()
            {
                return Err(EngineError::InvalidMeal(format!(
                    "'{}' has snacks and must stay a main meal",
                    meal.name
                )));
            }

            let model: meals::ActiveModel = meal.into();
            model.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Delete a meal with its snacks.
    ///
    /// Allocations and ingredient drafts of the removed meals are dropped.
    /// Returns the ids of every removed meal.
    pub async fn delete_meal(&self, id: Uuid) -> ResultEngine<Vec<Uuid>> {
        with_tx!(self, |db_tx| {
            self.require_meal(&db_tx, id).await?;
            let mut removed: Vec<Uuid> = meals::Entity::find()
                .filter(meals::Column::ParentId.eq(id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();
            removed.push(id);

            meals::Entity::delete_many()
                .filter(meals::Column::Id.is_in(removed.clone()))
                .exec(&db_tx)
                .await?;
            self.prune_meals(&db_tx, &removed).await?;

            info!(meal_id = %id, removed = removed.len(), "meal deleted");
            Ok(removed)
        })
    }

    /// Delete every meal together with the allocation and the drafts.
    pub async fn clear_meals(&self) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            meals::Entity::delete_many().exec(&db_tx).await?;
            self.delete_preference(&db_tx, ALLOCATION_KEY).await?;
            self.delete_preferences_with_prefix(&db_tx, DRAFT_PREFIX)
                .await?;
            self.set_flag(&db_tx, DISTRIBUTION_SET_KEY, false).await?;
            Ok(())
        })
    }

    async fn require_meal(&self, db_tx: &DatabaseTransaction, id: Uuid) -> ResultEngine<Meal> {
        let model = meals::Entity::find_by_id(id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("meal {id}")))?;
        Meal::try_from(model)
    }

    async fn check_parent(&self, db_tx: &DatabaseTransaction, meal: &Meal) -> ResultEngine<()> {
        let Some(parent_id) = meal.parent_id else {
            return Ok(());
        };
        if parent_id == meal.id {
            return Err(EngineError::InvalidMeal(format!(
                "meal '{}' cannot be its own parent",
                meal.name
            )));
        }
        let parent = self.require_meal(db_tx, parent_id).await?;
        if parent.kind != MealKind::Main {
            return Err(EngineError::InvalidMeal(format!(
                "snack parent '{}' is not a main meal",
                parent.name
            )));
        }
        Ok(())
    }
}
