use chrono::NaiveDate;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{JournalEntry, ResultEngine, journal};

use super::{Engine, with_tx};

impl Engine {
    /// Save a journal entry, replacing the one already recorded for the same
    /// meal on the same day. The stored entry is returned.
    pub async fn save_journal(&self, entry: &JournalEntry) -> ResultEngine<JournalEntry> {
        with_tx!(self, |db_tx| {
            let existing = journal::Entity::find()
                .filter(journal::Column::MealId.eq(entry.meal_id))
                .filter(journal::Column::RecordedOn.eq(entry.recorded_on()))
                .one(&db_tx)
                .await?;

            let mut stored = entry.clone();
            match existing {
                Some(model) => {
                    stored.id = model.id;
                    let mut active = journal::ActiveModel::try_from(&stored)?;
                    active.id = ActiveValue::Unchanged(model.id);
                    active.update(&db_tx).await?;
                    info!(meal_id = %stored.meal_id, day = %stored.recorded_on(), "journal entry replaced");
                }
                None => {
                    journal::ActiveModel::try_from(&stored)?
                        .insert(&db_tx)
                        .await?;
                    info!(meal_id = %stored.meal_id, day = %stored.recorded_on(), "journal entry added");
                }
            }
            Ok(stored)
        })
    }

    /// Return the entry recorded for `meal_id` on `day`, if any.
    pub async fn journal_entry(
        &self,
        meal_id: Uuid,
        day: NaiveDate,
    ) -> ResultEngine<Option<JournalEntry>> {
        with_tx!(self, |db_tx| self.journal_entry_on(&db_tx, meal_id, day).await)
    }

    /// Return every journal entry, newest first.
    pub async fn journal_entries(&self) -> ResultEngine<Vec<JournalEntry>> {
        with_tx!(self, |db_tx| {
            journal::Entity::find()
                .order_by_desc(journal::Column::RecordedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(JournalEntry::try_from)
                .collect::<ResultEngine<Vec<JournalEntry>>>()
        })
    }

    pub(super) async fn journal_entry_on(
        &self,
        db_tx: &DatabaseTransaction,
        meal_id: Uuid,
        day: NaiveDate,
    ) -> ResultEngine<Option<JournalEntry>> {
        journal::Entity::find()
            .filter(journal::Column::MealId.eq(meal_id))
            .filter(journal::Column::RecordedOn.eq(day))
            .one(db_tx)
            .await?
            .map(JournalEntry::try_from)
            .transpose()
    }
}
