use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{ResultEngine, preferences};

use super::Engine;

impl Engine {
    pub(super) async fn preference(
        &self,
        db_tx: &DatabaseTransaction,
        key: &str,
    ) -> ResultEngine<Option<String>> {
        let model = preferences::Entity::find_by_id((self.scope.clone(), key.to_string()))
            .one(db_tx)
            .await?;
        Ok(model.map(|model| model.value))
    }

    /// Preferences whose key starts with `prefix`, as `(key, value)`.
    pub(super) async fn preferences_with_prefix(
        &self,
        db_tx: &DatabaseTransaction,
        prefix: &str,
    ) -> ResultEngine<Vec<(String, String)>> {
        let models = preferences::Entity::find()
            .filter(preferences::Column::Scope.eq(self.scope.clone()))
            .filter(preferences::Column::Key.starts_with(prefix))
            .all(db_tx)
            .await?;
        Ok(models
            .into_iter()
            .map(|model| (model.key, model.value))
            .collect())
    }

    pub(super) async fn set_preference(
        &self,
        db_tx: &DatabaseTransaction,
        key: &str,
        value: String,
    ) -> ResultEngine<()> {
        let active = preferences::active(&self.scope, key, value);
        if self.preference(db_tx, key).await?.is_some() {
            active.update(db_tx).await?;
        } else {
            active.insert(db_tx).await?;
        }
        Ok(())
    }

    pub(super) async fn delete_preference(
        &self,
        db_tx: &DatabaseTransaction,
        key: &str,
    ) -> ResultEngine<()> {
        preferences::Entity::delete_by_id((self.scope.clone(), key.to_string()))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn delete_preferences_with_prefix(
        &self,
        db_tx: &DatabaseTransaction,
        prefix: &str,
    ) -> ResultEngine<()> {
        preferences::Entity::delete_many()
            .filter(preferences::Column::Scope.eq(self.scope.clone()))
            .filter(preferences::Column::Key.starts_with(prefix))
            .exec(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn flag(&self, db_tx: &DatabaseTransaction, key: &str) -> ResultEngine<bool> {
        Ok(self.preference(db_tx, key).await?.as_deref() == Some("true"))
    }

    pub(super) async fn set_flag(
        &self,
        db_tx: &DatabaseTransaction,
        key: &str,
        value: bool,
    ) -> ResultEngine<()> {
        self.set_preference(db_tx, key, value.to_string()).await
    }
}
