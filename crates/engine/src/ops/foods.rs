use sea_orm::{PaginatorTrait, QueryOrder, TransactionTrait, prelude::*};
use tracing::{info, warn};

use crate::{FoodCatalog, ResultEngine, foods, foods::Food, preferences::FOODS_LOADED_KEY};

use super::{Engine, with_tx};

impl Engine {
    /// Load the catalog into an empty store. Returns how many foods were
    /// inserted: 0 when the store already has foods.
    pub async fn seed_foods(&self, catalog: &FoodCatalog) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            if foods::Entity::find().count(&db_tx).await? > 0 {
                return Ok(0);
            }
            let mut inserted = 0;
            for food in catalog.foods() {
                let model = foods::ActiveModel::try_from(food)?;
                model.insert(&db_tx).await?;
                inserted += 1;
            }
            self.set_flag(&db_tx, FOODS_LOADED_KEY, true).await?;
            info!(inserted, "food catalog seeded");
            Ok(inserted)
        })
    }

    /// Insert or replace catalog foods by id. Returns how many were written.
    pub async fn import_foods(&self, catalog: &FoodCatalog) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let mut written = 0;
            for food in catalog.foods() {
                let model = foods::ActiveModel::try_from(food)?;
                if foods::Entity::find_by_id(food.id)
                    .one(&db_tx)
                    .await?
                    .is_some()
                {
                    model.update(&db_tx).await?;
                } else {
                    model.insert(&db_tx).await?;
                }
                written += 1;
            }
            self.set_flag(&db_tx, FOODS_LOADED_KEY, true).await?;
            info!(written, "food catalog imported");
            Ok(written)
        })
    }

    /// Return the stored foods as a catalog snapshot. Rows that no longer
    /// map to a food are left out.
    pub async fn catalog(&self) -> ResultEngine<FoodCatalog> {
        with_tx!(self, |db_tx| {
            let mut foods = Vec::new();
            for model in foods::Entity::find()
                .order_by_asc(foods::Column::Id)
                .all(&db_tx)
                .await?
            {
                let id = model.id;
                match Food::try_from(model) {
                    Ok(food) => foods.push(food),
                    Err(err) => warn!(id, %err, "skipping unreadable food row"),
                }
            }
            Ok(FoodCatalog::new(foods))
        })
    }
}
