pub use sea_orm_migration::prelude::*;

mod m20260301_000001_meals;
mod m20260301_000002_foods;
mod m20260301_000003_food_journal;
mod m20260301_000004_preferences;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_meals::Migration),
            Box::new(m20260301_000002_foods::Migration),
            Box::new(m20260301_000003_food_journal::Migration),
            Box::new(m20260301_000004_preferences::Migration),
        ]
    }
}
