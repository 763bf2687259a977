use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FoodJournal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FoodJournal::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FoodJournal::MealId).blob().not_null())
                    .col(ColumnDef::new(FoodJournal::MealName).string().not_null())
                    .col(
                        ColumnDef::new(FoodJournal::RecordedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FoodJournal::RecordedOn).date().not_null())
                    .col(
                        ColumnDef::new(FoodJournal::Ingredients)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(FoodJournal::TotalCalories)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await?;

        // One entry per meal and calendar day.
        manager
            .create_index(
                Index::create()
                    .name("idx-food_journal-meal_id-recorded_on-unique")
                    .table(FoodJournal::Table)
                    .col(FoodJournal::MealId)
                    .col(FoodJournal::RecordedOn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-food_journal-recorded_at")
                    .table(FoodJournal::Table)
                    .col(FoodJournal::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FoodJournal::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum FoodJournal {
    Table,
    Id,
    MealId,
    MealName,
    RecordedAt,
    RecordedOn,
    Ingredients,
    TotalCalories,
}
