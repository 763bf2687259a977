use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Meals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Meals::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Meals::Name).string().not_null())
                    .col(
                        ColumnDef::new(Meals::Kind)
                            .string()
                            .not_null()
                            .default("MAIN"),
                    )
                    .col(ColumnDef::new(Meals::StartTime).time().not_null())
                    .col(ColumnDef::new(Meals::EndTime).time().not_null())
                    .col(ColumnDef::new(Meals::ParentId).blob())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-meals-parent_id")
                    .table(Meals::Table)
                    .col(Meals::ParentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Meals::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum Meals {
    Table,
    Id,
    Name,
    Kind,
    StartTime,
    EndTime,
    ParentId,
}
