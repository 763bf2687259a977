use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Foods::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Foods::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Foods::Name).string().not_null())
                    .col(ColumnDef::new(Foods::Category).string().not_null())
                    .col(ColumnDef::new(Foods::DefaultState).string().not_null())
                    .col(
                        ColumnDef::new(Foods::DefaultWeightType)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Foods::DefaultUnit).string().not_null())
                    .col(
                        ColumnDef::new(Foods::Measurements)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-foods-category")
                    .table(Foods::Table)
                    .col(Foods::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Foods::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Foods {
    Table,
    Id,
    Name,
    Category,
    DefaultState,
    DefaultWeightType,
    DefaultUnit,
    Measurements,
}
