use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Preferences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Preferences::Scope).string().not_null())
                    .col(ColumnDef::new(Preferences::Key).string().not_null())
                    .col(ColumnDef::new(Preferences::Value).text().not_null())
                    .primary_key(
                        Index::create()
                            .col(Preferences::Scope)
                            .col(Preferences::Key),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Preferences::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Preferences {
    Table,
    Scope,
    Key,
    Value,
}
