//! Migration to create the parties table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Parties::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Parties::Name).text().not_null())
                    .col(ColumnDef::new(Parties::Size).integer().not_null())
                    .col(ColumnDef::new(Parties::Phone).text().null())
                    .col(ColumnDef::new(Parties::Email).text().null())
                    .col(
                        ColumnDef::new(Parties::Status)
                            .text()
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(
                        ColumnDef::new(Parties::ArrivalTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Parties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parties_status")
                    .table(Parties::Table)
                    .col(Parties::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Parties {
    Table,
    Id,
    Name,
    Size,
    Phone,
    Email,
    Status,
    ArrivalTime,
    CreatedAt,
    UpdatedAt,
}
