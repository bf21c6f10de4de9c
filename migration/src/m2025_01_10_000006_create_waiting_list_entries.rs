//! Migration to create the waiting_list_entries table.

use sea_orm_migration::prelude::*;

use crate::m2025_01_10_000001_create_restaurants::Restaurants;
use crate::m2025_01_10_000003_create_parties::Parties;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WaitingListEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaitingListEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::RestaurantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WaitingListEntries::PartyId).uuid().null())
                    .col(
                        ColumnDef::new(WaitingListEntries::CustomerName)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::CustomerPhone)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::PartySize)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::RequestTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::EstimatedWaitTime)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::Status)
                            .text()
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(ColumnDef::new(WaitingListEntries::Notes).text().null())
                    .col(
                        ColumnDef::new(WaitingListEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WaitingListEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waiting_list_entries_restaurant_id")
                            .from(WaitingListEntries::Table, WaitingListEntries::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_waiting_list_entries_party_id")
                            .from(WaitingListEntries::Table, WaitingListEntries::PartyId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // FIFO scans filter by restaurant + status and order by request time
        manager
            .create_index(
                Index::create()
                    .name("idx_waiting_list_entries_queue")
                    .table(WaitingListEntries::Table)
                    .col(WaitingListEntries::RestaurantId)
                    .col(WaitingListEntries::Status)
                    .col(WaitingListEntries::RequestTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WaitingListEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WaitingListEntries {
    Table,
    Id,
    RestaurantId,
    PartyId,
    CustomerName,
    CustomerPhone,
    PartySize,
    RequestTime,
    EstimatedWaitTime,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
