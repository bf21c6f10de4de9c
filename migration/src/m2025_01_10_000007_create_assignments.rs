//! Migration to create the table_assignments and reservation_assignments tables.

use sea_orm_migration::prelude::*;

use crate::m2025_01_10_000002_create_dining_tables::DiningTables;
use crate::m2025_01_10_000003_create_parties::Parties;
use crate::m2025_01_10_000004_create_servers::Servers;
use crate::m2025_01_10_000005_create_reservations::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TableAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TableAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TableAssignments::TableId).uuid().not_null())
                    .col(ColumnDef::new(TableAssignments::PartyId).uuid().not_null())
                    .col(ColumnDef::new(TableAssignments::ServerId).uuid().not_null())
                    .col(
                        ColumnDef::new(TableAssignments::Status)
                            .text()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(TableAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TableAssignments::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TableAssignments::IdempotencyKey)
                            .text()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TableAssignments::Notes).text().null())
                    .col(
                        ColumnDef::new(TableAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TableAssignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_assignments_table_id")
                            .from(TableAssignments::Table, TableAssignments::TableId)
                            .to(DiningTables::Table, DiningTables::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_assignments_party_id")
                            .from(TableAssignments::Table, TableAssignments::PartyId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_assignments_server_id")
                            .from(TableAssignments::Table, TableAssignments::ServerId)
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_table_assignments_table_status")
                    .table(TableAssignments::Table)
                    .col(TableAssignments::TableId)
                    .col(TableAssignments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReservationAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReservationAssignments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::ReservationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::TableId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::ServerId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::Status)
                            .text()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::IdempotencyKey)
                            .text()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ReservationAssignments::Notes).text().null())
                    .col(
                        ColumnDef::new(ReservationAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReservationAssignments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_assignments_reservation_id")
                            .from(
                                ReservationAssignments::Table,
                                ReservationAssignments::ReservationId,
                            )
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_assignments_table_id")
                            .from(ReservationAssignments::Table, ReservationAssignments::TableId)
                            .to(DiningTables::Table, DiningTables::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_assignments_server_id")
                            .from(
                                ReservationAssignments::Table,
                                ReservationAssignments::ServerId,
                            )
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservation_assignments_table_status")
                    .table(ReservationAssignments::Table)
                    .col(ReservationAssignments::TableId)
                    .col(ReservationAssignments::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReservationAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TableAssignments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TableAssignments {
    Table,
    Id,
    TableId,
    PartyId,
    ServerId,
    Status,
    AssignedAt,
    CompletedAt,
    IdempotencyKey,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ReservationAssignments {
    Table,
    Id,
    ReservationId,
    TableId,
    ServerId,
    Status,
    AssignedAt,
    CompletedAt,
    IdempotencyKey,
    Notes,
    CreatedAt,
    UpdatedAt,
}
