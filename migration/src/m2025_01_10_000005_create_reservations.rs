//! Migration to create the reservations table.
//!
//! A reservation may reference its party before arrival; the link is filled in
//! when the reservation is confirmed.

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
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::RestaurantId).uuid().not_null())
                    .col(ColumnDef::new(Reservations::PartyId).uuid().null())
                    .col(ColumnDef::new(Reservations::CustomerName).text().not_null())
                    .col(ColumnDef::new(Reservations::CustomerPhone).text().not_null())
                    .col(ColumnDef::new(Reservations::CustomerEmail).text().null())
                    .col(ColumnDef::new(Reservations::SpecialRequests).text().null())
                    .col(
                        ColumnDef::new(Reservations::ReservationTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::PartySize).integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .text()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Reservations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_restaurant_id")
                            .from(Reservations::Table, Reservations::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_party_id")
                            .from(Reservations::Table, Reservations::PartyId)
                            .to(Parties::Table, Parties::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_restaurant_time")
                    .table(Reservations::Table)
                    .col(Reservations::RestaurantId)
                    .col(Reservations::ReservationTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Reservations {
    Table,
    Id,
    RestaurantId,
    PartyId,
    CustomerName,
    CustomerPhone,
    CustomerEmail,
    SpecialRequests,
    ReservationTime,
    PartySize,
    Status,
    CreatedAt,
    UpdatedAt,
}
