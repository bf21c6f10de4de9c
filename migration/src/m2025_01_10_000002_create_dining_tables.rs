//! Migration to create the dining_tables and table_sections tables.
//!
//! `table_sections` is the many-to-many link between tables and sections.

use sea_orm_migration::prelude::*;

use crate::m2025_01_10_000001_create_restaurants::{Restaurants, Sections};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DiningTables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiningTables::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DiningTables::RestaurantId).uuid().not_null())
                    .col(ColumnDef::new(DiningTables::TableNumber).text().not_null())
                    .col(ColumnDef::new(DiningTables::Capacity).integer().not_null())
                    .col(ColumnDef::new(DiningTables::Location).text().not_null())
                    .col(
                        ColumnDef::new(DiningTables::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DiningTables::Status)
                            .text()
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(DiningTables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DiningTables::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dining_tables_restaurant_id")
                            .from(DiningTables::Table, DiningTables::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Table numbers are unique within a restaurant
        manager
            .create_index(
                Index::create()
                    .name("idx_dining_tables_restaurant_number")
                    .table(DiningTables::Table)
                    .col(DiningTables::RestaurantId)
                    .col(DiningTables::TableNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TableSections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TableSections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TableSections::TableId).uuid().not_null())
                    .col(ColumnDef::new(TableSections::SectionId).uuid().not_null())
                    .col(
                        ColumnDef::new(TableSections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_sections_table_id")
                            .from(TableSections::Table, TableSections::TableId)
                            .to(DiningTables::Table, DiningTables::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_table_sections_section_id")
                            .from(TableSections::Table, TableSections::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_table_sections_pair")
                    .table(TableSections::Table)
                    .col(TableSections::TableId)
                    .col(TableSections::SectionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TableSections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiningTables::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum DiningTables {
    Table,
    Id,
    RestaurantId,
    TableNumber,
    Capacity,
    Location,
    IsActive,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TableSections {
    Table,
    Id,
    TableId,
    SectionId,
    CreatedAt,
}
