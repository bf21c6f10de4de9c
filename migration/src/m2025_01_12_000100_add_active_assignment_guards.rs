//! Adds partial unique indexes so that a table, party or reservation can be held
//! by at most one ACTIVE assignment at a time.
//!
//! The engine checks these conditions inside its transactions as well; the
//! indexes turn a lost race into a constraint violation instead of a double booking.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

const GUARDS: &[(&str, &str, &str)] = &[
    ("idx_table_assignments_active_table", "table_assignments", "table_id"),
    ("idx_table_assignments_active_party", "table_assignments", "party_id"),
    (
        "idx_reservation_assignments_active_reservation",
        "reservation_assignments",
        "reservation_id",
    ),
    (
        "idx_reservation_assignments_active_table",
        "reservation_assignments",
        "table_id",
    ),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        for (name, table, column) in GUARDS {
            manager
                .get_connection()
                .execute(Statement::from_string(
                    backend,
                    format!(
                        "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table} ({column}) \
                         WHERE status = 'ACTIVE'"
                    ),
                ))
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        for (name, _, _) in GUARDS {
            manager
                .get_connection()
                .execute(Statement::from_string(
                    backend,
                    format!("DROP INDEX IF EXISTS {name}"),
                ))
                .await?;
        }
        Ok(())
    }
}
