//! Database migrations for the seating service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_restaurants;
mod m2025_01_10_000002_create_dining_tables;
mod m2025_01_10_000003_create_parties;
mod m2025_01_10_000004_create_servers;
mod m2025_01_10_000005_create_reservations;
mod m2025_01_10_000006_create_waiting_list_entries;
mod m2025_01_10_000007_create_assignments;
mod m2025_01_12_000100_add_active_assignment_guards;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_restaurants::Migration),
            Box::new(m2025_01_10_000002_create_dining_tables::Migration),
            Box::new(m2025_01_10_000003_create_parties::Migration),
            Box::new(m2025_01_10_000004_create_servers::Migration),
            Box::new(m2025_01_10_000005_create_reservations::Migration),
            Box::new(m2025_01_10_000006_create_waiting_list_entries::Migration),
            Box::new(m2025_01_10_000007_create_assignments::Migration),
            Box::new(m2025_01_12_000100_add_active_assignment_guards::Migration),
        ]
    }
}
