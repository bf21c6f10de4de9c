//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and seeds the
//! fixtures most seating scenarios start from.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveTime, Utc};
use sea_orm::DatabaseConnection;
use seating::config::{AppConfig, WaitingListConfig};
use seating::db::{init_pool, run_migrations};
use seating::engine::SeatingEngine;
use seating::models::{dining_table, party, reservation, restaurant, server};
use seating::repositories::{
    NewParty, NewReservation, NewRestaurant, NewServer, NewTable, PartyRepository,
    ReservationRepository, RestaurantRepository, ServerRepository, TableRepository,
};
use seating::server::AppState;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let config = AppConfig::default();
    let db = init_pool(&config).await?;
    run_migrations(&db).await?;
    Ok(db)
}

/// Engine over a SQLite file in `dir` behind a multi-connection pool, so
/// concurrent operations run on separate connections.
pub async fn setup_file_engine(dir: &std::path::Path) -> Result<SeatingEngine> {
    let config = AppConfig {
        database_url: format!("sqlite://{}?mode=rwc", dir.join("seating.db").display()),
        db_max_connections: 4,
        ..Default::default()
    };
    let db = init_pool(&config).await?;
    run_migrations(&db).await?;
    Ok(SeatingEngine::new(db, WaitingListConfig::default()))
}

/// Engine over a fresh database with default waiting list settings.
pub async fn setup_engine() -> Result<SeatingEngine> {
    let db = setup_test_db().await?;
    Ok(SeatingEngine::new(db, WaitingListConfig::default()))
}

/// Application state over a fresh database, for driving the router.
pub async fn setup_app_state() -> Result<AppState> {
    let db = setup_test_db().await?;
    Ok(AppState::new(db, Arc::new(AppConfig::default())))
}

pub async fn create_test_restaurant(db: &DatabaseConnection) -> Result<restaurant::Model> {
    let created = RestaurantRepository::new(db.clone())
        .create(NewRestaurant {
            name: "Test Bistro".to_string(),
            address: "1 Market Street".to_string(),
            phone: "+1-555-0100".to_string(),
            opening_time: NaiveTime::from_hms_opt(11, 0, 0).expect("valid time"),
            closing_time: NaiveTime::from_hms_opt(23, 0, 0).expect("valid time"),
            max_capacity: 80,
        })
        .await?;
    Ok(created)
}

pub async fn create_test_table(
    db: &DatabaseConnection,
    restaurant_id: uuid::Uuid,
    table_number: &str,
    capacity: i32,
) -> Result<dining_table::Model> {
    let created = TableRepository::new(db.clone())
        .create(
            restaurant_id,
            NewTable {
                table_number: table_number.to_string(),
                capacity,
                location: "Main floor".to_string(),
                section_ids: Vec::new(),
            },
        )
        .await?;
    Ok(created)
}

pub async fn create_test_party(db: &DatabaseConnection, size: i32) -> Result<party::Model> {
    let created = PartyRepository::new(db.clone())
        .create(NewParty {
            name: format!("Party of {size}"),
            size,
            phone: None,
            email: None,
            arrival_time: None,
        })
        .await?;
    Ok(created)
}

pub async fn create_test_server(
    db: &DatabaseConnection,
    restaurant_id: uuid::Uuid,
    employee_id: &str,
) -> Result<server::Model> {
    let created = ServerRepository::new(db.clone())
        .create(
            restaurant_id,
            NewServer {
                first_name: "Ana".to_string(),
                last_name: "Ruiz".to_string(),
                employee_id: employee_id.to_string(),
                shift_start: None,
                shift_end: None,
            },
        )
        .await?;
    Ok(created)
}

/// A PENDING reservation two hours from now.
pub async fn create_test_reservation(
    db: &DatabaseConnection,
    restaurant_id: uuid::Uuid,
    party_size: i32,
) -> Result<reservation::Model> {
    let created = ReservationRepository::new(db.clone())
        .create(NewReservation {
            restaurant_id,
            customer_name: "Okafor".to_string(),
            customer_phone: "+1-555-0199".to_string(),
            customer_email: Some("okafor@example.com".to_string()),
            special_requests: None,
            reservation_time: (Utc::now() + Duration::hours(2)).fixed_offset(),
            party_size,
        })
        .await?;
    Ok(created)
}

/// The usual starting floor: one restaurant, one server, one table.
pub struct Floor {
    pub restaurant: restaurant::Model,
    pub server: server::Model,
    pub table: dining_table::Model,
}

pub async fn seed_floor(db: &DatabaseConnection, table_capacity: i32) -> Result<Floor> {
    let restaurant = create_test_restaurant(db).await?;
    let server = create_test_server(db, restaurant.id, "E-1").await?;
    let table = create_test_table(db, restaurant.id, "1", table_capacity).await?;
    Ok(Floor {
        restaurant,
        server,
        table,
    })
}
