//! # Tests for Handlers
//!
//! Handler-level tests calling the functions directly against an in-memory
//! database. Router-level behaviour is covered in `tests/api_tests.rs`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::Json,
};
use chrono::NaiveTime;

use crate::config::AppConfig;
use crate::handlers::types::IDEMPOTENCY_KEY_HEADER;
use crate::handlers::{assignments, healthz, restaurants, root, tables};
use crate::models::TableStatus;
use crate::server::AppState;

async fn test_state() -> AppState {
    let config = AppConfig::default();
    let db = crate::db::init_pool(&config).await.unwrap();
    crate::db::run_migrations(&db).await.unwrap();
    AppState::new(db, Arc::new(config))
}

async fn seed_table(state: &AppState, capacity: i32) -> (uuid::Uuid, uuid::Uuid) {
    let (_, Json(restaurant)) = restaurants::create_restaurant(
        State(state.clone()),
        Ok(Json(restaurants::CreateRestaurantRequest {
            name: "Harbor".to_string(),
            address: String::new(),
            phone: String::new(),
            opening_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            max_capacity: 80,
        })),
    )
    .await
    .unwrap();

    let (_, Json(table)) = tables::create_table(
        State(state.clone()),
        Ok(Path(restaurant.id)),
        Ok(Json(tables::CreateTableRequest {
            table_number: "1".to_string(),
            capacity,
            location: "window".to_string(),
            section_ids: vec![],
        })),
    )
    .await
    .unwrap();

    (restaurant.id, table.id)
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "seating");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_reports_database_ok() {
    let state = test_state().await;
    let Json(health) = healthz(State(state)).await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.database, "ok");
}

#[tokio::test]
async fn test_create_table_rejects_zero_capacity() {
    let state = test_state().await;
    let (restaurant_id, _) = seed_table(&state, 4).await;

    let err = tables::create_table(
        State(state),
        Ok(Path(restaurant_id)),
        Ok(Json(tables::CreateTableRequest {
            table_number: "2".to_string(),
            capacity: 0,
            location: String::new(),
            section_ids: vec![],
        })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(&*err.code, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_maintenance_cannot_request_occupied() {
    let state = test_state().await;
    let (_, table_id) = seed_table(&state, 4).await;

    let err = tables::set_table_maintenance(
        State(state),
        Ok(Path(table_id)),
        Ok(Json(tables::MaintenanceRequest {
            status: TableStatus::Occupied,
        })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assign_table_with_unknown_ids_is_not_found() {
    let state = test_state().await;
    let (_, table_id) = seed_table(&state, 4).await;

    let mut headers = HeaderMap::new();
    headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("k-1"));

    let err = assignments::assign_table(
        State(state),
        headers,
        Ok(Json(assignments::AssignTableRequest {
            table_id,
            party_id: uuid::Uuid::new_v4(),
            server_id: uuid::Uuid::new_v4(),
            notes: None,
        })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(&*err.code, "NOT_FOUND");
}
