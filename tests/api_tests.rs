//! Router-level tests: routing, extractor rejections, error mapping and the
//! trace header, driven through `tower::ServiceExt::oneshot`.

mod test_utils;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use seating::server::create_app;
use test_utils::{create_test_party, seed_floor, setup_app_state};

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn patch_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn healthz_reports_ok_and_echoes_trace_id() {
    let state = setup_app_state().await.unwrap();
    let app = create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-trace-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-abc-123"
    );
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let state = setup_app_state().await.unwrap();
    let app = create_app(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/parties")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"Silva\", \"size\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn malformed_path_id_is_a_validation_error() {
    let state = setup_app_state().await.unwrap();
    let app = create_app(state);

    let (status, body) = send(&app, get("/api/v1/tables/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn seating_flow_maps_errors_to_status_codes() {
    let state = setup_app_state().await.unwrap();
    let db = state.db.clone();
    let app = create_app(state);
    let floor = seed_floor(&db, 2).await.unwrap();
    let big = create_test_party(&db, 6).await.unwrap();
    let small = create_test_party(&db, 2).await.unwrap();
    let other = create_test_party(&db, 2).await.unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/table-assignments",
            json!({ "table_id": floor.table.id, "party_id": big.id, "server_id": floor.server.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");
    assert_eq!(body["details"]["capacity"], 2);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/table-assignments",
            json!({ "table_id": floor.table.id, "party_id": small.id, "server_id": floor.server.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "ACTIVE");
    let assignment_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/table-assignments",
            json!({ "table_id": floor.table.id, "party_id": other.id, "server_id": floor.server.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TABLE_NOT_AVAILABLE");

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/v1/restaurants/{}/occupancy",
            floor.restaurant.id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["occupied_count"], 1);
    assert_eq!(body["total_count"], 1);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/v1/table-assignments/{assignment_id}/complete"),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/v1/table-assignments/{assignment_id}/complete"),
            Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ASSIGNMENT_NOT_ACTIVE");
}

#[tokio::test]
async fn idempotency_header_replays_and_rejects_reuse() {
    let state = setup_app_state().await.unwrap();
    let db = state.db.clone();
    let app = create_app(state);
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 2).await.unwrap();
    let other = create_test_party(&db, 2).await.unwrap();

    let keyed = |party_id: uuid::Uuid| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/table-assignments")
            .header(header::CONTENT_TYPE, "application/json")
            .header("Idempotency-Key", "retry-me")
            .body(Body::from(
                json!({ "table_id": floor.table.id, "party_id": party_id, "server_id": floor.server.id })
                    .to_string(),
            ))
            .unwrap()
    };

    let (status, first) = send(&app, keyed(party.id)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, again) = send(&app, keyed(party.id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["id"], again["id"]);

    let (status, body) = send(&app, keyed(other.id)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "IDEMPOTENCY_MISMATCH");
}

#[tokio::test]
async fn empty_waiting_list_has_no_next_entry() {
    let state = setup_app_state().await.unwrap();
    let db = state.db.clone();
    let app = create_app(state);
    let floor = seed_floor(&db, 4).await.unwrap();

    let uri = format!("/api/v1/restaurants/{}/waiting-list/next", floor.restaurant.id);
    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/v1/restaurants/{}/waiting-list", floor.restaurant.id),
            json!({ "customer_name": "Silva", "customer_phone": "+1-555-0123", "party_size": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "WAITING");
    assert_eq!(body["estimated_wait_time"], 0);

    let (status, next) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["id"], body["id"]);
}

#[tokio::test]
async fn availability_quotes_a_wait_only_when_nothing_fits() {
    let state = setup_app_state().await.unwrap();
    let db = state.db.clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let app = create_app(state);
    let uri = format!(
        "/api/v1/restaurants/{}/availability?party_size=2",
        floor.restaurant.id
    );

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["estimated_wait_time"], Value::Null);

    let party = create_test_party(&db, 2).await.unwrap();
    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/table-assignments",
            json!({
                "table_id": floor.table.id,
                "party_id": party.id,
                "server_id": floor.server.id
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["estimated_wait_time"], 60);
}

#[tokio::test]
async fn sections_and_tables_are_patchable() {
    let state = setup_app_state().await.unwrap();
    let db = state.db.clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let app = create_app(state);

    let (status, section) = send(
        &app,
        post_json(
            &format!("/api/v1/restaurants/{}/sections", floor.restaurant.id),
            json!({ "name": "Patio", "capacity": 16 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let section_id = section["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        patch_json(
            &format!("/api/v1/sections/{section_id}"),
            json!({ "capacity": 20 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 20);

    let (status, body) = send(&app, get(&format!("/api/v1/sections/{section_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Patio");

    let (status, body) = send(
        &app,
        patch_json(
            &format!("/api/v1/tables/{}", floor.table.id),
            json!({ "capacity": 6, "status": "OUT_OF_ORDER" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 6);
    assert_eq!(body["status"], "AVAILABLE");

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/v1/restaurants/{}/tables?section_id={section_id}",
            floor.restaurant.id
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}
