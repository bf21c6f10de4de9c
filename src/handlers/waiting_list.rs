//! # Waiting List API Handlers

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ListResponse, TableAssignmentInfo, WaitingListEntryInfo, idempotency_key};
use crate::engine::{NewWaitingListEntry, PromoteWaitingListEntry};
use crate::error::{ApiError, ErrorType};
use crate::models::WaitingListStatus;
use crate::repositories::{WaitingListRepository, WaitingListUpdate};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct JoinWaitingListRequest {
    #[schema(example = "Silva")]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[schema(example = 3)]
    pub party_size: i32,
    pub notes: Option<String>,
    /// Quoted wait in minutes; estimated from current occupancy when absent
    pub estimated_wait_time: Option<i32>,
}

/// Edits to a WAITING entry; its place in the queue is kept
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateWaitingListEntryRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub party_size: Option<i32>,
    /// Re-quoted wait in minutes
    pub estimated_wait_time: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListWaitingListQuery {
    /// Only entries in this status
    pub status: Option<WaitingListStatus>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PromoteRequest {
    /// Table to seat the party at
    pub table_id: Uuid,
    /// Server taking the table
    pub server_id: Uuid,
}

/// Add a walk-in to the waiting list
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/waiting-list",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = JoinWaitingListRequest,
    responses(
        (status = 201, description = "Entry created as WAITING", body = WaitingListEntryInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn add_to_waiting_list(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<JoinWaitingListRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WaitingListEntryInfo>), ApiError> {
    let Path(restaurant_id) = path?;
    let Json(req) = payload?;

    let entry = state
        .engine
        .add_to_waiting_list(NewWaitingListEntry {
            restaurant_id,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            party_size: req.party_size,
            notes: req.notes,
            estimated_wait_time: req.estimated_wait_time,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// List the waiting list, oldest request first
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/waiting-list",
    params(("id" = Uuid, Path, description = "Restaurant ID"), ListWaitingListQuery),
    responses(
        (status = 200, description = "Entries in queue order", body = ListResponse<WaitingListEntryInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn list_waiting_list(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListWaitingListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<WaitingListEntryInfo>>, ApiError> {
    let Path(restaurant_id) = path?;
    let Query(query) = query?;

    let entries = WaitingListRepository::new(state.db.clone())
        .list(restaurant_id, query.status)
        .await?;
    Ok(Json(ListResponse::from_models(entries)))
}

/// Next entry to seat
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/waiting-list/next",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Oldest WAITING entry", body = WaitingListEntryInfo),
        (status = 404, description = "Restaurant not found or nobody waiting", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn next_waiting_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WaitingListEntryInfo>, ApiError> {
    let Path(restaurant_id) = path?;

    let entry = state
        .engine
        .next_waiting_entry(restaurant_id)
        .await?
        .ok_or_else(|| {
            ApiError::from(ErrorType::NotFound)
                .with_details(serde_json::json!({ "reason": "waiting list is empty" }))
        })?;
    Ok(Json(entry.into()))
}

/// Fetch one waiting list entry
#[utoipa::path(
    get,
    path = "/api/v1/waiting-list/{id}",
    params(("id" = Uuid, Path, description = "Waiting list entry ID")),
    responses(
        (status = 200, description = "Entry", body = WaitingListEntryInfo),
        (status = 404, description = "Entry not found", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn get_waiting_list_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WaitingListEntryInfo>, ApiError> {
    let Path(entry_id) = path?;
    let entry = WaitingListRepository::new(state.db.clone())
        .get(entry_id)
        .await?;
    Ok(Json(entry.into()))
}

/// Seat a waiting list entry at a table
#[utoipa::path(
    post,
    path = "/api/v1/waiting-list/{id}/promote",
    params(
        ("id" = Uuid, Path, description = "Waiting list entry ID"),
        ("Idempotency-Key" = Option<String>, Header, description = "Makes the request safe to retry")
    ),
    request_body = PromoteRequest,
    responses(
        (status = 201, description = "Party seated", body = TableAssignmentInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Entry, table or server not found", body = ApiError),
        (status = 409, description = "Entry, table or server not in a seatable state", body = ApiError),
        (status = 422, description = "Party exceeds table capacity or idempotency key reused", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn promote_waiting_list_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PromoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TableAssignmentInfo>), ApiError> {
    let Path(entry_id) = path?;
    let Json(req) = payload?;

    let mut request = PromoteWaitingListEntry::new(entry_id, req.table_id, req.server_id);
    if let Some(key) = idempotency_key(&headers)? {
        request = request.with_idempotency_key(key);
    }

    let assignment = state.engine.promote_waiting_list_entry(request).await?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// Take an entry off the list at the guest's request
#[utoipa::path(
    post,
    path = "/api/v1/waiting-list/{id}/cancel",
    params(("id" = Uuid, Path, description = "Waiting list entry ID")),
    responses(
        (status = 200, description = "Entry cancelled", body = WaitingListEntryInfo),
        (status = 404, description = "Entry not found", body = ApiError),
        (status = 409, description = "Entry is no longer waiting", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn cancel_waiting_list_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WaitingListEntryInfo>, ApiError> {
    let Path(entry_id) = path?;
    let entry = state.engine.cancel_waiting_list_entry(entry_id).await?;
    Ok(Json(entry.into()))
}

/// Drop an entry whose guests did not answer the call
#[utoipa::path(
    post,
    path = "/api/v1/waiting-list/{id}/expire",
    params(("id" = Uuid, Path, description = "Waiting list entry ID")),
    responses(
        (status = 200, description = "Entry expired", body = WaitingListEntryInfo),
        (status = 404, description = "Entry not found", body = ApiError),
        (status = 409, description = "Entry is no longer waiting", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn expire_waiting_list_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WaitingListEntryInfo>, ApiError> {
    let Path(entry_id) = path?;
    let entry = state.engine.expire_waiting_list_entry(entry_id).await?;
    Ok(Json(entry.into()))
}

/// Edit a waiting list entry
#[utoipa::path(
    patch,
    path = "/api/v1/waiting-list/{id}",
    params(("id" = Uuid, Path, description = "Waiting list entry ID")),
    request_body = UpdateWaitingListEntryRequest,
    responses(
        (status = 200, description = "Entry updated", body = WaitingListEntryInfo),
        (status = 400, description = "Validation error or entry no longer waiting", body = ApiError),
        (status = 404, description = "Entry not found", body = ApiError)
    ),
    tag = "waiting-list"
)]
pub async fn update_waiting_list_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateWaitingListEntryRequest>, JsonRejection>,
) -> Result<Json<WaitingListEntryInfo>, ApiError> {
    let Path(entry_id) = path?;
    let Json(req) = payload?;

    let updated = WaitingListRepository::new(state.db.clone())
        .update(
            entry_id,
            WaitingListUpdate {
                customer_name: req.customer_name,
                customer_phone: req.customer_phone,
                party_size: req.party_size,
                estimated_wait_time: req.estimated_wait_time,
                notes: req.notes,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
