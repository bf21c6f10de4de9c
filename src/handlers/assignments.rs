//! # Assignment API Handlers
//!
//! The seating engine's assignment operations, one endpoint each. Creation
//! endpoints honour the `Idempotency-Key` header: a retry with the same key
//! and body returns the original assignment.

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

use super::types::{
    ListResponse, ReservationAssignmentInfo, TableAssignmentInfo, idempotency_key,
};
use crate::engine::{AssignReservation, AssignTable};
use crate::error::ApiError;
use crate::models::AssignmentStatus;
use crate::repositories::{AssignmentFilter, AssignmentRepository};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignTableRequest {
    /// Table to seat the party at; must be AVAILABLE
    pub table_id: Uuid,
    /// Party to seat; must be WAITING
    pub party_id: Uuid,
    /// Active server taking the table
    pub server_id: Uuid,
    /// Free-form note kept on the assignment
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AssignReservationRequest {
    /// CONFIRMED reservation to hold a table for
    pub reservation_id: Uuid,
    /// Table to hold; must be AVAILABLE
    pub table_id: Uuid,
    /// Active server taking the table
    pub server_id: Uuid,
    /// Free-form note kept on the hold
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SeatReservationRequest {
    /// Overrides the server named on the hold
    pub server_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListAssignmentsQuery {
    /// Filter by table
    pub table_id: Option<Uuid>,
    /// Filter by server
    pub server_id: Option<Uuid>,
    /// Filter by party
    pub party_id: Option<Uuid>,
    /// Filter by assignment status (ACTIVE, COMPLETED, CANCELLED)
    pub status: Option<AssignmentStatus>,
    /// Maximum number of assignments to return (default 100, max 500)
    pub limit: Option<u64>,
    /// Number of assignments to skip
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListReservationAssignmentsQuery {
    /// Filter by reservation
    pub reservation_id: Option<Uuid>,
    /// Filter by table
    pub table_id: Option<Uuid>,
    /// Filter by server
    pub server_id: Option<Uuid>,
    /// Filter by assignment status (ACTIVE, COMPLETED, CANCELLED)
    pub status: Option<AssignmentStatus>,
    /// Maximum number of assignments to return (default 100, max 500)
    pub limit: Option<u64>,
    /// Number of assignments to skip
    pub offset: Option<u64>,
}

/// Seat a waiting party at a table
#[utoipa::path(
    post,
    path = "/api/v1/table-assignments",
    params(("Idempotency-Key" = Option<String>, Header, description = "Makes the request safe to retry")),
    request_body = AssignTableRequest,
    responses(
        (status = 201, description = "Party seated", body = TableAssignmentInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Table, party or server not found", body = ApiError),
        (status = 409, description = "Table not available, party not waiting, server inactive, or concurrent change", body = ApiError),
        (status = 422, description = "Party exceeds table capacity or idempotency key reused", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn assign_table(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AssignTableRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TableAssignmentInfo>), ApiError> {
    let Json(req) = payload?;

    let mut request = AssignTable::new(req.table_id, req.party_id, req.server_id);
    if let Some(key) = idempotency_key(&headers)? {
        request = request.with_idempotency_key(key);
    }
    if let Some(notes) = req.notes {
        request = request.with_notes(notes);
    }

    let assignment = state.engine.assign_table(request).await?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// List table assignments, newest first
#[utoipa::path(
    get,
    path = "/api/v1/table-assignments",
    params(ListAssignmentsQuery),
    responses(
        (status = 200, description = "Table assignments", body = ListResponse<TableAssignmentInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn list_table_assignments(
    State(state): State<AppState>,
    query: Result<Query<ListAssignmentsQuery>, QueryRejection>,
) -> Result<Json<ListResponse<TableAssignmentInfo>>, ApiError> {
    let Query(query) = query?;

    let assignments = AssignmentRepository::new(state.db.clone())
        .list_table_assignments(AssignmentFilter {
            table_id: query.table_id,
            server_id: query.server_id,
            party_id: query.party_id,
            reservation_id: None,
            status: query.status,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;
    Ok(Json(ListResponse::from_models(assignments)))
}

/// Fetch one table assignment
#[utoipa::path(
    get,
    path = "/api/v1/table-assignments/{id}",
    params(("id" = Uuid, Path, description = "Table assignment ID")),
    responses(
        (status = 200, description = "Table assignment", body = TableAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn get_table_assignment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TableAssignmentInfo>, ApiError> {
    let Path(assignment_id) = path?;
    let found = AssignmentRepository::new(state.db.clone())
        .get_table_assignment(assignment_id)
        .await?;
    Ok(Json(found.into()))
}

/// The party has left; free the table
#[utoipa::path(
    post,
    path = "/api/v1/table-assignments/{id}/complete",
    params(("id" = Uuid, Path, description = "Table assignment ID")),
    responses(
        (status = 200, description = "Assignment completed", body = TableAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Assignment is not active", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn complete_assignment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TableAssignmentInfo>, ApiError> {
    let Path(assignment_id) = path?;
    let completed = state.engine.complete_assignment(assignment_id).await?;
    Ok(Json(completed.into()))
}

/// Undo a seating; the party goes back to waiting
#[utoipa::path(
    post,
    path = "/api/v1/table-assignments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Table assignment ID")),
    responses(
        (status = 200, description = "Assignment cancelled", body = TableAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Assignment is not active", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn cancel_assignment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TableAssignmentInfo>, ApiError> {
    let Path(assignment_id) = path?;
    let cancelled = state.engine.cancel_assignment(assignment_id).await?;
    Ok(Json(cancelled.into()))
}

/// Hold a table for a confirmed reservation
#[utoipa::path(
    post,
    path = "/api/v1/reservation-assignments",
    params(("Idempotency-Key" = Option<String>, Header, description = "Makes the request safe to retry")),
    request_body = AssignReservationRequest,
    responses(
        (status = 201, description = "Table held", body = ReservationAssignmentInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Reservation, table or server not found", body = ApiError),
        (status = 409, description = "Table not available, reservation not confirmed or already holding a table, server inactive", body = ApiError),
        (status = 422, description = "Party exceeds table capacity or idempotency key reused", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn assign_reservation(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AssignReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationAssignmentInfo>), ApiError> {
    let Json(req) = payload?;

    let mut request = AssignReservation::new(req.reservation_id, req.table_id, req.server_id);
    if let Some(key) = idempotency_key(&headers)? {
        request = request.with_idempotency_key(key);
    }
    if let Some(notes) = req.notes {
        request = request.with_notes(notes);
    }

    let assignment = state.engine.assign_reservation(request).await?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// List reservation assignments, newest first
#[utoipa::path(
    get,
    path = "/api/v1/reservation-assignments",
    params(ListReservationAssignmentsQuery),
    responses(
        (status = 200, description = "Reservation assignments", body = ListResponse<ReservationAssignmentInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn list_reservation_assignments(
    State(state): State<AppState>,
    query: Result<Query<ListReservationAssignmentsQuery>, QueryRejection>,
) -> Result<Json<ListResponse<ReservationAssignmentInfo>>, ApiError> {
    let Query(query) = query?;

    let assignments = AssignmentRepository::new(state.db.clone())
        .list_reservation_assignments(AssignmentFilter {
            table_id: query.table_id,
            server_id: query.server_id,
            party_id: None,
            reservation_id: query.reservation_id,
            status: query.status,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;
    Ok(Json(ListResponse::from_models(assignments)))
}

/// Fetch one reservation assignment
#[utoipa::path(
    get,
    path = "/api/v1/reservation-assignments/{id}",
    params(("id" = Uuid, Path, description = "Reservation assignment ID")),
    responses(
        (status = 200, description = "Reservation assignment", body = ReservationAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn get_reservation_assignment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationAssignmentInfo>, ApiError> {
    let Path(assignment_id) = path?;
    let found = AssignmentRepository::new(state.db.clone())
        .get_reservation_assignment(assignment_id)
        .await?;
    Ok(Json(found.into()))
}

/// The reserved party arrived; seat it at the held table
#[utoipa::path(
    post,
    path = "/api/v1/reservation-assignments/{id}/seat",
    params(("id" = Uuid, Path, description = "Reservation assignment ID")),
    request_body(content = SeatReservationRequest, description = "Optional server override"),
    responses(
        (status = 201, description = "Party seated", body = TableAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Hold not active or reservation not confirmed", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn seat_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Option<Json<SeatReservationRequest>>,
) -> Result<(StatusCode, Json<TableAssignmentInfo>), ApiError> {
    let Path(assignment_id) = path?;
    let server_id = payload.and_then(|Json(req)| req.server_id);

    let seated = state
        .engine
        .seat_reservation(assignment_id, server_id)
        .await?;
    Ok((StatusCode::CREATED, Json(seated.into())))
}

/// Release a held table; the reservation stays confirmed
#[utoipa::path(
    post,
    path = "/api/v1/reservation-assignments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation assignment ID")),
    responses(
        (status = 200, description = "Hold cancelled", body = ReservationAssignmentInfo),
        (status = 404, description = "Assignment not found", body = ApiError),
        (status = 409, description = "Hold is not active", body = ApiError)
    ),
    tag = "assignments"
)]
pub async fn cancel_reservation_assignment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationAssignmentInfo>, ApiError> {
    let Path(assignment_id) = path?;
    let cancelled = state
        .engine
        .cancel_reservation_assignment(assignment_id)
        .await?;
    Ok(Json(cancelled.into()))
}
