//! # Reservation API Handlers
//!
//! Taking reservations and moving them through their lifecycle. Holding a
//! table for a reservation lives with the other assignment endpoints.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ListResponse, ReservationInfo};
use crate::error::ApiError;
use crate::models::ReservationStatus;
use crate::repositories::{NewReservation, ReservationRepository, ReservationUpdate};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReservationRequest {
    pub restaurant_id: Uuid,
    #[schema(example = "Okafor")]
    pub customer_name: String,
    #[schema(example = "+1-555-0100")]
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    /// RFC 3339
    #[schema(value_type = String, example = "2025-03-01T19:30:00Z")]
    pub reservation_time: DateTime<FixedOffset>,
    #[schema(example = 4)]
    pub party_size: i32,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateReservationRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    /// RFC 3339
    #[schema(value_type = Option<String>, example = "2025-03-01T20:00:00Z")]
    pub reservation_time: Option<DateTime<FixedOffset>>,
    /// Cannot exceed the capacity of a table already held for the reservation
    pub party_size: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListReservationsQuery {
    /// Only reservations in this status
    pub status: Option<ReservationStatus>,
    /// Earliest reservation time, inclusive (RFC 3339)
    #[param(value_type = Option<String>)]
    pub from: Option<DateTime<FixedOffset>>,
    /// Latest reservation time, exclusive (RFC 3339)
    #[param(value_type = Option<String>)]
    pub to: Option<DateTime<FixedOffset>>,
    /// Maximum number of reservations to return (default 100, max 500)
    pub limit: Option<u64>,
    /// Number of reservations to skip
    pub offset: Option<u64>,
}

/// Take a reservation; it starts out PENDING
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationInfo>), ApiError> {
    let Json(req) = payload?;

    let created = ReservationRepository::new(state.db.clone())
        .create(NewReservation {
            restaurant_id: req.restaurant_id,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            customer_email: req.customer_email,
            special_requests: req.special_requests,
            reservation_time: req.reservation_time,
            party_size: req.party_size,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List the reservations of a restaurant in time order
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/reservations",
    params(("id" = Uuid, Path, description = "Restaurant ID"), ListReservationsQuery),
    responses(
        (status = 200, description = "Reservations", body = ListResponse<ReservationInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListReservationsQuery>, QueryRejection>,
) -> Result<Json<ListResponse<ReservationInfo>>, ApiError> {
    let Path(restaurant_id) = path?;
    let Query(query) = query?;

    let reservations = ReservationRepository::new(state.db.clone())
        .list(
            restaurant_id,
            query.status,
            query.from,
            query.to,
            query.limit,
            query.offset,
        )
        .await?;
    Ok(Json(ListResponse::from_models(reservations)))
}

/// Fetch one reservation
#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation", body = ReservationInfo),
        (status = 404, description = "Reservation not found", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationInfo>, ApiError> {
    let Path(reservation_id) = path?;
    let found = ReservationRepository::new(state.db.clone())
        .get(reservation_id)
        .await?;
    Ok(Json(found.into()))
}

/// Confirm a pending reservation; its party is created here
#[utoipa::path(
    post,
    path = "/api/v1/reservations/{id}/confirm",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation confirmed", body = ReservationInfo),
        (status = 404, description = "Reservation not found", body = ApiError),
        (status = 409, description = "Reservation is not pending", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn confirm_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationInfo>, ApiError> {
    let Path(reservation_id) = path?;
    let confirmed = state.engine.confirm_reservation(reservation_id).await?;
    Ok(Json(confirmed.into()))
}

/// Cancel a pending or confirmed reservation, releasing any held table
#[utoipa::path(
    post,
    path = "/api/v1/reservations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationInfo),
        (status = 404, description = "Reservation not found", body = ApiError),
        (status = 409, description = "Reservation already ended", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationInfo>, ApiError> {
    let Path(reservation_id) = path?;
    let cancelled = state.engine.cancel_reservation(reservation_id).await?;
    Ok(Json(cancelled.into()))
}

/// Record that a confirmed party never arrived
#[utoipa::path(
    post,
    path = "/api/v1/reservations/{id}/no-show",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation marked as no-show", body = ReservationInfo),
        (status = 404, description = "Reservation not found", body = ApiError),
        (status = 409, description = "Reservation is not confirmed", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn mark_no_show(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReservationInfo>, ApiError> {
    let Path(reservation_id) = path?;
    let ended = state.engine.mark_no_show(reservation_id).await?;
    Ok(Json(ended.into()))
}

/// Update a reservation's booking details
#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    request_body = UpdateReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = ReservationInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Reservation not found", body = ApiError),
        (status = 422, description = "Party would exceed the held table", body = ApiError)
    ),
    tag = "reservations"
)]
pub async fn update_reservation(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateReservationRequest>, JsonRejection>,
) -> Result<Json<ReservationInfo>, ApiError> {
    let Path(reservation_id) = path?;
    let Json(req) = payload?;

    let updated = ReservationRepository::new(state.db.clone())
        .update(
            reservation_id,
            ReservationUpdate {
                customer_name: req.customer_name,
                customer_phone: req.customer_phone,
                customer_email: req.customer_email,
                special_requests: req.special_requests,
                reservation_time: req.reservation_time,
                party_size: req.party_size,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
