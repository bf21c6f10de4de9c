//! # Party API Handlers

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

use super::types::{ListResponse, PartyInfo};
use crate::error::ApiError;
use crate::models::PartyStatus;
use crate::repositories::{NewParty, PartyRepository, PartyUpdate};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePartyRequest {
    #[schema(example = "Nguyen")]
    pub name: String,
    #[schema(example = 4)]
    pub size: i32,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Defaults to now (RFC 3339)
    #[schema(value_type = Option<String>)]
    pub arrival_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdatePartyRequest {
    pub name: Option<String>,
    /// A seated party cannot outgrow its table
    pub size: Option<i32>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListPartiesQuery {
    /// Only parties in this status
    pub status: Option<PartyStatus>,
    /// Maximum number of parties to return (default 100, max 500)
    pub limit: Option<u64>,
    /// Number of parties to skip
    pub offset: Option<u64>,
}

/// Register a party; it starts out WAITING
#[utoipa::path(
    post,
    path = "/api/v1/parties",
    request_body = CreatePartyRequest,
    responses(
        (status = 201, description = "Party registered", body = PartyInfo),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "parties"
)]
pub async fn create_party(
    State(state): State<AppState>,
    payload: Result<Json<CreatePartyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PartyInfo>), ApiError> {
    let Json(req) = payload?;

    let created = PartyRepository::new(state.db.clone())
        .create(NewParty {
            name: req.name,
            size: req.size,
            phone: req.phone,
            email: req.email,
            arrival_time: req.arrival_time,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List parties by arrival
#[utoipa::path(
    get,
    path = "/api/v1/parties",
    params(ListPartiesQuery),
    responses(
        (status = 200, description = "Parties", body = ListResponse<PartyInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "parties"
)]
pub async fn list_parties(
    State(state): State<AppState>,
    query: Result<Query<ListPartiesQuery>, QueryRejection>,
) -> Result<Json<ListResponse<PartyInfo>>, ApiError> {
    let Query(query) = query?;
    let parties = PartyRepository::new(state.db.clone())
        .list(query.status, query.limit, query.offset)
        .await?;
    Ok(Json(ListResponse::from_models(parties)))
}

/// Fetch one party
#[utoipa::path(
    get,
    path = "/api/v1/parties/{id}",
    params(("id" = Uuid, Path, description = "Party ID")),
    responses(
        (status = 200, description = "Party", body = PartyInfo),
        (status = 404, description = "Party not found", body = ApiError)
    ),
    tag = "parties"
)]
pub async fn get_party(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PartyInfo>, ApiError> {
    let Path(party_id) = path?;
    let found = PartyRepository::new(state.db.clone()).get(party_id).await?;
    Ok(Json(found.into()))
}

/// Cancel a waiting party
#[utoipa::path(
    post,
    path = "/api/v1/parties/{id}/cancel",
    params(("id" = Uuid, Path, description = "Party ID")),
    responses(
        (status = 200, description = "Party cancelled", body = PartyInfo),
        (status = 404, description = "Party not found", body = ApiError),
        (status = 409, description = "Party is not waiting", body = ApiError)
    ),
    tag = "parties"
)]
pub async fn cancel_party(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PartyInfo>, ApiError> {
    let Path(party_id) = path?;
    let cancelled = state.engine.cancel_party(party_id).await?;
    Ok(Json(cancelled.into()))
}

/// Update a party's name, size or contact details
#[utoipa::path(
    patch,
    path = "/api/v1/parties/{id}",
    params(("id" = Uuid, Path, description = "Party ID")),
    request_body = UpdatePartyRequest,
    responses(
        (status = 200, description = "Party updated", body = PartyInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Party not found", body = ApiError),
        (status = 422, description = "Seated party would exceed its table", body = ApiError)
    ),
    tag = "parties"
)]
pub async fn update_party(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePartyRequest>, JsonRejection>,
) -> Result<Json<PartyInfo>, ApiError> {
    let Path(party_id) = path?;
    let Json(req) = payload?;

    let updated = PartyRepository::new(state.db.clone())
        .update(
            party_id,
            PartyUpdate {
                name: req.name,
                size: req.size,
                phone: req.phone,
                email: req.email,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
