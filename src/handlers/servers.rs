//! # Server (Staff) API Handlers

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

use super::types::{ListResponse, ServerInfo};
use crate::error::ApiError;
use crate::repositories::{NewServer, ServerRepository, ServerUpdate};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateServerRequest {
    #[schema(example = "Ana")]
    pub first_name: String,
    #[schema(example = "Ruiz")]
    pub last_name: String,
    #[schema(example = "E-1042")]
    pub employee_id: String,
    #[schema(value_type = Option<String>)]
    pub shift_start: Option<DateTime<FixedOffset>>,
    #[schema(value_type = Option<String>)]
    pub shift_end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateServerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Inactive servers cannot take new assignments
    pub is_active: Option<bool>,
    #[schema(value_type = Option<String>)]
    pub shift_start: Option<DateTime<FixedOffset>>,
    #[schema(value_type = Option<String>)]
    pub shift_end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListServersQuery {
    /// Only active servers (default false)
    #[serde(default)]
    pub active_only: bool,
}

/// Add a server to a restaurant
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/servers",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = CreateServerRequest,
    responses(
        (status = 201, description = "Server added", body = ServerInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "servers"
)]
pub async fn create_server(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateServerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ServerInfo>), ApiError> {
    let Path(restaurant_id) = path?;
    let Json(req) = payload?;

    let created = ServerRepository::new(state.db.clone())
        .create(
            restaurant_id,
            NewServer {
                first_name: req.first_name,
                last_name: req.last_name,
                employee_id: req.employee_id,
                shift_start: req.shift_start,
                shift_end: req.shift_end,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List the servers of a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/servers",
    params(("id" = Uuid, Path, description = "Restaurant ID"), ListServersQuery),
    responses(
        (status = 200, description = "Servers", body = ListResponse<ServerInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "servers"
)]
pub async fn list_servers(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListServersQuery>, QueryRejection>,
) -> Result<Json<ListResponse<ServerInfo>>, ApiError> {
    let Path(restaurant_id) = path?;
    let Query(query) = query?;

    let servers = ServerRepository::new(state.db.clone())
        .list(restaurant_id, query.active_only)
        .await?;
    Ok(Json(ListResponse::from_models(servers)))
}

/// Update a server's details, shift or activity
#[utoipa::path(
    patch,
    path = "/api/v1/servers/{id}",
    params(("id" = Uuid, Path, description = "Server ID")),
    request_body = UpdateServerRequest,
    responses(
        (status = 200, description = "Server updated", body = ServerInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Server not found", body = ApiError)
    ),
    tag = "servers"
)]
pub async fn update_server(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateServerRequest>, JsonRejection>,
) -> Result<Json<ServerInfo>, ApiError> {
    let Path(server_id) = path?;
    let Json(req) = payload?;

    let updated = ServerRepository::new(state.db.clone())
        .update(
            server_id,
            ServerUpdate {
                first_name: req.first_name,
                last_name: req.last_name,
                is_active: req.is_active,
                shift_start: req.shift_start,
                shift_end: req.shift_end,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
