//! # Table API Handlers

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ListResponse, SectionInfo, TableInfo};
use crate::engine::TableRetirement;
use crate::error::ApiError;
use crate::models::TableStatus;
use crate::repositories::{NewTable, TableFilter, TableRepository, TableUpdate};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTableRequest {
    #[schema(example = "12")]
    pub table_number: String,
    #[schema(example = 4)]
    pub capacity: i32,
    #[serde(default)]
    #[schema(example = "window")]
    pub location: String,
    /// Sections to tag the table with
    #[serde(default)]
    pub section_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct ListTablesQuery {
    /// Only tables in this status
    pub status: Option<TableStatus>,
    /// Only tables tagged with this section
    pub section_id: Option<Uuid>,
    /// Include retired tables (default false)
    #[serde(default)]
    pub include_inactive: bool,
}

/// Descriptive table fields; status is changed through maintenance and
/// assignments only
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateTableRequest {
    #[schema(example = "12")]
    pub table_number: Option<String>,
    #[schema(example = 6)]
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MaintenanceRequest {
    /// AVAILABLE, CLEANING or OUT_OF_ORDER
    pub status: TableStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableRetirementResponse {
    /// `deactivated` when the table has assignment history, `deleted` otherwise
    #[schema(example = "deactivated")]
    pub outcome: String,
    pub table_id: Uuid,
    /// The deactivated table; absent when it was deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableInfo>,
}

impl From<TableRetirement> for TableRetirementResponse {
    fn from(retirement: TableRetirement) -> Self {
        match retirement {
            TableRetirement::Deactivated(table) => Self {
                outcome: "deactivated".to_string(),
                table_id: table.id,
                table: Some(table.into()),
            },
            TableRetirement::Deleted(table_id) => Self {
                outcome: "deleted".to_string(),
                table_id,
                table: None,
            },
        }
    }
}

/// Create a table in a restaurant
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/tables",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created as AVAILABLE", body = TableInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant or section not found", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn create_table(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateTableRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TableInfo>), ApiError> {
    let Path(restaurant_id) = path?;
    let Json(req) = payload?;

    let created = TableRepository::new(state.db.clone())
        .create(
            restaurant_id,
            NewTable {
                table_number: req.table_number,
                capacity: req.capacity,
                location: req.location,
                section_ids: req.section_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List the tables of a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/tables",
    params(("id" = Uuid, Path, description = "Restaurant ID"), ListTablesQuery),
    responses(
        (status = 200, description = "Tables", body = ListResponse<TableInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn list_tables(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListTablesQuery>, QueryRejection>,
) -> Result<Json<ListResponse<TableInfo>>, ApiError> {
    let Path(restaurant_id) = path?;
    let Query(query) = query?;

    let tables = TableRepository::new(state.db.clone())
        .list(
            restaurant_id,
            TableFilter {
                status: query.status,
                section_id: query.section_id,
                include_inactive: query.include_inactive,
            },
        )
        .await?;
    Ok(Json(ListResponse::from_models(tables)))
}

/// Fetch one table
#[utoipa::path(
    get,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Table", body = TableInfo),
        (status = 404, description = "Table not found", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn get_table(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TableInfo>, ApiError> {
    let Path(table_id) = path?;
    let table = TableRepository::new(state.db.clone()).get(table_id).await?;
    Ok(Json(table.into()))
}

/// Tag a table with a section (idempotent)
#[utoipa::path(
    put,
    path = "/api/v1/tables/{id}/sections/{section_id}",
    params(
        ("id" = Uuid, Path, description = "Table ID"),
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    responses(
        (status = 200, description = "Sections of the table after linking", body = ListResponse<SectionInfo>),
        (status = 400, description = "Section belongs to another restaurant", body = ApiError),
        (status = 404, description = "Table or section not found", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn link_table_section(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<ListResponse<SectionInfo>>, ApiError> {
    let Path((table_id, section_id)) = path?;

    let repo = TableRepository::new(state.db.clone());
    repo.link_section(table_id, section_id).await?;
    let sections = repo.sections_of(table_id).await?;
    Ok(Json(ListResponse::from_models(sections)))
}

/// Move a table in or out of maintenance
#[utoipa::path(
    put,
    path = "/api/v1/tables/{id}/maintenance",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = MaintenanceRequest,
    responses(
        (status = 200, description = "Table after the change", body = TableInfo),
        (status = 400, description = "Requested status is assignment-controlled", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError),
        (status = 409, description = "Table is occupied or reserved", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn set_table_maintenance(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<MaintenanceRequest>, JsonRejection>,
) -> Result<Json<TableInfo>, ApiError> {
    let Path(table_id) = path?;
    let Json(req) = payload?;

    let table = state
        .engine
        .set_table_maintenance(table_id, req.status)
        .await?;
    Ok(Json(table.into()))
}

/// Retire a table
#[utoipa::path(
    delete,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Table deactivated or deleted", body = TableRetirementResponse),
        (status = 404, description = "Table not found", body = ApiError),
        (status = 409, description = "Table has an active assignment", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn retire_table(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TableRetirementResponse>, ApiError> {
    let Path(table_id) = path?;
    let outcome = state.engine.retire_table(table_id).await?;
    Ok(Json(outcome.into()))
}

/// Update a table's number, capacity or location
#[utoipa::path(
    patch,
    path = "/api/v1/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    request_body = UpdateTableRequest,
    responses(
        (status = 200, description = "Table updated", body = TableInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Table not found", body = ApiError)
    ),
    tag = "tables"
)]
pub async fn update_table(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTableRequest>, JsonRejection>,
) -> Result<Json<TableInfo>, ApiError> {
    let Path(table_id) = path?;
    let Json(req) = payload?;

    let updated = TableRepository::new(state.db.clone())
        .update(
            table_id,
            TableUpdate {
                table_number: req.table_number,
                capacity: req.capacity,
                location: req.location,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
