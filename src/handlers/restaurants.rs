//! # Restaurant API Handlers
//!
//! Restaurants, their sections, and the read-only availability and occupancy
//! projections.

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ListResponse, RestaurantInfo, SectionInfo, TableInfo};
use crate::engine::Occupancy;
use crate::error::ApiError;
use crate::repositories::{
    NewRestaurant, NewSection, RestaurantRepository, RestaurantUpdate, SectionUpdate,
};
use crate::server::AppState;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateRestaurantRequest {
    #[schema(example = "Chez Panisse")]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[schema(value_type = String, example = "11:00:00")]
    pub opening_time: NaiveTime,
    #[schema(value_type = String, example = "23:00:00")]
    pub closing_time: NaiveTime,
    #[schema(example = 120)]
    pub max_capacity: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateSectionRequest {
    #[schema(example = "Patio")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 24)]
    pub capacity: i32,
}

/// Partial restaurant update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>, example = "11:00:00")]
    pub opening_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "23:00:00")]
    pub closing_time: Option<NaiveTime>,
    pub max_capacity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateSectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    /// Inactive sections stay linked to their tables
    pub is_active: Option<bool>,
}

/// Pagination parameters for listings
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Maximum number of items to return (default 100, max 500)
    pub limit: Option<u64>,
    /// Number of items to skip
    pub offset: Option<u64>,
}

/// Query parameters for the availability check
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct AvailabilityQuery {
    /// Number of guests to seat
    pub party_size: i32,
    /// Time the party wants to sit (RFC 3339); defaults to now
    #[param(value_type = Option<String>)]
    pub at: Option<DateTime<FixedOffset>>,
}

/// Tables that fit a party, plus a wait estimate when none does
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    /// Available tables ordered by table number
    pub data: Vec<TableInfo>,
    /// Expected wait in minutes, only set when no table is free for the party
    #[schema(example = 15)]
    pub estimated_wait_time: Option<i32>,
}

/// Create a restaurant
#[utoipa::path(
    post,
    path = "/api/v1/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created", body = RestaurantInfo),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    payload: Result<Json<CreateRestaurantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RestaurantInfo>), ApiError> {
    let Json(req) = payload?;

    let created = RestaurantRepository::new(state.db.clone())
        .create(NewRestaurant {
            name: req.name,
            address: req.address,
            phone: req.phone,
            opening_time: req.opening_time,
            closing_time: req.closing_time,
            max_capacity: req.max_capacity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List restaurants
#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    params(PageQuery),
    responses(
        (status = 200, description = "Restaurants ordered by name", body = ListResponse<RestaurantInfo>),
        (status = 400, description = "Validation error", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ListResponse<RestaurantInfo>>, ApiError> {
    let Query(page) = query?;
    let restaurants = RestaurantRepository::new(state.db.clone())
        .list(page.limit, page.offset)
        .await?;
    Ok(Json(ListResponse::from_models(restaurants)))
}

/// Fetch one restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant", body = RestaurantInfo),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RestaurantInfo>, ApiError> {
    let Path(id) = path?;
    let found = RestaurantRepository::new(state.db.clone()).get(id).await?;
    Ok(Json(found.into()))
}

/// Create a section in a restaurant
#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/sections",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn create_section(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateSectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SectionInfo>), ApiError> {
    let Path(restaurant_id) = path?;
    let Json(req) = payload?;

    let created = RestaurantRepository::new(state.db.clone())
        .create_section(
            restaurant_id,
            NewSection {
                name: req.name,
                description: req.description,
                capacity: req.capacity,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List the sections of a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/sections",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Sections ordered by name", body = ListResponse<SectionInfo>),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn list_sections(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ListResponse<SectionInfo>>, ApiError> {
    let Path(restaurant_id) = path?;
    let sections = RestaurantRepository::new(state.db.clone())
        .list_sections(restaurant_id)
        .await?;
    Ok(Json(ListResponse::from_models(sections)))
}

/// Tables that can seat a party right now
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/availability",
    params(("id" = Uuid, Path, description = "Restaurant ID"), AvailabilityQuery),
    responses(
        (status = 200, description = "Available tables ordered by table number", body = AvailabilityResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn check_availability(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let Path(restaurant_id) = path?;
    let Query(query) = query?;

    let tables = state
        .engine
        .check_availability(restaurant_id, query.party_size, query.at)
        .await?;
    let estimated_wait_time = if tables.is_empty() {
        state
            .engine
            .estimate_wait_minutes(restaurant_id, query.party_size)
            .await?
    } else {
        None
    };

    Ok(Json(AvailabilityResponse {
        data: tables.into_iter().map(TableInfo::from).collect(),
        estimated_wait_time,
    }))
}

/// Current occupancy of a restaurant
#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/occupancy",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Occupancy snapshot", body = Occupancy, example = json!({
            "restaurant_id": "550e8400-e29b-41d4-a716-446655440000",
            "occupied_count": 3,
            "reserved_count": 1,
            "total_count": 12,
            "rate": 0.25
        })),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn compute_occupancy(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Occupancy>, ApiError> {
    let Path(restaurant_id) = path?;
    Ok(Json(state.engine.compute_occupancy(restaurant_id).await?))
}

/// Update a restaurant's details or hours
#[utoipa::path(
    patch,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant updated", body = RestaurantInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRestaurantRequest>, JsonRejection>,
) -> Result<Json<RestaurantInfo>, ApiError> {
    let Path(restaurant_id) = path?;
    let Json(req) = payload?;

    let updated = RestaurantRepository::new(state.db.clone())
        .update(
            restaurant_id,
            RestaurantUpdate {
                name: req.name,
                address: req.address,
                phone: req.phone,
                opening_time: req.opening_time,
                closing_time: req.closing_time,
                max_capacity: req.max_capacity,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// Fetch one section
#[utoipa::path(
    get,
    path = "/api/v1/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    responses(
        (status = 200, description = "Section", body = SectionInfo),
        (status = 404, description = "Section not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn get_section(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SectionInfo>, ApiError> {
    let Path(section_id) = path?;
    let section = RestaurantRepository::new(state.db.clone())
        .get_section(section_id)
        .await?;
    Ok(Json(section.into()))
}

/// Update a section
#[utoipa::path(
    patch,
    path = "/api/v1/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    request_body = UpdateSectionRequest,
    responses(
        (status = 200, description = "Section updated", body = SectionInfo),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Section not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn update_section(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateSectionRequest>, JsonRejection>,
) -> Result<Json<SectionInfo>, ApiError> {
    let Path(section_id) = path?;
    let Json(req) = payload?;

    let updated = RestaurantRepository::new(state.db.clone())
        .update_section(
            section_id,
            SectionUpdate {
                name: req.name,
                description: req.description,
                capacity: req.capacity,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}
