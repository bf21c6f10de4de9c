//! # Common API Types
//!
//! Response bodies shared by the handlers, the `Idempotency-Key` header, and
//! conversions from entity models. Timestamps leave the API as RFC 3339 UTC.

use axum::http::{HeaderMap, HeaderName};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::models::{
    AssignmentStatus, PartyStatus, ReservationStatus, TableStatus, WaitingListStatus,
    dining_table, party, reservation, reservation_assignment, restaurant, section, server,
    table_assignment, waiting_list_entry,
};

/// Header carrying a caller-chosen key that makes assignment creation safe to retry.
pub const IDEMPOTENCY_KEY_HEADER: HeaderName = HeaderName::from_static("idempotency-key");

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Read the optional `Idempotency-Key` header.
pub fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(&IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|key| !key.is_empty() && key.len() <= MAX_IDEMPOTENCY_KEY_LEN)
        .filter(|key| key.chars().all(|c| c.is_ascii_graphic()))
        .ok_or_else(|| {
            validation_error(
                "Idempotency-Key must be 1-255 printable ASCII characters",
                serde_json::json!({ "header": "Idempotency-Key" }),
            )
        })?;

    Ok(Some(key.to_string()))
}

pub(crate) fn rfc3339(value: DateTimeWithTimeZone) -> String {
    value.with_timezone(&Utc).to_rfc3339()
}

/// Generic list response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Items in the listing
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn from_models<M>(models: Vec<M>) -> Self
    where
        T: From<M>,
    {
        Self {
            data: models.into_iter().map(T::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestaurantInfo {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    /// Local opening time, `HH:MM:SS`
    pub opening_time: String,
    /// Local closing time, `HH:MM:SS`
    pub closing_time: String,
    pub max_capacity: i32,
    pub created_at: String,
}

impl From<restaurant::Model> for RestaurantInfo {
    fn from(model: restaurant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            phone: model.phone,
            opening_time: model.opening_time.format("%H:%M:%S").to_string(),
            closing_time: model.closing_time.format("%H:%M:%S").to_string(),
            max_capacity: model.max_capacity,
            created_at: rfc3339(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SectionInfo {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub is_active: bool,
}

impl From<section::Model> for SectionInfo {
    fn from(model: section::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            name: model.name,
            description: model.description,
            capacity: model.capacity,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableInfo {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    #[schema(example = "12")]
    pub table_number: String,
    #[schema(example = 4)]
    pub capacity: i32,
    pub location: String,
    /// False once the table has been retired
    pub is_active: bool,
    pub status: TableStatus,
    pub updated_at: String,
}

impl From<dining_table::Model> for TableInfo {
    fn from(model: dining_table::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            table_number: model.table_number,
            capacity: model.capacity,
            location: model.location,
            is_active: model.is_active,
            status: model.status,
            updated_at: rfc3339(model.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartyInfo {
    pub id: Uuid,
    pub name: String,
    pub size: i32,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: PartyStatus,
    pub arrival_time: String,
}

impl From<party::Model> for PartyInfo {
    fn from(model: party::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            size: model.size,
            phone: model.phone,
            email: model.email,
            status: model.status,
            arrival_time: rfc3339(model.arrival_time),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationInfo {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    /// Set once the reservation is confirmed
    pub party_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    pub reservation_time: String,
    pub party_size: i32,
    pub status: ReservationStatus,
}

impl From<reservation::Model> for ReservationInfo {
    fn from(model: reservation::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            party_id: model.party_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            customer_email: model.customer_email,
            special_requests: model.special_requests,
            reservation_time: rfc3339(model.reservation_time),
            party_size: model.party_size,
            status: model.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WaitingListEntryInfo {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub party_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub party_size: i32,
    pub request_time: String,
    /// Estimated wait in minutes; null when no table could seat the party
    pub estimated_wait_time: Option<i32>,
    pub status: WaitingListStatus,
    pub notes: Option<String>,
}

impl From<waiting_list_entry::Model> for WaitingListEntryInfo {
    fn from(model: waiting_list_entry::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            party_id: model.party_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            party_size: model.party_size,
            request_time: rfc3339(model.request_time),
            estimated_wait_time: model.estimated_wait_time,
            status: model.status,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServerInfo {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    pub is_active: bool,
    pub shift_start: Option<String>,
    pub shift_end: Option<String>,
}

impl From<server::Model> for ServerInfo {
    fn from(model: server::Model) -> Self {
        Self {
            id: model.id,
            restaurant_id: model.restaurant_id,
            first_name: model.first_name,
            last_name: model.last_name,
            employee_id: model.employee_id,
            is_active: model.is_active,
            shift_start: model.shift_start.map(rfc3339),
            shift_end: model.shift_end.map(rfc3339),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableAssignmentInfo {
    pub id: Uuid,
    pub table_id: Uuid,
    pub party_id: Uuid,
    pub server_id: Uuid,
    pub status: AssignmentStatus,
    pub assigned_at: String,
    /// Set when the assignment completed; cancelled assignments leave it null
    pub completed_at: Option<String>,
    pub idempotency_key: Option<String>,
    pub notes: Option<String>,
}

impl From<table_assignment::Model> for TableAssignmentInfo {
    fn from(model: table_assignment::Model) -> Self {
        Self {
            id: model.id,
            table_id: model.table_id,
            party_id: model.party_id,
            server_id: model.server_id,
            status: model.status,
            assigned_at: rfc3339(model.assigned_at),
            completed_at: model.completed_at.map(rfc3339),
            idempotency_key: model.idempotency_key,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationAssignmentInfo {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub table_id: Uuid,
    pub server_id: Uuid,
    pub status: AssignmentStatus,
    pub assigned_at: String,
    pub completed_at: Option<String>,
    pub idempotency_key: Option<String>,
    pub notes: Option<String>,
}

impl From<reservation_assignment::Model> for ReservationAssignmentInfo {
    fn from(model: reservation_assignment::Model) -> Self {
        Self {
            id: model.id,
            reservation_id: model.reservation_id,
            table_id: model.table_id,
            server_id: model.server_id,
            status: model.status,
            assigned_at: rfc3339(model.assigned_at),
            completed_at: model.completed_at.map(rfc3339),
            idempotency_key: model.idempotency_key,
            notes: model.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_idempotency_key_is_none() {
        assert_eq!(idempotency_key(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn idempotency_key_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static(" retry-42 "));
        assert_eq!(
            idempotency_key(&headers).unwrap().as_deref(),
            Some("retry-42")
        );
    }

    #[test]
    fn oversized_idempotency_key_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            IDEMPOTENCY_KEY_HEADER,
            HeaderValue::from_str(&"k".repeat(300)).unwrap(),
        );
        let err = idempotency_key(&headers).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn timestamps_render_in_utc() {
        let local = chrono::DateTime::parse_from_rfc3339("2025-03-01T19:30:00+02:00").unwrap();
        assert_eq!(rfc3339(local), "2025-03-01T17:30:00+00:00");
    }
}
