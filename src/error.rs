//! # Error Handling
//!
//! Two layers of errors live here. [`SeatingError`] is what the engine and the
//! repositories return; [`ApiError`] is the problem+json body the HTTP layer
//! sends, carrying the request's trace ID.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::telemetry;

/// Errors raised by seating operations and the entity store.
///
/// Every failure leaves the entities it touched in their pre-call state.
#[derive(Debug, Error)]
pub enum SeatingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity} cannot transition from {from} to {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("party of {party_size} exceeds table capacity of {capacity}")]
    CapacityExceeded { party_size: i32, capacity: i32 },

    #[error("table {table_id} is not available (status {status})")]
    TableNotAvailable { table_id: Uuid, status: String },

    #[error("party {party_id} is not waiting (status {status})")]
    PartyNotWaiting { party_id: Uuid, status: String },

    #[error("reservation {reservation_id} is not confirmed (status {status})")]
    ReservationNotConfirmed { reservation_id: Uuid, status: String },

    #[error("reservation {reservation_id} already holds table assignment {assignment_id}")]
    ReservationAlreadyAssigned {
        reservation_id: Uuid,
        assignment_id: Uuid,
    },

    #[error("server {server_id} is inactive")]
    ServerInactive { server_id: Uuid },

    #[error("assignment {assignment_id} is not active (status {status})")]
    AssignmentNotActive { assignment_id: Uuid, status: String },

    #[error("{entity} {id} was modified concurrently")]
    ConcurrentConflict { entity: &'static str, id: Uuid },

    #[error("idempotency key '{key}' was already used with different arguments")]
    IdempotencyMismatch { key: String },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SeatingError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        SeatingError::NotFound { entity, id }
    }

    pub fn validation<M: Into<String>>(field: &'static str, message: M) -> Self {
        SeatingError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable SCREAMING_SNAKE_CASE code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            SeatingError::NotFound { .. } => "NOT_FOUND",
            SeatingError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            SeatingError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            SeatingError::TableNotAvailable { .. } => "TABLE_NOT_AVAILABLE",
            SeatingError::PartyNotWaiting { .. } => "PARTY_NOT_WAITING",
            SeatingError::ReservationNotConfirmed { .. } => "RESERVATION_NOT_CONFIRMED",
            SeatingError::ReservationAlreadyAssigned { .. } => "RESERVATION_ALREADY_ASSIGNED",
            SeatingError::ServerInactive { .. } => "SERVER_INACTIVE",
            SeatingError::AssignmentNotActive { .. } => "ASSIGNMENT_NOT_ACTIVE",
            SeatingError::ConcurrentConflict { .. } => "CONCURRENT_CONFLICT",
            SeatingError::IdempotencyMismatch { .. } => "IDEMPOTENCY_MISMATCH",
            SeatingError::Validation { .. } => "VALIDATION_FAILED",
            SeatingError::Database(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Map an insert/update failure, turning unique-index violations into a
    /// conflict on the given entity.
    pub(crate) fn from_write(entity: &'static str, id: Uuid, error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, entity, %id, "Unique constraint violation on write");
            SeatingError::ConcurrentConflict { entity, id }
        } else {
            SeatingError::Database(error).on_contention(entity, id)
        }
    }

    /// Reclassify a database failure caused by another transaction holding
    /// the rows (busy, deadlock, serialization, lock timeout) as a conflict
    /// on `entity`. Anything else passes through unchanged.
    pub(crate) fn on_contention(self, entity: &'static str, id: Uuid) -> Self {
        match self {
            SeatingError::Database(ref error) if is_lock_contention(error) => {
                tracing::debug!(?error, entity, %id, "Lock contention on write");
                SeatingError::ConcurrentConflict { entity, id }
            }
            other => other,
        }
    }
}

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay in seconds (optional)
    pub retry_after: Option<u64>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            retry_after: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Trace ID of the current request, or a short correlation ID outside one.
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    db_error
        .code()
        .is_some_and(|code| code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_ref()))
}

/// SQLite busy/locked and Postgres deadlock, serialization and lock-timeout
/// codes.
pub(crate) fn is_lock_contention(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_CONTENTION_CODES: &[&str] = &["40001", "40P01", "55P03"];
    const SQLITE_CONTENTION_CODES: &[&str] = &["5", "6", "261", "262", "517", "773"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Conn(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    runtime_err
        .as_database_error()
        .and_then(|db_error| db_error.code())
        .is_some_and(|code| {
            PG_CONTENTION_CODES.contains(&code.as_ref())
                || SQLITE_CONTENTION_CODES.contains(&code.as_ref())
        })
}

/// Errors raised by the HTTP layer itself rather than the engine
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Not Found")]
    NotFound,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    /// Get the appropriate HTTP status code for this error type
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        Self::new(
            error_type.status_code(),
            error_type.error_code(),
            &error_type.to_string(),
        )
    }
}

impl From<SeatingError> for ApiError {
    fn from(error: SeatingError) -> Self {
        let code = error.code();
        match error {
            SeatingError::Database(db_err) => db_err.into(),
            SeatingError::NotFound { entity, id } => {
                Self::new(StatusCode::NOT_FOUND, code, &error.to_string())
                    .with_details(json!({ "entity": entity, "id": id }))
            }
            SeatingError::Validation { field, .. } => {
                Self::new(StatusCode::BAD_REQUEST, code, &error.to_string())
                    .with_details(json!({ "field": field }))
            }
            SeatingError::CapacityExceeded {
                party_size,
                capacity,
            } => Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, &error.to_string())
                .with_details(json!({ "party_size": party_size, "capacity": capacity })),
            SeatingError::IdempotencyMismatch { .. } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, &error.to_string())
            }
            SeatingError::ConcurrentConflict { entity, id } => {
                tracing::warn!(entity, %id, "Concurrent update rejected");
                Self::new(StatusCode::CONFLICT, code, &error.to_string())
                    .with_details(json!({ "entity": entity, "id": id }))
                    .with_retry_after(1)
            }
            SeatingError::InvalidStateTransition {
                entity,
                ref from,
                ref to,
            } => {
                let details = json!({ "entity": entity, "from": from, "to": to });
                Self::new(StatusCode::CONFLICT, code, &error.to_string()).with_details(details)
            }
            SeatingError::TableNotAvailable { .. }
            | SeatingError::PartyNotWaiting { .. }
            | SeatingError::ReservationNotConfirmed { .. }
            | SeatingError::ReservationAlreadyAssigned { .. }
            | SeatingError::ServerInactive { .. }
            | SeatingError::AssignmentNotActive { .. } => {
                Self::new(StatusCode::CONFLICT, code, &error.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", &message)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            &format!("Invalid query string: {}", rejection.body_text()),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            &format!("Invalid path parameter: {}", rejection.body_text()),
        )
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                &format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
        assert_eq!(error.retry_after, None);
    }

    #[test]
    fn test_on_contention_passes_other_errors_through() {
        let id = Uuid::new_v4();
        let error = SeatingError::Database(sea_orm::DbErr::Custom("disk full".into()))
            .on_contention("table", id);
        assert!(matches!(error, SeatingError::Database(_)));

        let error = SeatingError::PartyNotWaiting {
            party_id: id,
            status: "SEATED".into(),
        }
        .on_contention("table", id);
        assert_eq!(error.code(), "PARTY_NOT_WAITING");
    }

    #[test]
    fn test_capacity_exceeded_maps_to_422() {
        let error: ApiError = SeatingError::CapacityExceeded {
            party_size: 5,
            capacity: 4,
        }
        .into();

        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.code, Box::from("CAPACITY_EXCEEDED"));
        assert_eq!(
            error.details,
            Some(Box::new(json!({"party_size": 5, "capacity": 4})))
        );
    }

    #[test]
    fn test_status_conflicts_map_to_409() {
        let id = Uuid::new_v4();
        let cases = [
            SeatingError::TableNotAvailable {
                table_id: id,
                status: "OCCUPIED".into(),
            },
            SeatingError::PartyNotWaiting {
                party_id: id,
                status: "SEATED".into(),
            },
            SeatingError::ServerInactive { server_id: id },
            SeatingError::AssignmentNotActive {
                assignment_id: id,
                status: "COMPLETED".into(),
            },
            SeatingError::InvalidStateTransition {
                entity: "party",
                from: "WAITING".into(),
                to: "FINISHED".into(),
            },
        ];

        for case in cases {
            let code = case.code();
            let error: ApiError = case.into();
            assert_eq!(error.status, StatusCode::CONFLICT, "{code}");
            assert_eq!(error.code.as_ref(), code);
            assert_eq!(error.retry_after, None);
        }
    }

    #[test]
    fn test_concurrent_conflict_sets_retry_after_header() {
        let error: ApiError = SeatingError::ConcurrentConflict {
            entity: "table",
            id: Uuid::new_v4(),
        }
        .into();

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(response.headers().get("retry-after").unwrap(), "1");
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_not_found_and_validation_mapping() {
        let id = Uuid::new_v4();
        let not_found: ApiError = SeatingError::not_found("table", id).into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert!(not_found.message.contains(&id.to_string()));

        let invalid: ApiError = SeatingError::validation("party_size", "must be at least 1").into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(invalid.details, Some(Box::new(json!({"field": "party_size"}))));
    }

    #[test]
    fn test_database_errors_map_to_5xx() {
        let error: ApiError = SeatingError::Database(sea_orm::DbErr::Custom("boom".into())).into();
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, Box::from("Database error occurred"));

        let record: ApiError = sea_orm::DbErr::RecordNotFound("table".to_string()).into();
        assert_eq!(record.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_trace_id_generation() {
        let error: ApiError = ErrorType::ServiceUnavailable.into();

        assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({ "capacity": "must be at least 1" });

        let error = validation_error("Validation failed", field_errors.clone());

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.details, Some(Box::new(field_errors)));
    }
}
