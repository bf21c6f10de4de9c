//! Wait staff.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use super::require_text;
use crate::error::{SeatingError, is_unique_violation};
use crate::models::{restaurant, server};

#[derive(Debug, Clone)]
pub struct NewServer {
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    pub shift_start: Option<DateTimeWithTimeZone>,
    pub shift_end: Option<DateTimeWithTimeZone>,
}

/// Partial update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct ServerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub shift_start: Option<DateTimeWithTimeZone>,
    pub shift_end: Option<DateTimeWithTimeZone>,
}

/// Repository for servers
#[derive(Debug, Clone)]
pub struct ServerRepository {
    db: DatabaseConnection,
}

impl ServerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add an active server to a restaurant's staff.
    pub async fn create(
        &self,
        restaurant_id: Uuid,
        input: NewServer,
    ) -> Result<server::Model, SeatingError> {
        let first_name = require_text("first_name", &input.first_name)?;
        let last_name = require_text("last_name", &input.last_name)?;
        let employee_id = require_text("employee_id", &input.employee_id)?;
        check_shift(input.shift_start, input.shift_end)?;

        restaurant::Entity::find_by_id(restaurant_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("restaurant", restaurant_id))?;

        let now = Utc::now().fixed_offset();
        let created = server::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            first_name: Set(first_name),
            last_name: Set(last_name),
            employee_id: Set(employee_id),
            is_active: Set(true),
            shift_start: Set(input.shift_start),
            shift_end: Set(input.shift_end),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SeatingError::validation("employee_id", "employee id already in use")
            } else {
                SeatingError::Database(e)
            }
        })?;

        tracing::info!(server_id = %created.id, restaurant_id = %restaurant_id, "Server added");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<server::Model, SeatingError> {
        server::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("server", id))
    }

    pub async fn list(
        &self,
        restaurant_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<server::Model>, SeatingError> {
        let mut query = server::Entity::find()
            .filter(server::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(server::Column::LastName)
            .order_by_asc(server::Column::FirstName);
        if active_only {
            query = query.filter(server::Column::IsActive.eq(true));
        }
        Ok(query.all(&self.db).await?)
    }

    /// Apply a partial update. Deactivating a server does not touch the
    /// assignments they already hold; it only blocks new ones.
    pub async fn update(
        &self,
        id: Uuid,
        changes: ServerUpdate,
    ) -> Result<server::Model, SeatingError> {
        let existing = self.get(id).await?;
        check_shift(
            changes.shift_start.or(existing.shift_start),
            changes.shift_end.or(existing.shift_end),
        )?;

        let mut active_model: server::ActiveModel = existing.into();
        if let Some(first_name) = changes.first_name {
            active_model.first_name = Set(require_text("first_name", &first_name)?);
        }
        if let Some(last_name) = changes.last_name {
            active_model.last_name = Set(require_text("last_name", &last_name)?);
        }
        if let Some(is_active) = changes.is_active {
            active_model.is_active = Set(is_active);
        }
        if let Some(shift_start) = changes.shift_start {
            active_model.shift_start = Set(Some(shift_start));
        }
        if let Some(shift_end) = changes.shift_end {
            active_model.shift_end = Set(Some(shift_end));
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(server_id = %updated.id, is_active = updated.is_active, "Server updated");
        Ok(updated)
    }
}

fn check_shift(
    start: Option<DateTimeWithTimeZone>,
    end: Option<DateTimeWithTimeZone>,
) -> Result<(), SeatingError> {
    if let (Some(start), Some(end)) = (start, end)
        && end <= start
    {
        return Err(SeatingError::validation(
            "shift_end",
            "shift must end after it starts",
        ));
    }
    Ok(())
}
