use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use super::{page_limit, require_at_least_one, require_text};
use crate::error::SeatingError;
use crate::models::{
    AssignmentStatus, ReservationStatus, dining_table, reservation, reservation_assignment,
    restaurant,
};

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub restaurant_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    pub reservation_time: DateTimeWithTimeZone,
    pub party_size: i32,
}

/// Partial update of a reservation's booking details.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    pub reservation_time: Option<DateTimeWithTimeZone>,
    pub party_size: Option<i32>,
}

/// Repository for reservations
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    db: DatabaseConnection,
}

impl ReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Take a reservation; it starts out PENDING with no party.
    pub async fn create(&self, input: NewReservation) -> Result<reservation::Model, SeatingError> {
        let customer_name = require_text("customer_name", &input.customer_name)?;
        let customer_phone = require_text("customer_phone", &input.customer_phone)?;
        require_at_least_one("party_size", input.party_size)?;

        restaurant::Entity::find_by_id(input.restaurant_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("restaurant", input.restaurant_id))?;

        let now = Utc::now().fixed_offset();
        let created = reservation::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(input.restaurant_id),
            party_id: Set(None),
            customer_name: Set(customer_name),
            customer_phone: Set(customer_phone),
            customer_email: Set(input.customer_email),
            special_requests: Set(input.special_requests),
            reservation_time: Set(input.reservation_time),
            party_size: Set(input.party_size),
            status: Set(ReservationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            reservation_id = %created.id,
            restaurant_id = %created.restaurant_id,
            reservation_time = %created.reservation_time,
            "Reservation taken"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<reservation::Model, SeatingError> {
        reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("reservation", id))
    }

    /// Apply a partial update. A reservation holding a table cannot grow past
    /// that table's capacity.
    pub async fn update(
        &self,
        id: Uuid,
        changes: ReservationUpdate,
    ) -> Result<reservation::Model, SeatingError> {
        let existing = self.get(id).await?;

        if let Some(party_size) = changes.party_size {
            require_at_least_one("party_size", party_size)?;
            if let Some(capacity) = held_table_capacity(&self.db, existing.id).await?
                && party_size > capacity
            {
                return Err(SeatingError::CapacityExceeded {
                    party_size,
                    capacity,
                });
            }
        }

        let mut active_model: reservation::ActiveModel = existing.into();
        if let Some(customer_name) = changes.customer_name {
            active_model.customer_name = Set(require_text("customer_name", &customer_name)?);
        }
        if let Some(customer_phone) = changes.customer_phone {
            active_model.customer_phone = Set(require_text("customer_phone", &customer_phone)?);
        }
        if let Some(customer_email) = changes.customer_email {
            active_model.customer_email = Set(Some(customer_email));
        }
        if let Some(special_requests) = changes.special_requests {
            active_model.special_requests = Set(Some(special_requests));
        }
        if let Some(reservation_time) = changes.reservation_time {
            active_model.reservation_time = Set(reservation_time);
        }
        if let Some(party_size) = changes.party_size {
            active_model.party_size = Set(party_size);
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(reservation_id = %updated.id, "Reservation updated");
        Ok(updated)
    }

    /// Reservations of a restaurant in time order, optionally within
    /// `[from, to)` and with one status.
    pub async fn list(
        &self,
        restaurant_id: Uuid,
        status: Option<ReservationStatus>,
        from: Option<DateTimeWithTimeZone>,
        to: Option<DateTimeWithTimeZone>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<reservation::Model>, SeatingError> {
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(reservation::Column::ReservationTime);

        if let Some(status) = status {
            query = query.filter(reservation::Column::Status.eq(status));
        }
        if let Some(from) = from {
            query = query.filter(reservation::Column::ReservationTime.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(reservation::Column::ReservationTime.lt(to));
        }

        Ok(query
            .offset(offset.unwrap_or(0))
            .limit(page_limit(limit))
            .all(&self.db)
            .await?)
    }
}

async fn held_table_capacity(
    db: &DatabaseConnection,
    reservation_id: Uuid,
) -> Result<Option<i32>, SeatingError> {
    let Some(held) = reservation_assignment::Entity::find()
        .filter(reservation_assignment::Column::ReservationId.eq(reservation_id))
        .filter(reservation_assignment::Column::Status.eq(AssignmentStatus::Active))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Ok(dining_table::Entity::find_by_id(held.table_id)
        .one(db)
        .await?
        .map(|table| table.capacity))
}
