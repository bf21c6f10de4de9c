//! Read-only projections over table state: which tables can take a party
//! right now, and how full the room is.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, prelude::DateTimeWithTimeZone,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use super::SeatingEngine;
use crate::error::SeatingError;
use crate::models::{TableStatus, dining_table, restaurant};

/// Occupancy snapshot for one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Occupancy {
    pub restaurant_id: Uuid,
    /// Active tables currently OCCUPIED
    pub occupied_count: u64,
    /// Active tables currently held for a reservation
    pub reserved_count: u64,
    /// All active tables
    pub total_count: u64,
    /// `occupied_count / total_count`, 0 for a restaurant without tables
    pub rate: f64,
}

impl SeatingEngine {
    /// Active AVAILABLE tables of `restaurant_id` that seat at least
    /// `party_size`, ordered by table number.
    ///
    /// `at` is accepted for callers planning ahead but only the current state
    /// is consulted.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        restaurant_id: Uuid,
        party_size: i32,
        at: Option<DateTimeWithTimeZone>,
    ) -> Result<Vec<dining_table::Model>, SeatingError> {
        if party_size < 1 {
            return Err(SeatingError::validation(
                "party_size",
                "party size must be at least 1",
            ));
        }
        ensure_restaurant(&self.db, restaurant_id).await?;

        let mut tables = dining_table::Entity::find()
            .filter(dining_table::Column::RestaurantId.eq(restaurant_id))
            .filter(dining_table::Column::IsActive.eq(true))
            .filter(dining_table::Column::Status.eq(TableStatus::Available))
            .filter(dining_table::Column::Capacity.gte(party_size))
            .all(&self.db)
            .await?;
        dining_table::sort_by_table_number(&mut tables);

        tracing::debug!(matches = tables.len(), "Availability computed");
        Ok(tables)
    }

    #[instrument(skip(self))]
    pub async fn compute_occupancy(&self, restaurant_id: Uuid) -> Result<Occupancy, SeatingError> {
        ensure_restaurant(&self.db, restaurant_id).await?;

        let tables = dining_table::Entity::find()
            .filter(dining_table::Column::RestaurantId.eq(restaurant_id))
            .filter(dining_table::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        Ok(occupancy_of(restaurant_id, &tables))
    }
}

pub(super) fn occupancy_of(restaurant_id: Uuid, tables: &[dining_table::Model]) -> Occupancy {
    let total_count = tables.len() as u64;
    let occupied_count = tables
        .iter()
        .filter(|t| t.status == TableStatus::Occupied)
        .count() as u64;
    let reserved_count = tables
        .iter()
        .filter(|t| t.status == TableStatus::Reserved)
        .count() as u64;
    let rate = if total_count == 0 {
        0.0
    } else {
        occupied_count as f64 / total_count as f64
    };

    Occupancy {
        restaurant_id,
        occupied_count,
        reserved_count,
        total_count,
        rate,
    }
}

pub(super) async fn ensure_restaurant<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
) -> Result<restaurant::Model, SeatingError> {
    restaurant::Entity::find_by_id(restaurant_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("restaurant", restaurant_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn table(number: &str, status: TableStatus) -> dining_table::Model {
        let now = Utc::now().fixed_offset();
        dining_table::Model {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::nil(),
            table_number: number.to_string(),
            capacity: 4,
            location: "main".to_string(),
            is_active: true,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn occupancy_of_empty_room_is_zero() {
        let occupancy = occupancy_of(Uuid::nil(), &[]);
        assert_eq!(occupancy.total_count, 0);
        assert_eq!(occupancy.rate, 0.0);
    }

    #[test]
    fn occupancy_rate_counts_occupied_only() {
        let tables = vec![
            table("1", TableStatus::Occupied),
            table("2", TableStatus::Reserved),
            table("3", TableStatus::Available),
            table("4", TableStatus::Cleaning),
        ];
        let occupancy = occupancy_of(Uuid::nil(), &tables);
        assert_eq!(occupancy.occupied_count, 1);
        assert_eq!(occupancy.reserved_count, 1);
        assert_eq!(occupancy.total_count, 4);
        assert!((occupancy.rate - 0.25).abs() < f64::EPSILON);
    }
}
