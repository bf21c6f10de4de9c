//! Read access to both assignment kinds. Assignments are created and closed
//! only by the seating engine.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::page_limit;
use crate::error::SeatingError;
use crate::models::{AssignmentStatus, reservation_assignment, table_assignment};

/// Listing filter. `party_id` applies to table assignments and
/// `reservation_id` to reservation assignments; the rest apply to both.
#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub table_id: Option<Uuid>,
    pub server_id: Option<Uuid>,
    pub party_id: Option<Uuid>,
    pub reservation_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Repository for table and reservation assignments
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    db: DatabaseConnection,
}

impl AssignmentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_table_assignment(
        &self,
        id: Uuid,
    ) -> Result<table_assignment::Model, SeatingError> {
        table_assignment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("table_assignment", id))
    }

    /// Table assignments, newest first.
    pub async fn list_table_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> Result<Vec<table_assignment::Model>, SeatingError> {
        let mut query = table_assignment::Entity::find()
            .order_by_desc(table_assignment::Column::AssignedAt)
            .order_by_asc(table_assignment::Column::Id);

        if let Some(table_id) = filter.table_id {
            query = query.filter(table_assignment::Column::TableId.eq(table_id));
        }
        if let Some(server_id) = filter.server_id {
            query = query.filter(table_assignment::Column::ServerId.eq(server_id));
        }
        if let Some(party_id) = filter.party_id {
            query = query.filter(table_assignment::Column::PartyId.eq(party_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(table_assignment::Column::Status.eq(status));
        }

        Ok(query
            .offset(filter.offset.unwrap_or(0))
            .limit(page_limit(filter.limit))
            .all(&self.db)
            .await?)
    }

    pub async fn get_reservation_assignment(
        &self,
        id: Uuid,
    ) -> Result<reservation_assignment::Model, SeatingError> {
        reservation_assignment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("reservation_assignment", id))
    }

    /// Reservation assignments, newest first.
    pub async fn list_reservation_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> Result<Vec<reservation_assignment::Model>, SeatingError> {
        let mut query = reservation_assignment::Entity::find()
            .order_by_desc(reservation_assignment::Column::AssignedAt)
            .order_by_asc(reservation_assignment::Column::Id);

        if let Some(table_id) = filter.table_id {
            query = query.filter(reservation_assignment::Column::TableId.eq(table_id));
        }
        if let Some(server_id) = filter.server_id {
            query = query.filter(reservation_assignment::Column::ServerId.eq(server_id));
        }
        if let Some(reservation_id) = filter.reservation_id {
            query = query.filter(reservation_assignment::Column::ReservationId.eq(reservation_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(reservation_assignment::Column::Status.eq(status));
        }

        Ok(query
            .offset(filter.offset.unwrap_or(0))
            .limit(page_limit(filter.limit))
            .all(&self.db)
            .await?)
    }
}
