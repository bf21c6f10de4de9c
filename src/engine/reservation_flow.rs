//! Reservation lifecycle: confirmation, holding a table, arrival, and the
//! ways a reservation can end early.

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::Expr,
};
use tracing::instrument;
use uuid::Uuid;

use super::assignment::{AssignTable, assign_table_in, ensure_table_available};
use super::{SeatingEngine, fetch_locked, record_rejection, release_table, set_status, set_status_with};
use crate::error::SeatingError;
use crate::models::{
    AssignmentStatus, PartyStatus, ReservationStatus, TableStatus, dining_table, party,
    reservation, reservation_assignment, server, table_assignment,
};

/// Arguments for holding a table for a confirmed reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignReservation {
    pub reservation_id: Uuid,
    pub table_id: Uuid,
    pub server_id: Uuid,
    pub idempotency_key: Option<String>,
    pub notes: Option<String>,
}

impl AssignReservation {
    pub fn new(reservation_id: Uuid, table_id: Uuid, server_id: Uuid) -> Self {
        Self {
            reservation_id,
            table_id,
            server_id,
            idempotency_key: None,
            notes: None,
        }
    }

    pub fn with_idempotency_key<S: Into<String>>(mut self, key: S) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl SeatingEngine {
    /// PENDING -> CONFIRMED. The reservation's party is created at this point
    /// if none was linked when the reservation was taken.
    #[instrument(skip(self))]
    pub async fn confirm_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<reservation::Model, SeatingError> {
        let confirmed = async {
            let txn = self.begin_write().await?;
            let confirmed = confirm_in(&txn, reservation_id).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(confirmed)
        }
        .await
        .map_err(|e| e.on_contention("reservation", reservation_id))
        .inspect_err(|e| record_rejection("confirm_reservation", e))?;

        tracing::info!(party_id = ?confirmed.party_id, "Reservation confirmed");
        Ok(confirmed)
    }

    /// PENDING|CONFIRMED -> CANCELLED, releasing any held table.
    #[instrument(skip(self))]
    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<reservation::Model, SeatingError> {
        self.end_reservation(reservation_id, ReservationStatus::Cancelled, "cancel_reservation")
            .await
    }

    /// CONFIRMED -> NO_SHOW, releasing any held table.
    #[instrument(skip(self))]
    pub async fn mark_no_show(
        &self,
        reservation_id: Uuid,
    ) -> Result<reservation::Model, SeatingError> {
        self.end_reservation(reservation_id, ReservationStatus::NoShow, "mark_no_show")
            .await
    }

    async fn end_reservation(
        &self,
        reservation_id: Uuid,
        outcome: ReservationStatus,
        operation: &'static str,
    ) -> Result<reservation::Model, SeatingError> {
        let ended = async {
            let txn = self.begin_write().await?;
            let ended = end_reservation_in(&txn, reservation_id, outcome).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(ended)
        }
        .await
        .map_err(|e| e.on_contention("reservation", reservation_id))
        .inspect_err(|e| record_rejection(operation, e))?;

        tracing::info!(status = %ended.status, "Reservation ended");
        Ok(ended)
    }

    /// Hold a table for a CONFIRMED reservation. The table becomes RESERVED;
    /// the party is untouched until it arrives.
    #[instrument(
        skip_all,
        fields(reservation_id = %request.reservation_id, table_id = %request.table_id, server_id = %request.server_id)
    )]
    pub async fn assign_reservation(
        &self,
        request: AssignReservation,
    ) -> Result<reservation_assignment::Model, SeatingError> {
        let assignment = async {
            let txn = self.begin_write().await?;
            let assignment = assign_reservation_in(&txn, &request).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(assignment)
        }
        .await
        .map_err(|e| e.on_contention("table", request.table_id))
        .inspect_err(|e| record_rejection("assign_reservation", e))?;

        tracing::info!(assignment_id = %assignment.id, "Table held for reservation");
        Ok(assignment)
    }

    /// The reserved party has arrived: the hold is completed, the reservation
    /// becomes COMPLETED and the party is seated at the held table, all in one
    /// transaction. `server_id` overrides the server named on the hold.
    #[instrument(skip(self))]
    pub async fn seat_reservation(
        &self,
        reservation_assignment_id: Uuid,
        server_id: Option<Uuid>,
    ) -> Result<table_assignment::Model, SeatingError> {
        let seated = async {
            let txn = self.begin_write().await?;
            let seated = seat_reservation_in(&txn, reservation_assignment_id, server_id).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(seated)
        }
        .await
        .map_err(|e| e.on_contention("reservation_assignment", reservation_assignment_id))
        .inspect_err(|e| record_rejection("seat_reservation", e))?;

        counter!("seating_assignments_closed_total", "kind" => "reservation", "outcome" => "seated")
            .increment(1);
        tracing::info!(assignment_id = %seated.id, "Reserved party seated");
        Ok(seated)
    }

    /// Drop a table hold. The reservation stays CONFIRMED and can be given
    /// another table.
    #[instrument(skip(self))]
    pub async fn cancel_reservation_assignment(
        &self,
        reservation_assignment_id: Uuid,
    ) -> Result<reservation_assignment::Model, SeatingError> {
        let cancelled = async {
            let txn = self.begin_write().await?;
            let cancelled = cancel_hold_in(&txn, reservation_assignment_id).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(cancelled)
        }
        .await
        .map_err(|e| e.on_contention("reservation_assignment", reservation_assignment_id))
        .inspect_err(|e| record_rejection("cancel_reservation_assignment", e))?;

        counter!("seating_assignments_closed_total", "kind" => "reservation", "outcome" => "cancelled")
            .increment(1);
        tracing::info!(table_id = %cancelled.table_id, "Reservation hold cancelled");
        Ok(cancelled)
    }
}

async fn confirm_in<C: ConnectionTrait>(
    conn: &C,
    reservation_id: Uuid,
) -> Result<reservation::Model, SeatingError> {
    let current = fetch_locked::<reservation::Entity, _>(conn, "reservation", reservation_id).await?;
    set_status::<reservation::Entity, _>(
        conn,
        current.id,
        current.status,
        ReservationStatus::Confirmed,
    )
    .await?;
    ensure_reservation_party(conn, &current).await?;
    reload_reservation(conn, current.id).await
}

async fn end_reservation_in<C: ConnectionTrait>(
    conn: &C,
    reservation_id: Uuid,
    outcome: ReservationStatus,
) -> Result<reservation::Model, SeatingError> {
    let hold_peek = reservation_assignment::Entity::find()
        .filter(reservation_assignment::Column::ReservationId.eq(reservation_id))
        .filter(reservation_assignment::Column::Status.eq(AssignmentStatus::Active))
        .one(conn)
        .await?;
    if let Some(held) = hold_peek {
        fetch_locked::<dining_table::Entity, _>(conn, "table", held.table_id).await?;
    }
    let current = fetch_locked::<reservation::Entity, _>(conn, "reservation", reservation_id).await?;
    set_status::<reservation::Entity, _>(conn, current.id, current.status, outcome).await?;

    if let Some(held) = active_reservation_assignment(conn, current.id).await? {
        set_status::<reservation_assignment::Entity, _>(
            conn,
            held.id,
            held.status,
            AssignmentStatus::Cancelled,
        )
        .await?;
        release_table(conn, held.table_id).await?;
        tracing::info!(assignment_id = %held.id, table_id = %held.table_id, "Released held table");
    }

    if let Some(party_id) = current.party_id {
        let linked = fetch_locked::<party::Entity, _>(conn, "party", party_id).await?;
        if linked.status == PartyStatus::Waiting {
            set_status::<party::Entity, _>(conn, linked.id, linked.status, PartyStatus::Cancelled)
                .await?;
        }
    }

    reload_reservation(conn, current.id).await
}

async fn seat_reservation_in<C: ConnectionTrait>(
    conn: &C,
    reservation_assignment_id: Uuid,
    server_id: Option<Uuid>,
) -> Result<table_assignment::Model, SeatingError> {
    let held = lock_active_hold(conn, reservation_assignment_id).await?;

    let booking =
        fetch_locked::<reservation::Entity, _>(conn, "reservation", held.reservation_id).await?;
    if booking.status != ReservationStatus::Confirmed {
        return Err(SeatingError::ReservationNotConfirmed {
            reservation_id: booking.id,
            status: booking.status.to_string(),
        });
    }
    let party_id = ensure_reservation_party(conn, &booking).await?;

    let now = Utc::now().fixed_offset();
    set_status_with::<reservation_assignment::Entity, _, _>(
        conn,
        held.id,
        held.status,
        AssignmentStatus::Completed,
        |update| update.col_expr(reservation_assignment::Column::CompletedAt, Expr::value(now)),
    )
    .await?;
    set_status::<reservation::Entity, _>(
        conn,
        booking.id,
        booking.status,
        ReservationStatus::Completed,
    )
    .await?;
    release_table(conn, held.table_id).await?;

    let request = AssignTable {
        table_id: held.table_id,
        party_id,
        server_id: server_id.unwrap_or(held.server_id),
        idempotency_key: None,
        notes: held.notes.clone(),
    };
    assign_table_in(conn, &request).await
}

async fn cancel_hold_in<C: ConnectionTrait>(
    conn: &C,
    reservation_assignment_id: Uuid,
) -> Result<reservation_assignment::Model, SeatingError> {
    let held = lock_active_hold(conn, reservation_assignment_id).await?;
    set_status::<reservation_assignment::Entity, _>(
        conn,
        held.id,
        held.status,
        AssignmentStatus::Cancelled,
    )
    .await?;
    release_table(conn, held.table_id).await?;

    reservation_assignment::Entity::find_by_id(held.id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("reservation_assignment", held.id))
}

async fn lock_active_hold<C: ConnectionTrait>(
    conn: &C,
    reservation_assignment_id: Uuid,
) -> Result<reservation_assignment::Model, SeatingError> {
    let held = reservation_assignment::Entity::find_by_id(reservation_assignment_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("reservation_assignment", reservation_assignment_id))?;
    fetch_locked::<dining_table::Entity, _>(conn, "table", held.table_id).await?;
    let held = fetch_locked::<reservation_assignment::Entity, _>(
        conn,
        "reservation_assignment",
        reservation_assignment_id,
    )
    .await?;
    if held.status != AssignmentStatus::Active {
        return Err(SeatingError::AssignmentNotActive {
            assignment_id: held.id,
            status: held.status.to_string(),
        });
    }
    Ok(held)
}

async fn assign_reservation_in<C: ConnectionTrait>(
    conn: &C,
    request: &AssignReservation,
) -> Result<reservation_assignment::Model, SeatingError> {
    if let Some(key) = request.idempotency_key.as_deref()
        && let Some(existing) = reservation_assignment::Entity::find()
            .filter(reservation_assignment::Column::IdempotencyKey.eq(key))
            .one(conn)
            .await?
    {
        let same_request = existing.reservation_id == request.reservation_id
            && existing.table_id == request.table_id
            && existing.server_id == request.server_id;
        if !same_request {
            return Err(SeatingError::IdempotencyMismatch {
                key: key.to_string(),
            });
        }
        counter!("seating_idempotent_replays_total", "kind" => "reservation").increment(1);
        tracing::info!(assignment_id = %existing.id, key, "Replaying idempotent reservation assignment");
        return Ok(existing);
    }

    let table = fetch_locked::<dining_table::Entity, _>(conn, "table", request.table_id).await?;
    let booking =
        fetch_locked::<reservation::Entity, _>(conn, "reservation", request.reservation_id)
            .await?;
    let staff = fetch_locked::<server::Entity, _>(conn, "server", request.server_id).await?;

    if booking.party_size > table.capacity {
        return Err(SeatingError::CapacityExceeded {
            party_size: booking.party_size,
            capacity: table.capacity,
        });
    }
    ensure_table_available(&table)?;
    if booking.status != ReservationStatus::Confirmed {
        return Err(SeatingError::ReservationNotConfirmed {
            reservation_id: booking.id,
            status: booking.status.to_string(),
        });
    }
    if let Some(held) = active_reservation_assignment(conn, booking.id).await? {
        return Err(SeatingError::ReservationAlreadyAssigned {
            reservation_id: booking.id,
            assignment_id: held.id,
        });
    }
    if !staff.is_active {
        return Err(SeatingError::ServerInactive {
            server_id: staff.id,
        });
    }

    set_status::<dining_table::Entity, _>(conn, table.id, table.status, TableStatus::Reserved)
        .await?;

    let now = Utc::now().fixed_offset();
    let assignment = reservation_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        reservation_id: Set(booking.id),
        table_id: Set(table.id),
        server_id: Set(staff.id),
        status: Set(AssignmentStatus::Active),
        assigned_at: Set(now),
        completed_at: Set(None),
        idempotency_key: Set(request.idempotency_key.clone()),
        notes: Set(request.notes.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(|e| SeatingError::from_write("reservation", booking.id, e))?;

    counter!("seating_assignments_created_total", "kind" => "reservation").increment(1);
    Ok(assignment)
}

async fn active_reservation_assignment<C: ConnectionTrait>(
    conn: &C,
    reservation_id: Uuid,
) -> Result<Option<reservation_assignment::Model>, SeatingError> {
    Ok(reservation_assignment::Entity::find()
        .filter(reservation_assignment::Column::ReservationId.eq(reservation_id))
        .filter(reservation_assignment::Column::Status.eq(AssignmentStatus::Active))
        .lock_exclusive()
        .one(conn)
        .await?)
}

/// Return the reservation's party, creating and linking one from the booking
/// details when the reservation has none yet.
async fn ensure_reservation_party<C: ConnectionTrait>(
    conn: &C,
    booking: &reservation::Model,
) -> Result<Uuid, SeatingError> {
    if let Some(party_id) = booking.party_id {
        return Ok(party_id);
    }

    let now = Utc::now().fixed_offset();
    let created = party::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(booking.customer_name.clone()),
        size: Set(booking.party_size),
        phone: Set(Some(booking.customer_phone.clone())),
        email: Set(booking.customer_email.clone()),
        status: Set(PartyStatus::Waiting),
        arrival_time: Set(booking.reservation_time),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await?;

    let linked = reservation::Entity::update_many()
        .col_expr(reservation::Column::PartyId, Expr::value(created.id))
        .col_expr(reservation::Column::UpdatedAt, Expr::value(now))
        .filter(reservation::Column::Id.eq(booking.id))
        .filter(reservation::Column::PartyId.is_null())
        .exec(conn)
        .await?;
    if linked.rows_affected == 0 {
        return Err(SeatingError::ConcurrentConflict {
            entity: "reservation",
            id: booking.id,
        });
    }

    tracing::info!(reservation_id = %booking.id, party_id = %created.id, "Created party for reservation");
    Ok(created.id)
}

async fn reload_reservation<C: ConnectionTrait>(
    conn: &C,
    reservation_id: Uuid,
) -> Result<reservation::Model, SeatingError> {
    reservation::Entity::find_by_id(reservation_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("reservation", reservation_id))
}
