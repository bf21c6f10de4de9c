//! Seating a party at a table and closing that assignment again.

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use tracing::instrument;
use uuid::Uuid;

use super::{SeatingEngine, fetch_locked, record_rejection, release_table, set_status, set_status_with};
use crate::error::SeatingError;
use crate::models::{
    AssignmentStatus, PartyStatus, TableStatus, dining_table, party, server, table_assignment,
};

/// Arguments for seating a waiting party at a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignTable {
    pub table_id: Uuid,
    pub party_id: Uuid,
    pub server_id: Uuid,
    pub idempotency_key: Option<String>,
    pub notes: Option<String>,
}

impl AssignTable {
    pub fn new(table_id: Uuid, party_id: Uuid, server_id: Uuid) -> Self {
        Self {
            table_id,
            party_id,
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
    /// Seat `party_id` at `table_id` under `server_id`.
    ///
    /// Checks run in a fixed order: unknown ids, capacity, table status,
    /// party status, server activity. On success the assignment row, the
    /// table's OCCUPIED status and the party's SEATED status are committed
    /// together.
    #[instrument(
        skip_all,
        fields(table_id = %request.table_id, party_id = %request.party_id, server_id = %request.server_id)
    )]
    pub async fn assign_table(
        &self,
        request: AssignTable,
    ) -> Result<table_assignment::Model, SeatingError> {
        let assignment = async {
            let txn = self.begin_write().await?;
            let assignment = assign_table_in(&txn, &request).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(assignment)
        }
        .await
        .map_err(|e| e.on_contention("table", request.table_id))
        .inspect_err(|e| record_rejection("assign_table", e))?;

        tracing::info!(assignment_id = %assignment.id, "Party seated");
        Ok(assignment)
    }

    /// Close an ACTIVE assignment as COMPLETED: the party leaves (FINISHED)
    /// and the table becomes AVAILABLE again.
    #[instrument(skip(self))]
    pub async fn complete_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<table_assignment::Model, SeatingError> {
        let assignment = async {
            let txn = self.begin_write().await?;
            let assignment = close_assignment(&txn, assignment_id, AssignmentStatus::Completed).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(assignment)
        }
        .await
        .map_err(|e| e.on_contention("table_assignment", assignment_id))
        .inspect_err(|e| record_rejection("complete_assignment", e))?;

        counter!("seating_assignments_closed_total", "kind" => "table", "outcome" => "completed")
            .increment(1);
        tracing::info!(table_id = %assignment.table_id, "Assignment completed");
        Ok(assignment)
    }

    /// Close an ACTIVE assignment as CANCELLED: the party goes back to
    /// WAITING and the table becomes AVAILABLE again.
    #[instrument(skip(self))]
    pub async fn cancel_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<table_assignment::Model, SeatingError> {
        let assignment = async {
            let txn = self.begin_write().await?;
            let assignment = close_assignment(&txn, assignment_id, AssignmentStatus::Cancelled).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(assignment)
        }
        .await
        .map_err(|e| e.on_contention("table_assignment", assignment_id))
        .inspect_err(|e| record_rejection("cancel_assignment", e))?;

        counter!("seating_assignments_closed_total", "kind" => "table", "outcome" => "cancelled")
            .increment(1);
        tracing::info!(table_id = %assignment.table_id, "Assignment cancelled");
        Ok(assignment)
    }
}

/// Look up an earlier assignment created under `key`. A hit with the same
/// arguments is returned for replay; a hit with different ones is an error.
pub(super) async fn replay_table_assignment<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    table_id: Uuid,
    party_id: Option<Uuid>,
    server_id: Uuid,
) -> Result<Option<table_assignment::Model>, SeatingError> {
    let Some(existing) = table_assignment::Entity::find()
        .filter(table_assignment::Column::IdempotencyKey.eq(key))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let same_request = existing.table_id == table_id
        && existing.server_id == server_id
        && party_id.is_none_or(|party_id| existing.party_id == party_id);

    if !same_request {
        return Err(SeatingError::IdempotencyMismatch {
            key: key.to_string(),
        });
    }

    counter!("seating_idempotent_replays_total", "kind" => "table").increment(1);
    tracing::info!(assignment_id = %existing.id, key, "Replaying idempotent table assignment");
    Ok(Some(existing))
}

/// Body of [`SeatingEngine::assign_table`], reusable inside a caller's transaction.
pub(super) async fn assign_table_in<C: ConnectionTrait>(
    conn: &C,
    request: &AssignTable,
) -> Result<table_assignment::Model, SeatingError> {
    if let Some(key) = request.idempotency_key.as_deref()
        && let Some(existing) = replay_table_assignment(
            conn,
            key,
            request.table_id,
            Some(request.party_id),
            request.server_id,
        )
        .await?
    {
        return Ok(existing);
    }

    let table = fetch_locked::<dining_table::Entity, _>(conn, "table", request.table_id).await?;
    let party = fetch_locked::<party::Entity, _>(conn, "party", request.party_id).await?;
    let server = fetch_locked::<server::Entity, _>(conn, "server", request.server_id).await?;

    if party.size > table.capacity {
        return Err(SeatingError::CapacityExceeded {
            party_size: party.size,
            capacity: table.capacity,
        });
    }
    ensure_table_available(&table)?;
    if party.status != PartyStatus::Waiting {
        return Err(SeatingError::PartyNotWaiting {
            party_id: party.id,
            status: party.status.to_string(),
        });
    }
    if !server.is_active {
        return Err(SeatingError::ServerInactive {
            server_id: server.id,
        });
    }

    set_status::<dining_table::Entity, _>(conn, table.id, table.status, TableStatus::Occupied)
        .await?;
    set_status::<party::Entity, _>(conn, party.id, party.status, PartyStatus::Seated).await?;

    let now = Utc::now().fixed_offset();
    let assignment = table_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        table_id: Set(table.id),
        party_id: Set(party.id),
        server_id: Set(server.id),
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
    .map_err(|e| SeatingError::from_write("table", table.id, e))?;

    counter!("seating_assignments_created_total", "kind" => "table").increment(1);
    Ok(assignment)
}

/// A table can take a new assignment only while active and AVAILABLE.
pub(super) fn ensure_table_available(table: &dining_table::Model) -> Result<(), SeatingError> {
    if !table.is_active {
        return Err(SeatingError::TableNotAvailable {
            table_id: table.id,
            status: "INACTIVE".to_string(),
        });
    }
    if table.status != TableStatus::Available {
        return Err(SeatingError::TableNotAvailable {
            table_id: table.id,
            status: table.status.to_string(),
        });
    }
    Ok(())
}

async fn close_assignment<C: ConnectionTrait>(
    conn: &C,
    assignment_id: Uuid,
    outcome: AssignmentStatus,
) -> Result<table_assignment::Model, SeatingError> {
    let assignment = table_assignment::Entity::find_by_id(assignment_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("table_assignment", assignment_id))?;
    fetch_locked::<dining_table::Entity, _>(conn, "table", assignment.table_id).await?;
    let assignment = fetch_locked::<table_assignment::Entity, _>(
        conn,
        "table_assignment",
        assignment_id,
    )
    .await?;
    if assignment.status != AssignmentStatus::Active {
        return Err(SeatingError::AssignmentNotActive {
            assignment_id,
            status: assignment.status.to_string(),
        });
    }

    let now = Utc::now().fixed_offset();
    set_status_with::<table_assignment::Entity, _, _>(
        conn,
        assignment.id,
        assignment.status,
        outcome,
        |update| match outcome {
            AssignmentStatus::Completed => {
                update.col_expr(table_assignment::Column::CompletedAt, Expr::value(now))
            }
            _ => update,
        },
    )
    .await?;

    let party_outcome = match outcome {
        AssignmentStatus::Completed => PartyStatus::Finished,
        _ => PartyStatus::Waiting,
    };
    let party = fetch_locked::<party::Entity, _>(conn, "party", assignment.party_id).await?;
    set_status::<party::Entity, _>(conn, party.id, party.status, party_outcome).await?;

    release_table(conn, assignment.table_id).await?;

    table_assignment::Entity::find_by_id(assignment.id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("table_assignment", assignment.id))
}
