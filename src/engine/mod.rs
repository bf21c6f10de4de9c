//! # Seating Engine
//!
//! The only writer of status columns. Every public operation runs inside one
//! database transaction: rows it decides on are read with `SELECT ... FOR
//! UPDATE` and every status write is a compare-and-set against the status that
//! was read. SQLite has no row locks, so there a write transaction takes the
//! database writer lock before its first read. A lost race surfaces as
//! [`SeatingError::TableNotAvailable`] or [`SeatingError::ConcurrentConflict`]
//! instead of a double booking.
//!
//! Locks are taken table first, then party, reservation or entry, then
//! assignment rows.

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait,
    PrimaryKeyTrait, QueryFilter, QuerySelect, TransactionTrait, UpdateMany, sea_query::Expr,
};
use uuid::Uuid;

use crate::config::WaitingListConfig;
use crate::error::SeatingError;
use crate::models::{
    AssignmentStatus, PartyStatus, ReservationStatus, StatusMachine, TableStatus,
    WaitingListStatus, dining_table, party, reservation, reservation_assignment,
    table_assignment, waiting_list_entry,
};

mod assignment;
mod availability;
mod parties;
mod reservation_flow;
mod tables;
mod waiting_list;

pub use assignment::AssignTable;
pub use availability::Occupancy;
pub use reservation_flow::AssignReservation;
pub use tables::TableRetirement;
pub use waiting_list::{NewWaitingListEntry, PromoteWaitingListEntry};

/// Entry point for every seating operation.
#[derive(Clone)]
pub struct SeatingEngine {
    db: DatabaseConnection,
    waiting_list: WaitingListConfig,
}

impl SeatingEngine {
    pub fn new(db: DatabaseConnection, waiting_list: WaitingListConfig) -> Self {
        Self { db, waiting_list }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Open the transaction a state-changing operation runs in.
    ///
    /// On SQLite a no-op UPDATE claims the writer lock immediately, so a
    /// competing writer waits out the busy timeout before it reads anything
    /// rather than failing when it upgrades a stale read lock.
    pub(crate) async fn begin_write(&self) -> Result<DatabaseTransaction, SeatingError> {
        let txn = self.db.begin().await?;
        if txn.get_database_backend() == DbBackend::Sqlite {
            dining_table::Entity::update_many()
                .col_expr(dining_table::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
                .filter(Expr::cust("1 = 0"))
                .exec(&txn)
                .await?;
        }
        Ok(txn)
    }
}

/// Entities with an engine-owned status column.
pub(crate) trait StatusColumns: EntityTrait {
    type Status: StatusMachine;

    const ENTITY: &'static str;
    const ID: Self::Column;
    const STATUS: Self::Column;
    const UPDATED_AT: Self::Column;
}

impl StatusColumns for dining_table::Entity {
    type Status = TableStatus;

    const ENTITY: &'static str = "table";
    const ID: dining_table::Column = dining_table::Column::Id;
    const STATUS: dining_table::Column = dining_table::Column::Status;
    const UPDATED_AT: dining_table::Column = dining_table::Column::UpdatedAt;
}

impl StatusColumns for party::Entity {
    type Status = PartyStatus;

    const ENTITY: &'static str = "party";
    const ID: party::Column = party::Column::Id;
    const STATUS: party::Column = party::Column::Status;
    const UPDATED_AT: party::Column = party::Column::UpdatedAt;
}

impl StatusColumns for reservation::Entity {
    type Status = ReservationStatus;

    const ENTITY: &'static str = "reservation";
    const ID: reservation::Column = reservation::Column::Id;
    const STATUS: reservation::Column = reservation::Column::Status;
    const UPDATED_AT: reservation::Column = reservation::Column::UpdatedAt;
}

impl StatusColumns for waiting_list_entry::Entity {
    type Status = WaitingListStatus;

    const ENTITY: &'static str = "waiting_list_entry";
    const ID: waiting_list_entry::Column = waiting_list_entry::Column::Id;
    const STATUS: waiting_list_entry::Column = waiting_list_entry::Column::Status;
    const UPDATED_AT: waiting_list_entry::Column = waiting_list_entry::Column::UpdatedAt;
}

impl StatusColumns for table_assignment::Entity {
    type Status = AssignmentStatus;

    const ENTITY: &'static str = "table_assignment";
    const ID: table_assignment::Column = table_assignment::Column::Id;
    const STATUS: table_assignment::Column = table_assignment::Column::Status;
    const UPDATED_AT: table_assignment::Column = table_assignment::Column::UpdatedAt;
}

impl StatusColumns for reservation_assignment::Entity {
    type Status = AssignmentStatus;

    const ENTITY: &'static str = "reservation_assignment";
    const ID: reservation_assignment::Column = reservation_assignment::Column::Id;
    const STATUS: reservation_assignment::Column = reservation_assignment::Column::Status;
    const UPDATED_AT: reservation_assignment::Column = reservation_assignment::Column::UpdatedAt;
}

/// Load a row by id under an exclusive row lock.
pub(crate) async fn fetch_locked<E, C>(
    conn: &C,
    entity: &'static str,
    id: Uuid,
) -> Result<E::Model, SeatingError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found(entity, id))
}

/// Move `id` from `from` to `to`, failing if the edge is illegal or if the
/// stored status no longer equals `from`.
pub(crate) async fn set_status<E, C>(
    conn: &C,
    id: Uuid,
    from: E::Status,
    to: E::Status,
) -> Result<E::Status, SeatingError>
where
    E: StatusColumns,
    C: ConnectionTrait,
{
    set_status_with::<E, C, _>(conn, id, from, to, |update| update).await
}

/// [`set_status`] with extra column writes folded into the same statement.
pub(crate) async fn set_status_with<E, C, F>(
    conn: &C,
    id: Uuid,
    from: E::Status,
    to: E::Status,
    extra: F,
) -> Result<E::Status, SeatingError>
where
    E: StatusColumns,
    C: ConnectionTrait,
    F: FnOnce(UpdateMany<E>) -> UpdateMany<E>,
{
    let next = from.transition(to)?;

    let update = E::update_many()
        .col_expr(E::STATUS, Expr::value(next.as_str()))
        .col_expr(E::UPDATED_AT, Expr::value(Utc::now().fixed_offset()))
        .filter(E::ID.eq(id))
        .filter(E::STATUS.eq(from.as_str()));

    let result = extra(update).exec(conn).await?;

    if result.rows_affected == 0 {
        counter!("seating_status_conflicts_total", "entity" => E::ENTITY).increment(1);
        tracing::warn!(
            entity = E::ENTITY,
            id = %id,
            expected = from.as_str(),
            "Status changed underneath transition"
        );
        return Err(SeatingError::ConcurrentConflict {
            entity: E::ENTITY,
            id,
        });
    }

    tracing::debug!(
        entity = E::ENTITY,
        id = %id,
        from = from.as_str(),
        to = next.as_str(),
        "Status transition applied"
    );
    Ok(next)
}

/// Number of ACTIVE assignments (either kind) currently holding `table_id`.
pub(crate) async fn active_holds_on_table<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> Result<u64, SeatingError> {
    use sea_orm::PaginatorTrait;

    let seated = table_assignment::Entity::find()
        .filter(table_assignment::Column::TableId.eq(table_id))
        .filter(table_assignment::Column::Status.eq(AssignmentStatus::Active))
        .count(conn)
        .await?;
    let held = reservation_assignment::Entity::find()
        .filter(reservation_assignment::Column::TableId.eq(table_id))
        .filter(reservation_assignment::Column::Status.eq(AssignmentStatus::Active))
        .count(conn)
        .await?;
    Ok(seated + held)
}

/// Recompute a table's cached status after an assignment left ACTIVE: it goes
/// back to AVAILABLE unless another assignment still holds it.
pub(crate) async fn release_table<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> Result<(), SeatingError> {
    let holds = active_holds_on_table(conn, table_id).await?;
    if holds > 0 {
        tracing::warn!(table_id = %table_id, holds, "Table still held after release; keeping status");
        return Ok(());
    }

    let table = fetch_locked::<dining_table::Entity, _>(conn, "table", table_id).await?;
    match table.status {
        TableStatus::Occupied | TableStatus::Reserved => {
            set_status::<dining_table::Entity, _>(
                conn,
                table.id,
                table.status,
                TableStatus::Available,
            )
            .await?;
        }
        other => {
            tracing::debug!(table_id = %table_id, status = %other, "Table not held; nothing to release");
        }
    }
    Ok(())
}

fn record_rejection(operation: &'static str, error: &SeatingError) {
    counter!(
        "seating_operations_rejected_total",
        "operation" => operation,
        "code" => error.code()
    )
    .increment(1);
    tracing::info!(operation, code = error.code(), error = %error, "Seating operation rejected");
}
