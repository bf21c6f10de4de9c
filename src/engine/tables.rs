//! Operator-driven table changes: maintenance states and retirement.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::Expr,
};
use tracing::instrument;
use uuid::Uuid;

use super::{SeatingEngine, active_holds_on_table, fetch_locked, record_rejection, set_status};
use crate::error::SeatingError;
use crate::models::{
    StatusMachine, TableStatus, dining_table, reservation_assignment, table_assignment,
    table_section,
};

/// Outcome of retiring a table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRetirement {
    /// The table has assignment history and was soft-invalidated.
    Deactivated(dining_table::Model),
    /// The table was never used and was removed.
    Deleted(Uuid),
}

impl SeatingEngine {
    /// Move a table between AVAILABLE and one of the maintenance states
    /// (CLEANING, OUT_OF_ORDER). OCCUPIED and RESERVED follow assignments and
    /// can be neither requested nor left through this operation.
    #[instrument(skip(self))]
    pub async fn set_table_maintenance(
        &self,
        table_id: Uuid,
        status: TableStatus,
    ) -> Result<dining_table::Model, SeatingError> {
        let updated = async {
            let txn = self.begin_write().await?;
            let updated = set_maintenance_in(&txn, table_id, status).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(updated)
        }
        .await
        .map_err(|e| e.on_contention("table", table_id))
        .inspect_err(|e| record_rejection("set_table_maintenance", e))?;

        tracing::info!(status = %updated.status, "Table status changed by operator");
        Ok(updated)
    }

    /// Remove a table from service. Tables referenced by any assignment are
    /// only deactivated; a table that still has an ACTIVE assignment is refused.
    #[instrument(skip(self))]
    pub async fn retire_table(&self, table_id: Uuid) -> Result<TableRetirement, SeatingError> {
        let outcome = async {
            let txn = self.begin_write().await?;
            let outcome = retire_in(&txn, table_id).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(outcome)
        }
        .await
        .map_err(|e| e.on_contention("table", table_id))
        .inspect_err(|e| record_rejection("retire_table", e))?;

        match &outcome {
            TableRetirement::Deactivated(_) => tracing::info!("Table deactivated"),
            TableRetirement::Deleted(_) => tracing::info!("Table deleted"),
        }
        Ok(outcome)
    }
}

async fn set_maintenance_in<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
    status: TableStatus,
) -> Result<dining_table::Model, SeatingError> {
    if !status.is_maintenance() {
        return Err(SeatingError::validation(
            "status",
            format!(
                "{} is set by assignments and cannot be requested",
                status.as_str()
            ),
        ));
    }

    let table = fetch_locked::<dining_table::Entity, _>(conn, "table", table_id).await?;
    if !table.status.is_maintenance() {
        return Err(SeatingError::InvalidStateTransition {
            entity: "table",
            from: table.status.to_string(),
            to: status.to_string(),
        });
    }
    if table.status == status {
        return Ok(table);
    }

    set_status::<dining_table::Entity, _>(conn, table.id, table.status, status).await?;
    reload_table(conn, table.id).await
}

async fn retire_in<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> Result<TableRetirement, SeatingError> {
    let table = fetch_locked::<dining_table::Entity, _>(conn, "table", table_id).await?;

    if active_holds_on_table(conn, table.id).await? > 0 {
        return Err(SeatingError::TableNotAvailable {
            table_id: table.id,
            status: table.status.to_string(),
        });
    }

    let history = table_assignment::Entity::find()
        .filter(table_assignment::Column::TableId.eq(table.id))
        .count(conn)
        .await?
        + reservation_assignment::Entity::find()
            .filter(reservation_assignment::Column::TableId.eq(table.id))
            .count(conn)
            .await?;

    if history > 0 {
        dining_table::Entity::update_many()
            .col_expr(dining_table::Column::IsActive, Expr::value(false))
            .col_expr(
                dining_table::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(dining_table::Column::Id.eq(table.id))
            .exec(conn)
            .await?;
        return Ok(TableRetirement::Deactivated(reload_table(conn, table.id).await?));
    }

    table_section::Entity::delete_many()
        .filter(table_section::Column::TableId.eq(table.id))
        .exec(conn)
        .await?;
    dining_table::Entity::delete_by_id(table.id)
        .exec(conn)
        .await?;
    Ok(TableRetirement::Deleted(table.id))
}

async fn reload_table<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> Result<dining_table::Model, SeatingError> {
    dining_table::Entity::find_by_id(table_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("table", table_id))
}
