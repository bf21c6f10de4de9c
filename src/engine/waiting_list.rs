//! Walk-in queue: joining, leaving, and promotion to a table.

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tracing::instrument;
use uuid::Uuid;

use super::assignment::{AssignTable, assign_table_in, replay_table_assignment};
use super::availability::ensure_restaurant;
use super::{SeatingEngine, fetch_locked, record_rejection, set_status};
use crate::config::WaitingListConfig;
use crate::error::SeatingError;
use crate::models::{
    PartyStatus, StatusMachine, TableStatus, WaitingListStatus, dining_table, party,
    table_assignment, waiting_list_entry,
};

/// A walk-in asking to be put on the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWaitingListEntry {
    pub restaurant_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub party_size: i32,
    pub notes: Option<String>,
    /// Caller-provided estimate in minutes; computed when absent.
    pub estimated_wait_time: Option<i32>,
}

/// Arguments for seating a waiting-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteWaitingListEntry {
    pub entry_id: Uuid,
    pub table_id: Uuid,
    pub server_id: Uuid,
    pub idempotency_key: Option<String>,
}

impl PromoteWaitingListEntry {
    pub fn new(entry_id: Uuid, table_id: Uuid, server_id: Uuid) -> Self {
        Self {
            entry_id,
            table_id,
            server_id,
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key<S: Into<String>>(mut self, key: S) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

impl SeatingEngine {
    /// Put a walk-in on the list in WAITING state.
    #[instrument(
        skip_all,
        fields(restaurant_id = %request.restaurant_id, party_size = request.party_size)
    )]
    pub async fn add_to_waiting_list(
        &self,
        request: NewWaitingListEntry,
    ) -> Result<waiting_list_entry::Model, SeatingError> {
        validate_entry(&request, &self.waiting_list)?;
        ensure_restaurant(&self.db, request.restaurant_id).await?;

        let estimated_wait_time = match request.estimated_wait_time {
            Some(minutes) => Some(minutes),
            None => {
                self.estimate_wait_minutes(request.restaurant_id, request.party_size)
                    .await?
            }
        };

        let now = Utc::now().fixed_offset();
        let entry = waiting_list_entry::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(request.restaurant_id),
            party_id: Set(None),
            customer_name: Set(request.customer_name.trim().to_string()),
            customer_phone: Set(request.customer_phone.trim().to_string()),
            party_size: Set(request.party_size),
            request_time: Set(now),
            estimated_wait_time: Set(estimated_wait_time),
            status: Set(WaitingListStatus::Waiting),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        counter!("seating_waiting_list_joined_total").increment(1);
        tracing::info!(entry_id = %entry.id, ?estimated_wait_time, "Added to waiting list");
        Ok(entry)
    }

    /// Oldest entry still WAITING, if any.
    #[instrument(skip(self))]
    pub async fn next_waiting_entry(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Option<waiting_list_entry::Model>, SeatingError> {
        ensure_restaurant(&self.db, restaurant_id).await?;

        Ok(waiting_list_entry::Entity::find()
            .filter(waiting_list_entry::Column::RestaurantId.eq(restaurant_id))
            .filter(waiting_list_entry::Column::Status.eq(WaitingListStatus::Waiting))
            .order_by_asc(waiting_list_entry::Column::RequestTime)
            .order_by_asc(waiting_list_entry::Column::Id)
            .one(&self.db)
            .await?)
    }

    /// Minutes a party of `party_size` can expect to wait right now; `None`
    /// when no active table could ever seat it.
    pub async fn estimate_wait_minutes(
        &self,
        restaurant_id: Uuid,
        party_size: i32,
    ) -> Result<Option<i32>, SeatingError> {
        let tables = dining_table::Entity::find()
            .filter(dining_table::Column::RestaurantId.eq(restaurant_id))
            .filter(dining_table::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        Ok(estimate_wait(&tables, party_size, &self.waiting_list))
    }

    /// Seat a waiting-list entry: a party is created from the entry when it
    /// has none, the party is assigned to the table, and the entry becomes
    /// SEATED, all in one transaction.
    #[instrument(
        skip_all,
        fields(entry_id = %request.entry_id, table_id = %request.table_id, server_id = %request.server_id)
    )]
    pub async fn promote_waiting_list_entry(
        &self,
        request: PromoteWaitingListEntry,
    ) -> Result<table_assignment::Model, SeatingError> {
        let assignment = async {
            let txn = self.begin_write().await?;
            let assignment = promote_in(&txn, &request).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(assignment)
        }
        .await
        .map_err(|e| e.on_contention("table", request.table_id))
        .inspect_err(|e| record_rejection("promote_waiting_list_entry", e))?;

        counter!("seating_waiting_list_promoted_total").increment(1);
        tracing::info!(
            assignment_id = %assignment.id,
            party_id = %assignment.party_id,
            "Waiting list entry seated"
        );
        Ok(assignment)
    }

    #[instrument(skip(self))]
    pub async fn cancel_waiting_list_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<waiting_list_entry::Model, SeatingError> {
        self.end_waiting_list_entry(
            entry_id,
            WaitingListStatus::Cancelled,
            "cancel_waiting_list_entry",
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn expire_waiting_list_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<waiting_list_entry::Model, SeatingError> {
        self.end_waiting_list_entry(
            entry_id,
            WaitingListStatus::Expired,
            "expire_waiting_list_entry",
        )
        .await
    }

    async fn end_waiting_list_entry(
        &self,
        entry_id: Uuid,
        outcome: WaitingListStatus,
        operation: &'static str,
    ) -> Result<waiting_list_entry::Model, SeatingError> {
        let ended = async {
            let txn = self.begin_write().await?;
            let ended = end_entry_in(&txn, entry_id, outcome).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(ended)
        }
        .await
        .map_err(|e| e.on_contention("waiting_list_entry", entry_id))
        .inspect_err(|e| record_rejection(operation, e))?;

        tracing::info!(status = %ended.status, "Waiting list entry closed");
        Ok(ended)
    }
}

fn validate_entry(
    request: &NewWaitingListEntry,
    config: &WaitingListConfig,
) -> Result<(), SeatingError> {
    if request.customer_name.trim().is_empty() {
        return Err(SeatingError::validation(
            "customer_name",
            "customer name must not be empty",
        ));
    }
    if request.party_size < 1 || request.party_size > config.max_party_size {
        return Err(SeatingError::validation(
            "party_size",
            format!("party size must be between 1 and {}", config.max_party_size),
        ));
    }
    if request.estimated_wait_time.is_some_and(|minutes| minutes < 0) {
        return Err(SeatingError::validation(
            "estimated_wait_time",
            "estimated wait must not be negative",
        ));
    }
    Ok(())
}

/// Rough wait estimate in minutes: nothing when no table could ever seat the
/// party, zero when one is free now, otherwise the share of busy tables
/// scaled to the time a full house takes to turn over.
pub(super) fn estimate_wait(
    tables: &[dining_table::Model],
    party_size: i32,
    config: &WaitingListConfig,
) -> Option<i32> {
    if !tables.iter().any(|t| t.capacity >= party_size) {
        return None;
    }
    if tables
        .iter()
        .any(|t| t.status == TableStatus::Available && t.capacity >= party_size)
    {
        return Some(0);
    }

    let busy = tables
        .iter()
        .filter(|t| matches!(t.status, TableStatus::Occupied | TableStatus::Reserved))
        .count();
    let rate = busy as f64 / tables.len() as f64;
    Some((rate * f64::from(config.minutes_per_full_house)).round() as i32)
}

async fn promote_in<C: ConnectionTrait>(
    conn: &C,
    request: &PromoteWaitingListEntry,
) -> Result<table_assignment::Model, SeatingError> {
    if let Some(key) = request.idempotency_key.as_deref()
        && let Some(existing) =
            replay_table_assignment(conn, key, request.table_id, None, request.server_id).await?
    {
        let entry = fetch_locked::<waiting_list_entry::Entity, _>(
            conn,
            "waiting_list_entry",
            request.entry_id,
        )
        .await?;
        if entry.party_id != Some(existing.party_id) {
            return Err(SeatingError::IdempotencyMismatch {
                key: key.to_string(),
            });
        }
        return Ok(existing);
    }

    fetch_locked::<dining_table::Entity, _>(conn, "table", request.table_id).await?;
    let entry =
        fetch_locked::<waiting_list_entry::Entity, _>(conn, "waiting_list_entry", request.entry_id)
            .await?;
    entry.status.transition(WaitingListStatus::Seated)?;

    let party_id = match entry.party_id {
        Some(party_id) => party_id,
        None => {
            let now = Utc::now().fixed_offset();
            let created = party::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(entry.customer_name.clone()),
                size: Set(entry.party_size),
                phone: Set(Some(entry.customer_phone.clone())),
                email: Set(None),
                status: Set(PartyStatus::Waiting),
                arrival_time: Set(entry.request_time),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;

            let linked = waiting_list_entry::Entity::update_many()
                .col_expr(waiting_list_entry::Column::PartyId, Expr::value(created.id))
                .col_expr(waiting_list_entry::Column::UpdatedAt, Expr::value(now))
                .filter(waiting_list_entry::Column::Id.eq(entry.id))
                .filter(waiting_list_entry::Column::PartyId.is_null())
                .exec(conn)
                .await?;
            if linked.rows_affected == 0 {
                return Err(SeatingError::ConcurrentConflict {
                    entity: "waiting_list_entry",
                    id: entry.id,
                });
            }
            tracing::debug!(party_id = %created.id, "Created party for waiting list entry");
            created.id
        }
    };

    let assign = AssignTable {
        table_id: request.table_id,
        party_id,
        server_id: request.server_id,
        idempotency_key: request.idempotency_key.clone(),
        notes: entry.notes.clone(),
    };
    let assignment = assign_table_in(conn, &assign).await?;

    set_status::<waiting_list_entry::Entity, _>(
        conn,
        entry.id,
        entry.status,
        WaitingListStatus::Seated,
    )
    .await?;

    Ok(assignment)
}

async fn end_entry_in<C: ConnectionTrait>(
    conn: &C,
    entry_id: Uuid,
    outcome: WaitingListStatus,
) -> Result<waiting_list_entry::Model, SeatingError> {
    let entry =
        fetch_locked::<waiting_list_entry::Entity, _>(conn, "waiting_list_entry", entry_id).await?;
    set_status::<waiting_list_entry::Entity, _>(conn, entry.id, entry.status, outcome).await?;

    if let Some(party_id) = entry.party_id {
        let linked = fetch_locked::<party::Entity, _>(conn, "party", party_id).await?;
        if linked.status == PartyStatus::Waiting {
            set_status::<party::Entity, _>(conn, linked.id, linked.status, PartyStatus::Cancelled)
                .await?;
        }
    }

    waiting_list_entry::Entity::find_by_id(entry.id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("waiting_list_entry", entry.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WaitingListConfig {
        WaitingListConfig {
            minutes_per_full_house: 60,
            max_party_size: 50,
        }
    }

    fn table(capacity: i32, status: TableStatus) -> dining_table::Model {
        let now = Utc::now().fixed_offset();
        dining_table::Model {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::nil(),
            table_number: "1".to_string(),
            capacity,
            location: "main".to_string(),
            is_active: true,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn no_estimate_without_a_fitting_table() {
        assert_eq!(estimate_wait(&[], 2, &config()), None);
        assert_eq!(
            estimate_wait(&[table(2, TableStatus::Available)], 6, &config()),
            None
        );
    }

    #[test]
    fn free_fitting_table_means_no_wait() {
        let tables = [
            table(2, TableStatus::Occupied),
            table(4, TableStatus::Available),
        ];
        assert_eq!(estimate_wait(&tables, 4, &config()), Some(0));
    }

    #[test]
    fn busy_share_scales_the_estimate() {
        let tables = [
            table(4, TableStatus::Occupied),
            table(4, TableStatus::Reserved),
            table(4, TableStatus::Cleaning),
            table(2, TableStatus::Available),
        ];
        assert_eq!(estimate_wait(&tables, 4, &config()), Some(30));
    }

    #[test]
    fn party_size_is_bounded() {
        let mut request = NewWaitingListEntry {
            restaurant_id: Uuid::nil(),
            customer_name: "Lee".to_string(),
            customer_phone: "555-0100".to_string(),
            party_size: 0,
            notes: None,
            estimated_wait_time: None,
        };
        assert!(matches!(
            validate_entry(&request, &config()),
            Err(SeatingError::Validation { field: "party_size", .. })
        ));
        request.party_size = 51;
        assert!(validate_entry(&request, &config()).is_err());
        request.party_size = 4;
        assert!(validate_entry(&request, &config()).is_ok());
    }
}
