//! Party-level operations that are not driven by an assignment.

use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::instrument;
use uuid::Uuid;

use super::{SeatingEngine, fetch_locked, record_rejection, set_status};
use crate::error::SeatingError;
use crate::models::{PartyStatus, party};

impl SeatingEngine {
    /// A waiting party gives up. Seated parties leave through their
    /// assignment instead.
    #[instrument(skip(self))]
    pub async fn cancel_party(&self, party_id: Uuid) -> Result<party::Model, SeatingError> {
        let cancelled = async {
            let txn = self.begin_write().await?;
            let cancelled = cancel_party_in(&txn, party_id).await?;
            txn.commit().await?;
            Ok::<_, SeatingError>(cancelled)
        }
        .await
        .map_err(|e| e.on_contention("party", party_id))
        .inspect_err(|e| record_rejection("cancel_party", e))?;

        tracing::info!("Party cancelled");
        Ok(cancelled)
    }
}

async fn cancel_party_in<C: ConnectionTrait>(
    conn: &C,
    party_id: Uuid,
) -> Result<party::Model, SeatingError> {
    let current = fetch_locked::<party::Entity, _>(conn, "party", party_id).await?;
    set_status::<party::Entity, _>(conn, current.id, current.status, PartyStatus::Cancelled)
        .await?;
    party::Entity::find_by_id(current.id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("party", current.id))
}
