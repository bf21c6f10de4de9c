use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::{require_at_least_one, require_text};
use crate::error::SeatingError;
use crate::models::{WaitingListStatus, waiting_list_entry};

/// Partial update of an entry's contact details, size, quote or notes.
#[derive(Debug, Clone, Default)]
pub struct WaitingListUpdate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub party_size: Option<i32>,
    pub estimated_wait_time: Option<i32>,
    pub notes: Option<String>,
}

/// Waiting list entries. Entries are created and moved through their
/// lifecycle by the seating engine; this repository reads them and edits
/// their descriptive fields.
#[derive(Debug, Clone)]
pub struct WaitingListRepository {
    db: DatabaseConnection,
}

impl WaitingListRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<waiting_list_entry::Model, SeatingError> {
        waiting_list_entry::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("waiting_list_entry", id))
    }

    /// Edit an entry that is still WAITING. Its position in the queue is kept.
    pub async fn update(
        &self,
        id: Uuid,
        changes: WaitingListUpdate,
    ) -> Result<waiting_list_entry::Model, SeatingError> {
        let existing = self.get(id).await?;
        if existing.status != WaitingListStatus::Waiting {
            return Err(SeatingError::validation(
                "status",
                format!("only WAITING entries can be edited, entry is {}", existing.status),
            ));
        }

        let mut active_model: waiting_list_entry::ActiveModel = existing.into();
        if let Some(customer_name) = changes.customer_name {
            active_model.customer_name = Set(require_text("customer_name", &customer_name)?);
        }
        if let Some(customer_phone) = changes.customer_phone {
            active_model.customer_phone = Set(customer_phone.trim().to_string());
        }
        if let Some(party_size) = changes.party_size {
            require_at_least_one("party_size", party_size)?;
            active_model.party_size = Set(party_size);
        }
        if let Some(minutes) = changes.estimated_wait_time {
            if minutes < 0 {
                return Err(SeatingError::validation(
                    "estimated_wait_time",
                    "estimated wait must not be negative",
                ));
            }
            active_model.estimated_wait_time = Set(Some(minutes));
        }
        if let Some(notes) = changes.notes {
            active_model.notes = Set(Some(notes));
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(entry_id = %updated.id, "Waiting list entry updated");
        Ok(updated)
    }

    /// Entries of a restaurant, oldest request first.
    pub async fn list(
        &self,
        restaurant_id: Uuid,
        status: Option<WaitingListStatus>,
    ) -> Result<Vec<waiting_list_entry::Model>, SeatingError> {
        let mut query = waiting_list_entry::Entity::find()
            .filter(waiting_list_entry::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(waiting_list_entry::Column::RequestTime)
            .order_by_asc(waiting_list_entry::Column::Id);

        if let Some(status) = status {
            query = query.filter(waiting_list_entry::Column::Status.eq(status));
        }

        Ok(query.all(&self.db).await?)
    }
}
