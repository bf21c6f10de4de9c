use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, prelude::DateTimeWithTimeZone,
};
use uuid::Uuid;

use super::{page_limit, require_at_least_one, require_text};
use crate::error::SeatingError;
use crate::models::{AssignmentStatus, PartyStatus, dining_table, party, table_assignment};

#[derive(Debug, Clone)]
pub struct NewParty {
    pub name: String,
    pub size: i32,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Defaults to now.
    pub arrival_time: Option<DateTimeWithTimeZone>,
}

/// Partial update of a party's contact details and size.
#[derive(Debug, Clone, Default)]
pub struct PartyUpdate {
    pub name: Option<String>,
    pub size: Option<i32>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Repository for parties
#[derive(Debug, Clone)]
pub struct PartyRepository {
    db: DatabaseConnection,
}

impl PartyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a party; it starts out WAITING.
    pub async fn create(&self, input: NewParty) -> Result<party::Model, SeatingError> {
        let name = require_text("name", &input.name)?;
        require_at_least_one("size", input.size)?;

        let now = Utc::now().fixed_offset();
        let created = party::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            size: Set(input.size),
            phone: Set(input.phone),
            email: Set(input.email),
            status: Set(PartyStatus::Waiting),
            arrival_time: Set(input.arrival_time.unwrap_or(now)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(party_id = %created.id, size = created.size, "Party registered");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<party::Model, SeatingError> {
        party::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("party", id))
    }

    /// Apply a partial update. A seated party cannot grow past the table it
    /// sits at.
    pub async fn update(&self, id: Uuid, changes: PartyUpdate) -> Result<party::Model, SeatingError> {
        let existing = self.get(id).await?;

        if let Some(size) = changes.size {
            require_at_least_one("size", size)?;
            if existing.status == PartyStatus::Seated
                && let Some(capacity) = seated_table_capacity(&self.db, existing.id).await?
                && size > capacity
            {
                return Err(SeatingError::CapacityExceeded {
                    party_size: size,
                    capacity,
                });
            }
        }

        let mut active_model: party::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active_model.name = Set(require_text("name", &name)?);
        }
        if let Some(size) = changes.size {
            active_model.size = Set(size);
        }
        if let Some(phone) = changes.phone {
            active_model.phone = Set(Some(phone));
        }
        if let Some(email) = changes.email {
            active_model.email = Set(Some(email));
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(party_id = %updated.id, size = updated.size, "Party updated");
        Ok(updated)
    }

    pub async fn list(
        &self,
        status: Option<PartyStatus>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<party::Model>, SeatingError> {
        let mut query = party::Entity::find().order_by_asc(party::Column::ArrivalTime);
        if let Some(status) = status {
            query = query.filter(party::Column::Status.eq(status));
        }

        Ok(query
            .offset(offset.unwrap_or(0))
            .limit(page_limit(limit))
            .all(&self.db)
            .await?)
    }
}

async fn seated_table_capacity(
    db: &DatabaseConnection,
    party_id: Uuid,
) -> Result<Option<i32>, SeatingError> {
    let Some(active) = table_assignment::Entity::find()
        .filter(table_assignment::Column::PartyId.eq(party_id))
        .filter(table_assignment::Column::Status.eq(AssignmentStatus::Active))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Ok(dining_table::Entity::find_by_id(active.table_id)
        .one(db)
        .await?
        .map(|table| table.capacity))
}
