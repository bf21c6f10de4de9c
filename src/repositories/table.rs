//! Dining tables and their section links.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{require_at_least_one, require_text};
use crate::error::{SeatingError, is_unique_violation};
use crate::models::{
    AssignmentStatus, TableStatus, dining_table, party, restaurant, section, table_assignment,
    table_section,
};

#[derive(Debug, Clone)]
pub struct NewTable {
    pub table_number: String,
    pub capacity: i32,
    pub location: String,
    /// Sections to tag the table with; each must belong to the same restaurant.
    pub section_ids: Vec<Uuid>,
}

/// Partial update of a table's descriptive fields. Status and activity are
/// owned by the seating engine.
#[derive(Debug, Clone, Default)]
pub struct TableUpdate {
    pub table_number: Option<String>,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

/// Listing filter for [`TableRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    pub status: Option<TableStatus>,
    /// Only tables tagged with this section
    pub section_id: Option<Uuid>,
    /// Include retired tables
    pub include_inactive: bool,
}

/// Repository for dining tables
#[derive(Debug, Clone)]
pub struct TableRepository {
    db: DatabaseConnection,
}

impl TableRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an AVAILABLE table and link it to the requested sections.
    pub async fn create(
        &self,
        restaurant_id: Uuid,
        input: NewTable,
    ) -> Result<dining_table::Model, SeatingError> {
        let table_number = require_text("table_number", &input.table_number)?;
        require_at_least_one("capacity", input.capacity)?;

        let txn = self.db.begin().await?;
        restaurant::Entity::find_by_id(restaurant_id)
            .one(&txn)
            .await?
            .ok_or_else(|| SeatingError::not_found("restaurant", restaurant_id))?;

        let now = Utc::now().fixed_offset();
        let created = dining_table::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            table_number: Set(table_number),
            capacity: Set(input.capacity),
            location: Set(input.location.trim().to_string()),
            is_active: Set(true),
            status: Set(TableStatus::Available),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SeatingError::validation("table_number", "table number already in use")
            } else {
                SeatingError::Database(e)
            }
        })?;

        for section_id in input.section_ids {
            link(&txn, &created, section_id).await?;
        }
        txn.commit().await?;

        tracing::info!(
            restaurant_id = %restaurant_id,
            table_id = %created.id,
            table_number = %created.table_number,
            capacity = created.capacity,
            "Table created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<dining_table::Model, SeatingError> {
        dining_table::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("table", id))
    }

    /// Tables of a restaurant in floor-plan order, narrowed by `filter`.
    pub async fn list(
        &self,
        restaurant_id: Uuid,
        filter: TableFilter,
    ) -> Result<Vec<dining_table::Model>, SeatingError> {
        let mut query = dining_table::Entity::find()
            .filter(dining_table::Column::RestaurantId.eq(restaurant_id));

        if let Some(status) = filter.status {
            query = query.filter(dining_table::Column::Status.eq(status));
        }
        if let Some(section_id) = filter.section_id {
            query = query
                .join(JoinType::InnerJoin, dining_table::Relation::TableSection.def())
                .filter(table_section::Column::SectionId.eq(section_id));
        }
        if !filter.include_inactive {
            query = query.filter(dining_table::Column::IsActive.eq(true));
        }

        let mut tables = query.all(&self.db).await?;
        dining_table::sort_by_table_number(&mut tables);
        Ok(tables)
    }

    /// Change a table's number, capacity or location. Shrinking a table below
    /// the party currently seated at it is refused.
    pub async fn update(
        &self,
        id: Uuid,
        changes: TableUpdate,
    ) -> Result<dining_table::Model, SeatingError> {
        let existing = self.get(id).await?;

        let mut active_model: dining_table::ActiveModel = existing.clone().into();
        if let Some(table_number) = changes.table_number {
            active_model.table_number = Set(require_text("table_number", &table_number)?);
        }
        if let Some(capacity) = changes.capacity {
            require_at_least_one("capacity", capacity)?;
            if let Some(seated) = seated_party_size(&self.db, existing.id).await?
                && seated > capacity
            {
                return Err(SeatingError::validation(
                    "capacity",
                    format!("a party of {seated} is seated at this table"),
                ));
            }
            active_model.capacity = Set(capacity);
        }
        if let Some(location) = changes.location {
            active_model.location = Set(location.trim().to_string());
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                SeatingError::validation("table_number", "table number already in use")
            } else {
                SeatingError::Database(e)
            }
        })?;
        tracing::info!(table_id = %updated.id, capacity = updated.capacity, "Table updated");
        Ok(updated)
    }

    /// Tag a table with a section. Linking twice is a no-op.
    pub async fn link_section(
        &self,
        table_id: Uuid,
        section_id: Uuid,
    ) -> Result<table_section::Model, SeatingError> {
        let txn = self.db.begin().await?;
        let table = dining_table::Entity::find_by_id(table_id)
            .one(&txn)
            .await?
            .ok_or_else(|| SeatingError::not_found("table", table_id))?;
        let linked = link(&txn, &table, section_id).await?;
        txn.commit().await?;
        Ok(linked)
    }

    pub async fn sections_of(&self, table_id: Uuid) -> Result<Vec<section::Model>, SeatingError> {
        let table = self.get(table_id).await?;
        Ok(table
            .find_related(section::Entity)
            .order_by_asc(section::Column::Name)
            .all(&self.db)
            .await?)
    }
}

async fn seated_party_size<C: ConnectionTrait>(
    conn: &C,
    table_id: Uuid,
) -> Result<Option<i32>, SeatingError> {
    let Some(active) = table_assignment::Entity::find()
        .filter(table_assignment::Column::TableId.eq(table_id))
        .filter(table_assignment::Column::Status.eq(AssignmentStatus::Active))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    Ok(party::Entity::find_by_id(active.party_id)
        .one(conn)
        .await?
        .map(|party| party.size))
}

async fn link<C: ConnectionTrait>(
    conn: &C,
    table: &dining_table::Model,
    section_id: Uuid,
) -> Result<table_section::Model, SeatingError> {
    let section = section::Entity::find_by_id(section_id)
        .one(conn)
        .await?
        .ok_or_else(|| SeatingError::not_found("section", section_id))?;
    if section.restaurant_id != table.restaurant_id {
        return Err(SeatingError::validation(
            "section_id",
            "section belongs to a different restaurant",
        ));
    }

    if let Some(existing) = table_section::Entity::find()
        .filter(table_section::Column::TableId.eq(table.id))
        .filter(table_section::Column::SectionId.eq(section.id))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }

    let linked = table_section::ActiveModel {
        id: Set(Uuid::new_v4()),
        table_id: Set(table.id),
        section_id: Set(section.id),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(conn)
    .await?;

    tracing::debug!(table_id = %table.id, section_id = %section.id, "Table linked to section");
    Ok(linked)
}
