//! Restaurants and their floor sections.

use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::{page_limit, require_at_least_one, require_text};
use crate::error::SeatingError;
use crate::models::{restaurant, section};

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub max_capacity: i32,
}

#[derive(Debug, Clone)]
pub struct NewSection {
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
}

/// Partial update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
    pub max_capacity: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct SectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

/// Repository for restaurants and sections
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    db: DatabaseConnection,
}

impl RestaurantRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewRestaurant) -> Result<restaurant::Model, SeatingError> {
        let name = require_text("name", &input.name)?;
        require_at_least_one("max_capacity", input.max_capacity)?;
        check_hours(input.opening_time, input.closing_time)?;

        let now = Utc::now().fixed_offset();
        let created = restaurant::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            address: Set(input.address.trim().to_string()),
            phone: Set(input.phone.trim().to_string()),
            opening_time: Set(input.opening_time),
            closing_time: Set(input.closing_time),
            max_capacity: Set(input.max_capacity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(restaurant_id = %created.id, name = %created.name, "Restaurant created");
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<restaurant::Model, SeatingError> {
        restaurant::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("restaurant", id))
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: RestaurantUpdate,
    ) -> Result<restaurant::Model, SeatingError> {
        let existing = self.get(id).await?;
        check_hours(
            changes.opening_time.unwrap_or(existing.opening_time),
            changes.closing_time.unwrap_or(existing.closing_time),
        )?;

        let mut active_model: restaurant::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active_model.name = Set(require_text("name", &name)?);
        }
        if let Some(address) = changes.address {
            active_model.address = Set(address.trim().to_string());
        }
        if let Some(phone) = changes.phone {
            active_model.phone = Set(phone.trim().to_string());
        }
        if let Some(opening_time) = changes.opening_time {
            active_model.opening_time = Set(opening_time);
        }
        if let Some(closing_time) = changes.closing_time {
            active_model.closing_time = Set(closing_time);
        }
        if let Some(max_capacity) = changes.max_capacity {
            require_at_least_one("max_capacity", max_capacity)?;
            active_model.max_capacity = Set(max_capacity);
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(restaurant_id = %updated.id, "Restaurant updated");
        Ok(updated)
    }

    pub async fn list(
        &self,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<restaurant::Model>, SeatingError> {
        Ok(restaurant::Entity::find()
            .order_by_asc(restaurant::Column::Name)
            .order_by_asc(restaurant::Column::Id)
            .offset(offset.unwrap_or(0))
            .limit(page_limit(limit))
            .all(&self.db)
            .await?)
    }

    pub async fn create_section(
        &self,
        restaurant_id: Uuid,
        input: NewSection,
    ) -> Result<section::Model, SeatingError> {
        let name = require_text("name", &input.name)?;
        require_at_least_one("capacity", input.capacity)?;
        self.get(restaurant_id).await?;

        let now = Utc::now().fixed_offset();
        let created = section::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            name: Set(name),
            description: Set(input.description),
            capacity: Set(input.capacity),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(restaurant_id = %restaurant_id, section_id = %created.id, "Section created");
        Ok(created)
    }

    pub async fn get_section(&self, id: Uuid) -> Result<section::Model, SeatingError> {
        section::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| SeatingError::not_found("section", id))
    }

    pub async fn update_section(
        &self,
        id: Uuid,
        changes: SectionUpdate,
    ) -> Result<section::Model, SeatingError> {
        let mut active_model: section::ActiveModel = self.get_section(id).await?.into();
        if let Some(name) = changes.name {
            active_model.name = Set(require_text("name", &name)?);
        }
        if let Some(description) = changes.description {
            active_model.description = Set(Some(description));
        }
        if let Some(capacity) = changes.capacity {
            require_at_least_one("capacity", capacity)?;
            active_model.capacity = Set(capacity);
        }
        if let Some(is_active) = changes.is_active {
            active_model.is_active = Set(is_active);
        }
        active_model.updated_at = Set(Utc::now().fixed_offset());

        let updated = active_model.update(&self.db).await?;
        tracing::info!(section_id = %updated.id, "Section updated");
        Ok(updated)
    }

    pub async fn list_sections(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<section::Model>, SeatingError> {
        self.get(restaurant_id).await?;
        Ok(section::Entity::find()
            .filter(section::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(section::Column::Name)
            .all(&self.db)
            .await?)
    }
}

fn check_hours(opening_time: NaiveTime, closing_time: NaiveTime) -> Result<(), SeatingError> {
    if opening_time == closing_time {
        return Err(SeatingError::validation(
            "closing_time",
            "closing time must differ from opening time",
        ));
    }
    Ok(())
}
