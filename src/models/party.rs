//! Party entity model
//!
//! A group of guests tracked as one unit from arrival to departure.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use super::status::PartyStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "parties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Number of guests, always >= 1
    pub size: i32,

    pub phone: Option<String>,

    pub email: Option<String>,

    pub status: PartyStatus,

    pub arrival_time: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::table_assignment::Entity")]
    TableAssignment,
}

impl Related<super::table_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
