//! Reservation entity model
//!
//! A reservation may exist before its party does; `party_id` is filled in when
//! the reservation is confirmed.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use super::status::ReservationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub restaurant_id: Uuid,

    pub party_id: Option<Uuid>,

    pub customer_name: String,

    pub customer_phone: String,

    pub customer_email: Option<String>,

    pub special_requests: Option<String>,

    pub reservation_time: DateTimeWithTimeZone,

    pub party_size: i32,

    pub status: ReservationStatus,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant::Column::Id"
    )]
    Restaurant,
    #[sea_orm(
        belongs_to = "super::party::Entity",
        from = "Column::PartyId",
        to = "super::party::Column::Id"
    )]
    Party,
    #[sea_orm(has_many = "super::reservation_assignment::Entity")]
    ReservationAssignment,
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Party.def()
    }
}

impl Related<super::reservation_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReservationAssignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
