//! # Repository Layer
//!
//! Entity store operations over SeaORM: create, get, partial updates and
//! filtered listings for every seating entity. Repositories never write status
//! columns; those belong to the [`crate::engine::SeatingEngine`].

pub mod assignment;
pub mod party;
pub mod reservation;
pub mod restaurant;
pub mod server;
pub mod table;
pub mod waiting_list;

pub use assignment::{AssignmentFilter, AssignmentRepository};
pub use party::{NewParty, PartyRepository, PartyUpdate};
pub use reservation::{NewReservation, ReservationRepository, ReservationUpdate};
pub use restaurant::{
    NewRestaurant, NewSection, RestaurantRepository, RestaurantUpdate, SectionUpdate,
};
pub use server::{NewServer, ServerRepository, ServerUpdate};
pub use table::{NewTable, TableFilter, TableRepository, TableUpdate};
pub use waiting_list::{WaitingListRepository, WaitingListUpdate};

use crate::error::SeatingError;

/// Default and maximum page size for listings.
pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 500;

fn require_at_least_one(field: &'static str, value: i32) -> Result<(), SeatingError> {
    if value < 1 {
        return Err(SeatingError::validation(field, "must be at least 1"));
    }
    Ok(())
}

fn require_text(field: &'static str, value: &str) -> Result<String, SeatingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SeatingError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn page_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}
