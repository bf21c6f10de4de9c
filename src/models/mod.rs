//! # Data Models
//!
//! SeaORM entities for the seating service together with the status machines
//! that govern their lifecycles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod dining_table;
pub mod party;
pub mod reservation;
pub mod reservation_assignment;
pub mod restaurant;
pub mod section;
pub mod server;
pub mod status;
pub mod table_assignment;
pub mod table_section;
pub mod waiting_list_entry;

pub use dining_table::Entity as DiningTable;
pub use party::Entity as Party;
pub use reservation::Entity as Reservation;
pub use reservation_assignment::Entity as ReservationAssignment;
pub use restaurant::Entity as Restaurant;
pub use section::Entity as Section;
pub use server::Entity as Server;
pub use table_assignment::Entity as TableAssignment;
pub use table_section::Entity as TableSection;
pub use waiting_list_entry::Entity as WaitingListEntry;

pub use status::{
    AssignmentStatus, PartyStatus, ReservationStatus, StatusMachine, TableStatus,
    WaitingListStatus,
};

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "seating".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
