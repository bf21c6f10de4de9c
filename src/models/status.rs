//! # Status Machines
//!
//! Finite-state machines for every entity whose lifecycle the seating engine
//! drives. Each enum is persisted as upper-case text and exposes a single
//! transition function; status columns are never written any other way.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::SeatingError;

/// Lifecycle shared by all status enums.
pub trait StatusMachine: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Entity name reported in transition errors.
    const ENTITY: &'static str;

    /// Wire and database representation.
    fn as_str(&self) -> &'static str;

    /// Whether moving from `self` to `next` is a legal edge.
    fn can_transition_to(&self, next: Self) -> bool;

    /// Validate the edge `self -> next`, returning the new state.
    fn transition(self, next: Self) -> Result<Self, SeatingError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SeatingError::InvalidStateTransition {
                entity: Self::ENTITY,
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

macro_rules! status_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

/// Physical table state. OCCUPIED and RESERVED are derived from assignments.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    #[default]
    Available,
    #[sea_orm(string_value = "OCCUPIED")]
    Occupied,
    #[sea_orm(string_value = "RESERVED")]
    Reserved,
    #[sea_orm(string_value = "OUT_OF_ORDER")]
    OutOfOrder,
    #[sea_orm(string_value = "CLEANING")]
    Cleaning,
}

impl TableStatus {
    /// Statuses an operator may request directly; the rest follow assignments.
    pub fn is_maintenance(&self) -> bool {
        matches!(
            self,
            TableStatus::Available | TableStatus::Cleaning | TableStatus::OutOfOrder
        )
    }
}

impl StatusMachine for TableStatus {
    const ENTITY: &'static str = "table";

    fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "AVAILABLE",
            TableStatus::Occupied => "OCCUPIED",
            TableStatus::Reserved => "RESERVED",
            TableStatus::OutOfOrder => "OUT_OF_ORDER",
            TableStatus::Cleaning => "CLEANING",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use TableStatus::*;
        matches!(
            (self, next),
            (Available, Occupied)
                | (Available, Reserved)
                | (Available, Cleaning)
                | (Available, OutOfOrder)
                | (Occupied, Available)
                | (Reserved, Available)
                | (Cleaning, Available)
                | (OutOfOrder, Available)
        )
    }
}

/// Party lifecycle.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyStatus {
    #[sea_orm(string_value = "WAITING")]
    #[default]
    Waiting,
    #[sea_orm(string_value = "SEATED")]
    Seated,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl StatusMachine for PartyStatus {
    const ENTITY: &'static str = "party";

    fn as_str(&self) -> &'static str {
        match self {
            PartyStatus::Waiting => "WAITING",
            PartyStatus::Seated => "SEATED",
            PartyStatus::Finished => "FINISHED",
            PartyStatus::Cancelled => "CANCELLED",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use PartyStatus::*;
        // SEATED -> WAITING happens when an assignment is cancelled
        matches!(
            (self, next),
            (Waiting, Seated) | (Waiting, Cancelled) | (Seated, Finished) | (Seated, Waiting)
        )
    }
}

/// Reservation lifecycle.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[sea_orm(string_value = "PENDING")]
    #[default]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "NO_SHOW")]
    NoShow,
}

impl StatusMachine for ReservationStatus {
    const ENTITY: &'static str = "reservation";

    fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::NoShow => "NO_SHOW",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, NoShow)
        )
    }
}

/// Waiting list entry lifecycle.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitingListStatus {
    #[sea_orm(string_value = "WAITING")]
    #[default]
    Waiting,
    #[sea_orm(string_value = "SEATED")]
    Seated,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
}

impl StatusMachine for WaitingListStatus {
    const ENTITY: &'static str = "waiting_list_entry";

    fn as_str(&self) -> &'static str {
        match self {
            WaitingListStatus::Waiting => "WAITING",
            WaitingListStatus::Seated => "SEATED",
            WaitingListStatus::Cancelled => "CANCELLED",
            WaitingListStatus::Expired => "EXPIRED",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use WaitingListStatus::*;
        matches!(
            (self, next),
            (Waiting, Seated) | (Waiting, Cancelled) | (Waiting, Expired)
        )
    }
}

/// Lifecycle shared by table and reservation assignments.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    #[sea_orm(string_value = "ACTIVE")]
    #[default]
    Active,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl StatusMachine for AssignmentStatus {
    const ENTITY: &'static str = "assignment";

    fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "ACTIVE",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Cancelled => "CANCELLED",
        }
    }

    fn can_transition_to(&self, next: Self) -> bool {
        use AssignmentStatus::*;
        matches!((self, next), (Active, Completed) | (Active, Cancelled))
    }
}

status_display!(
    TableStatus,
    PartyStatus,
    ReservationStatus,
    WaitingListStatus,
    AssignmentStatus,
);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ActiveEnum, Iterable};

    fn legal_edges<S: StatusMachine + Iterable>() -> Vec<(S, S)> {
        let mut edges = Vec::new();
        for from in S::iter() {
            for to in S::iter() {
                if from.can_transition_to(to) {
                    edges.push((from, to));
                }
            }
        }
        edges
    }

    #[test]
    fn table_machine_only_leaves_available_through_listed_edges() {
        let edges = legal_edges::<TableStatus>();
        assert_eq!(edges.len(), 8);
        for (from, to) in edges {
            assert!(
                from == TableStatus::Available || to == TableStatus::Available,
                "unexpected edge {from} -> {to}"
            );
        }
    }

    #[test]
    fn party_cannot_skip_from_waiting_to_finished() {
        let err = PartyStatus::Waiting
            .transition(PartyStatus::Finished)
            .unwrap_err();
        match err {
            SeatingError::InvalidStateTransition { entity, from, to } => {
                assert_eq!(entity, "party");
                assert_eq!(from, "WAITING");
                assert_eq!(to, "FINISHED");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cancelled_assignment_returns_party_to_waiting() {
        assert_eq!(
            PartyStatus::Seated.transition(PartyStatus::Waiting).unwrap(),
            PartyStatus::Waiting
        );
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        for next in ReservationStatus::iter() {
            assert!(!ReservationStatus::Completed.can_transition_to(next));
            assert!(!ReservationStatus::NoShow.can_transition_to(next));
            assert!(!ReservationStatus::Cancelled.can_transition_to(next));
        }
        for next in WaitingListStatus::iter() {
            assert!(!WaitingListStatus::Seated.can_transition_to(next));
        }
        for next in AssignmentStatus::iter() {
            assert!(!AssignmentStatus::Completed.can_transition_to(next));
            assert!(!AssignmentStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn reservation_no_show_requires_confirmation() {
        assert!(
            ReservationStatus::Pending
                .transition(ReservationStatus::NoShow)
                .is_err()
        );
        assert!(
            ReservationStatus::Confirmed
                .transition(ReservationStatus::NoShow)
                .is_ok()
        );
    }

    #[test]
    fn database_and_wire_values_agree() {
        for status in TableStatus::iter() {
            assert_eq!(status.to_value(), status.as_str());
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
        for status in ReservationStatus::iter() {
            assert_eq!(status.to_value(), status.as_str());
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
    }

    #[test]
    fn only_maintenance_statuses_are_operator_settable() {
        assert!(TableStatus::Cleaning.is_maintenance());
        assert!(TableStatus::OutOfOrder.is_maintenance());
        assert!(!TableStatus::Occupied.is_maintenance());
        assert!(!TableStatus::Reserved.is_maintenance());
    }
}
