//! Dining table entity model
//!
//! `status` is a cached projection of assignment state plus the operator-set
//! maintenance states; only the seating engine writes it.

use std::cmp::Ordering;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use super::status::TableStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "dining_tables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub restaurant_id: Uuid,

    /// Human-facing table number, unique within a restaurant ("12", "P3")
    pub table_number: String,

    pub capacity: i32,

    pub location: String,

    /// False once the table has been retired
    pub is_active: bool,

    pub status: TableStatus,

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
    #[sea_orm(has_many = "super::table_section::Entity")]
    TableSection,
    #[sea_orm(has_many = "super::table_assignment::Entity")]
    TableAssignment,
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::table_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableAssignment.def()
    }
}

impl Related<super::section::Entity> for Entity {
    fn to() -> RelationDef {
        super::table_section::Relation::Section.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::table_section::Relation::DiningTable.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Purely numeric table numbers sort numerically ("2" < "10") and ahead of
/// anything else, which sorts lexically.
pub fn compare_table_numbers(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Floor-plan order shared by every table listing.
pub fn sort_by_table_number(tables: &mut [Model]) {
    tables.sort_by(|a, b| {
        compare_table_numbers(&a.table_number, &b.table_number).then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_numbers_sort_numerically_first() {
        let mut numbers = vec!["10", "P1", "2", "1", "B"];
        numbers.sort_by(|a, b| compare_table_numbers(a, b));
        assert_eq!(numbers, vec!["1", "2", "10", "B", "P1"]);
    }
}
