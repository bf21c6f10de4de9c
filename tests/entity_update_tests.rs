//! Partial updates through the entity store and filtered table listings.

mod test_utils;

use chrono::NaiveTime;
use seating::engine::{AssignReservation, AssignTable, NewWaitingListEntry};
use seating::error::SeatingError;
use seating::models::{PartyStatus, ReservationStatus, TableStatus, WaitingListStatus};
use seating::repositories::{
    NewSection, PartyRepository, PartyUpdate, ReservationRepository, ReservationUpdate,
    RestaurantRepository, RestaurantUpdate, SectionUpdate, TableFilter, TableRepository,
    TableUpdate, WaitingListRepository, WaitingListUpdate,
};
use test_utils::{
    create_test_party, create_test_reservation, create_test_table, seed_floor, setup_engine,
};

#[tokio::test]
async fn table_listing_uses_floor_plan_order_and_section_filter() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let ten = create_test_table(&db, floor.restaurant.id, "10", 6).await.unwrap();
    let two = create_test_table(&db, floor.restaurant.id, "2", 4).await.unwrap();
    let patio = create_test_table(&db, floor.restaurant.id, "P1", 8).await.unwrap();

    let tables = TableRepository::new(db.clone());
    let listed = tables
        .list(floor.restaurant.id, TableFilter::default())
        .await
        .unwrap();
    let numbers: Vec<_> = listed.iter().map(|t| t.table_number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "10", "P1"]);

    let terrace = RestaurantRepository::new(db.clone())
        .create_section(
            floor.restaurant.id,
            NewSection {
                name: "Terrace".to_string(),
                description: None,
                capacity: 20,
            },
        )
        .await
        .unwrap();
    tables.link_section(patio.id, terrace.id).await.unwrap();
    tables.link_section(ten.id, terrace.id).await.unwrap();

    let in_section = tables
        .list(
            floor.restaurant.id,
            TableFilter {
                section_id: Some(terrace.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<_> = in_section.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![ten.id, patio.id]);
    assert!(!ids.contains(&two.id));
}

#[tokio::test]
async fn table_update_changes_fields_but_not_status() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 4).await.unwrap();
    engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .unwrap();

    let tables = TableRepository::new(db.clone());
    let updated = tables
        .update(
            floor.table.id,
            TableUpdate {
                table_number: Some("1A".to_string()),
                capacity: Some(6),
                location: Some("Window".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.table_number, "1A");
    assert_eq!(updated.capacity, 6);
    assert_eq!(updated.location, "Window");
    assert_eq!(updated.status, TableStatus::Occupied);

    let err = tables
        .update(
            floor.table.id,
            TableUpdate {
                capacity: Some(2),
                ..Default::default()
            },
        )
        .await
        .expect_err("a party of 4 is seated");
    assert!(matches!(err, SeatingError::Validation { field: "capacity", .. }));
}

#[tokio::test]
async fn seated_party_cannot_outgrow_its_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 2).await.unwrap();
    let parties = PartyRepository::new(db.clone());

    let renamed = parties
        .update(
            party.id,
            PartyUpdate {
                name: Some("Silva".to_string()),
                size: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Silva");
    assert_eq!(renamed.size, 3);
    assert_eq!(renamed.status, PartyStatus::Waiting);

    engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .unwrap();
    let err = parties
        .update(
            party.id,
            PartyUpdate {
                size: Some(5),
                ..Default::default()
            },
        )
        .await
        .expect_err("table seats 4");
    assert!(matches!(
        err,
        SeatingError::CapacityExceeded {
            party_size: 5,
            capacity: 4
        }
    ));
    assert_eq!(parties.get(party.id).await.unwrap().size, 3);
}

#[tokio::test]
async fn reservation_update_respects_the_held_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2).await.unwrap();
    let reservations = ReservationRepository::new(db.clone());

    let updated = reservations
        .update(
            booking.id,
            ReservationUpdate {
                special_requests: Some("High chair".to_string()),
                party_size: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.special_requests.as_deref(), Some("High chair"));
    assert_eq!(updated.party_size, 3);
    assert_eq!(updated.status, ReservationStatus::Pending);

    engine.confirm_reservation(booking.id).await.unwrap();
    engine
        .assign_reservation(AssignReservation::new(booking.id, floor.table.id, floor.server.id))
        .await
        .unwrap();
    let err = reservations
        .update(
            booking.id,
            ReservationUpdate {
                party_size: Some(6),
                ..Default::default()
            },
        )
        .await
        .expect_err("held table seats 4");
    assert!(matches!(err, SeatingError::CapacityExceeded { .. }));
}

#[tokio::test]
async fn only_waiting_entries_can_be_edited() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let entry = engine
        .add_to_waiting_list(NewWaitingListEntry {
            restaurant_id: floor.restaurant.id,
            customer_name: "Haddad".to_string(),
            customer_phone: String::new(),
            party_size: 2,
            notes: None,
            estimated_wait_time: Some(10),
        })
        .await
        .unwrap();
    let entries = WaitingListRepository::new(db.clone());

    let updated = entries
        .update(
            entry.id,
            WaitingListUpdate {
                party_size: Some(3),
                estimated_wait_time: Some(25),
                notes: Some("Booth if possible".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.party_size, 3);
    assert_eq!(updated.estimated_wait_time, Some(25));
    assert_eq!(updated.request_time, entry.request_time);
    assert_eq!(updated.status, WaitingListStatus::Waiting);

    let err = entries
        .update(
            entry.id,
            WaitingListUpdate {
                estimated_wait_time: Some(-1),
                ..Default::default()
            },
        )
        .await
        .expect_err("negative quote");
    assert!(matches!(err, SeatingError::Validation { field: "estimated_wait_time", .. }));

    engine.cancel_waiting_list_entry(entry.id).await.unwrap();
    let err = entries
        .update(
            entry.id,
            WaitingListUpdate {
                notes: Some("too late".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("cancelled entries are closed");
    assert!(matches!(err, SeatingError::Validation { field: "status", .. }));
}

#[tokio::test]
async fn restaurant_and_section_updates_are_partial() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let restaurants = RestaurantRepository::new(db.clone());

    let updated = restaurants
        .update(
            floor.restaurant.id,
            RestaurantUpdate {
                closing_time: NaiveTime::from_hms_opt(22, 0, 0),
                max_capacity: Some(60),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, floor.restaurant.name);
    assert_eq!(updated.max_capacity, 60);

    let err = restaurants
        .update(
            floor.restaurant.id,
            RestaurantUpdate {
                closing_time: Some(updated.opening_time),
                ..Default::default()
            },
        )
        .await
        .expect_err("opening equals closing");
    assert!(matches!(err, SeatingError::Validation { field: "closing_time", .. }));

    let bar = restaurants
        .create_section(
            floor.restaurant.id,
            NewSection {
                name: "Bar".to_string(),
                description: None,
                capacity: 10,
            },
        )
        .await
        .unwrap();
    let closed = restaurants
        .update_section(
            bar.id,
            SectionUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!closed.is_active);
    assert_eq!(restaurants.get_section(bar.id).await.unwrap().name, "Bar");
}
