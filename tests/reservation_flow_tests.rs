//! Reservation lifecycle through the seating engine.

mod test_utils;

use seating::engine::AssignReservation;
use seating::error::SeatingError;
use seating::models::{AssignmentStatus, PartyStatus, ReservationStatus, TableStatus};
use seating::repositories::{
    AssignmentRepository, PartyRepository, ReservationRepository, TableRepository,
};
use test_utils::{create_test_reservation, seed_floor, setup_engine};

#[tokio::test]
async fn confirming_creates_the_reservation_party() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 4)
        .await
        .unwrap();
    assert_eq!(booking.status, ReservationStatus::Pending);
    assert!(booking.party_id.is_none());

    let confirmed = engine.confirm_reservation(booking.id).await.unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    let party_id = confirmed.party_id.expect("party linked on confirmation");
    let party = PartyRepository::new(db).get(party_id).await.unwrap();
    assert_eq!(party.status, PartyStatus::Waiting);
    assert_eq!(party.size, 4);
    assert_eq!(party.name, "Okafor");

    let err = engine
        .confirm_reservation(booking.id)
        .await
        .expect_err("already confirmed");
    assert!(matches!(err, SeatingError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn held_table_is_reserved_until_the_party_is_seated() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 3)
        .await
        .unwrap();
    let confirmed = engine.confirm_reservation(booking.id).await.unwrap();

    let hold = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            floor.table.id,
            floor.server.id,
        ))
        .await
        .expect("confirmed reservation can hold a free table");
    assert_eq!(hold.status, AssignmentStatus::Active);

    let tables = TableRepository::new(db.clone());
    assert_eq!(
        tables.get(floor.table.id).await.unwrap().status,
        TableStatus::Reserved
    );

    let seated = engine
        .seat_reservation(hold.id, None)
        .await
        .expect("reserved party arrives");
    assert_eq!(seated.table_id, floor.table.id);
    assert_eq!(Some(seated.party_id), confirmed.party_id);
    assert_eq!(seated.server_id, floor.server.id);
    assert_eq!(seated.status, AssignmentStatus::Active);

    assert_eq!(
        tables.get(floor.table.id).await.unwrap().status,
        TableStatus::Occupied
    );
    let booking = ReservationRepository::new(db.clone())
        .get(booking.id)
        .await
        .unwrap();
    assert_eq!(booking.status, ReservationStatus::Completed);
    let hold = AssignmentRepository::new(db.clone())
        .get_reservation_assignment(hold.id)
        .await
        .unwrap();
    assert_eq!(hold.status, AssignmentStatus::Completed);
    assert!(hold.completed_at.is_some());
    let party = PartyRepository::new(db)
        .get(seated.party_id)
        .await
        .unwrap();
    assert_eq!(party.status, PartyStatus::Seated);
}

#[tokio::test]
async fn pending_reservation_cannot_hold_a_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2)
        .await
        .unwrap();

    let err = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            floor.table.id,
            floor.server.id,
        ))
        .await
        .expect_err("reservation still pending");
    assert!(matches!(err, SeatingError::ReservationNotConfirmed { .. }));

    let table = TableRepository::new(db).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);
}

#[tokio::test]
async fn a_reservation_holds_at_most_one_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let second_table = test_utils::create_test_table(&db, floor.restaurant.id, "2", 4)
        .await
        .unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2)
        .await
        .unwrap();
    engine.confirm_reservation(booking.id).await.unwrap();

    let hold = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            floor.table.id,
            floor.server.id,
        ))
        .await
        .unwrap();

    let err = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            second_table.id,
            floor.server.id,
        ))
        .await
        .expect_err("second hold for the same reservation");
    assert!(matches!(
        err,
        SeatingError::ReservationAlreadyAssigned { assignment_id, .. } if assignment_id == hold.id
    ));
}

#[tokio::test]
async fn cancelling_a_reservation_releases_its_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2)
        .await
        .unwrap();
    let confirmed = engine.confirm_reservation(booking.id).await.unwrap();
    let hold = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            floor.table.id,
            floor.server.id,
        ))
        .await
        .unwrap();

    let cancelled = engine.cancel_reservation(booking.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    let table = TableRepository::new(db.clone()).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);
    let hold = AssignmentRepository::new(db.clone())
        .get_reservation_assignment(hold.id)
        .await
        .unwrap();
    assert_eq!(hold.status, AssignmentStatus::Cancelled);
    let party = PartyRepository::new(db)
        .get(confirmed.party_id.unwrap())
        .await
        .unwrap();
    assert_eq!(party.status, PartyStatus::Cancelled);
}

#[tokio::test]
async fn no_show_requires_a_confirmed_reservation() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2)
        .await
        .unwrap();

    let err = engine
        .mark_no_show(booking.id)
        .await
        .expect_err("pending reservations cannot be no-shows");
    assert!(matches!(err, SeatingError::InvalidStateTransition { .. }));

    engine.confirm_reservation(booking.id).await.unwrap();
    let ended = engine.mark_no_show(booking.id).await.unwrap();
    assert_eq!(ended.status, ReservationStatus::NoShow);
}

#[tokio::test]
async fn dropping_a_hold_keeps_the_reservation_confirmed() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let booking = create_test_reservation(&db, floor.restaurant.id, 2)
        .await
        .unwrap();
    engine.confirm_reservation(booking.id).await.unwrap();
    let hold = engine
        .assign_reservation(AssignReservation::new(
            booking.id,
            floor.table.id,
            floor.server.id,
        ))
        .await
        .unwrap();

    let dropped = engine.cancel_reservation_assignment(hold.id).await.unwrap();
    assert_eq!(dropped.status, AssignmentStatus::Cancelled);

    let booking = ReservationRepository::new(db.clone())
        .get(booking.id)
        .await
        .unwrap();
    assert_eq!(booking.status, ReservationStatus::Confirmed);
    let table = TableRepository::new(db).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);

    let err = engine
        .seat_reservation(hold.id, None)
        .await
        .expect_err("cancelled hold cannot be seated");
    assert!(matches!(err, SeatingError::AssignmentNotActive { .. }));
}
