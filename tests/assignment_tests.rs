//! Seating engine: assigning parties to tables and closing assignments.

mod test_utils;

use seating::engine::AssignTable;
use seating::error::SeatingError;
use seating::models::{AssignmentStatus, PartyStatus, TableStatus};
use seating::repositories::{PartyRepository, ServerRepository, ServerUpdate, TableRepository};
use test_utils::{
    create_test_party, create_test_table, seed_floor, setup_engine, setup_file_engine,
};

#[tokio::test]
async fn assign_table_seats_party_and_occupies_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 4).await.unwrap();

    let assignment = engine
        .assign_table(
            AssignTable::new(floor.table.id, party.id, floor.server.id).with_notes("window seat"),
        )
        .await
        .expect("party of 4 fits a 4-top");

    assert_eq!(assignment.status, AssignmentStatus::Active);
    assert_eq!(assignment.table_id, floor.table.id);
    assert_eq!(assignment.party_id, party.id);
    assert!(assignment.completed_at.is_none());
    assert_eq!(assignment.notes.as_deref(), Some("window seat"));

    let table = TableRepository::new(db.clone()).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    let party = PartyRepository::new(db.clone()).get(party.id).await.unwrap();
    assert_eq!(party.status, PartyStatus::Seated);
}

#[tokio::test]
async fn oversized_party_is_rejected_without_side_effects() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 2).await.unwrap();
    let party = create_test_party(&db, 5).await.unwrap();

    let err = engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .expect_err("party of 5 cannot sit at a 2-top");
    assert!(matches!(
        err,
        SeatingError::CapacityExceeded {
            party_size: 5,
            capacity: 2
        }
    ));

    let table = TableRepository::new(db.clone()).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);
    let party = PartyRepository::new(db.clone()).get(party.id).await.unwrap();
    assert_eq!(party.status, PartyStatus::Waiting);
}

#[tokio::test]
async fn occupied_table_cannot_be_assigned_again() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let first = create_test_party(&db, 2).await.unwrap();
    let second = create_test_party(&db, 2).await.unwrap();

    engine
        .assign_table(AssignTable::new(floor.table.id, first.id, floor.server.id))
        .await
        .unwrap();

    let err = engine
        .assign_table(AssignTable::new(floor.table.id, second.id, floor.server.id))
        .await
        .expect_err("table is occupied");
    match err {
        SeatingError::TableNotAvailable { table_id, status } => {
            assert_eq!(table_id, floor.table.id);
            assert_eq!(status, "OCCUPIED");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn seated_party_cannot_take_a_second_table() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let other_table = create_test_table(&db, floor.restaurant.id, "2", 4)
        .await
        .unwrap();
    let party = create_test_party(&db, 2).await.unwrap();

    engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .unwrap();

    let err = engine
        .assign_table(AssignTable::new(other_table.id, party.id, floor.server.id))
        .await
        .expect_err("party already seated");
    assert!(matches!(err, SeatingError::PartyNotWaiting { .. }));

    let other_table = TableRepository::new(db).get(other_table.id).await.unwrap();
    assert_eq!(other_table.status, TableStatus::Available);
}

#[tokio::test]
async fn inactive_server_cannot_take_assignments() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 2).await.unwrap();

    ServerRepository::new(db.clone())
        .update(
            floor.server.id,
            ServerUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .expect_err("server is off the floor");
    assert!(matches!(err, SeatingError::ServerInactive { server_id } if server_id == floor.server.id));
}

#[tokio::test]
async fn unknown_ids_are_reported_as_not_found() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let missing = uuid::Uuid::new_v4();

    let err = engine
        .assign_table(AssignTable::new(floor.table.id, missing, floor.server.id))
        .await
        .expect_err("party does not exist");
    assert!(matches!(err, SeatingError::NotFound { entity: "party", id } if id == missing));
}

#[tokio::test]
async fn completing_frees_the_table_for_the_next_party() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let first = create_test_party(&db, 3).await.unwrap();
    let second = create_test_party(&db, 4).await.unwrap();

    let assignment = engine
        .assign_table(AssignTable::new(floor.table.id, first.id, floor.server.id))
        .await
        .unwrap();
    let completed = engine.complete_assignment(assignment.id).await.unwrap();
    assert_eq!(completed.status, AssignmentStatus::Completed);
    assert!(completed.completed_at.is_some());

    let first = PartyRepository::new(db.clone()).get(first.id).await.unwrap();
    assert_eq!(first.status, PartyStatus::Finished);
    let table = TableRepository::new(db.clone()).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);

    engine
        .assign_table(AssignTable::new(floor.table.id, second.id, floor.server.id))
        .await
        .expect("table is free again");
}

#[tokio::test]
async fn cancelling_returns_party_to_waiting() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let party = create_test_party(&db, 2).await.unwrap();

    let assignment = engine
        .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
        .await
        .unwrap();
    let cancelled = engine.cancel_assignment(assignment.id).await.unwrap();
    assert_eq!(cancelled.status, AssignmentStatus::Cancelled);
    assert!(cancelled.completed_at.is_none());

    let party = PartyRepository::new(db.clone()).get(party.id).await.unwrap();
    assert_eq!(party.status, PartyStatus::Waiting);
    let table = TableRepository::new(db).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Available);

    let err = engine
        .complete_assignment(assignment.id)
        .await
        .expect_err("closed assignments stay closed");
    assert!(matches!(err, SeatingError::AssignmentNotActive { .. }));
}

#[tokio::test]
async fn idempotency_key_replays_the_original_assignment() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let other_table = create_test_table(&db, floor.restaurant.id, "2", 4)
        .await
        .unwrap();
    let party = create_test_party(&db, 2).await.unwrap();

    let request = AssignTable::new(floor.table.id, party.id, floor.server.id)
        .with_idempotency_key("walk-in-7");
    let first = engine.assign_table(request.clone()).await.unwrap();
    let replayed = engine
        .assign_table(request)
        .await
        .expect("same key and arguments replay");
    assert_eq!(first.id, replayed.id);

    let err = engine
        .assign_table(
            AssignTable::new(other_table.id, party.id, floor.server.id)
                .with_idempotency_key("walk-in-7"),
        )
        .await
        .expect_err("same key with different table");
    assert!(matches!(err, SeatingError::IdempotencyMismatch { ref key } if key == "walk-in-7"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_assignments_to_one_table_admit_exactly_one() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let first = create_test_party(&db, 2).await.unwrap();
    let second = create_test_party(&db, 2).await.unwrap();

    let spawn_assign = |party_id| {
        let engine = engine.clone();
        let request = AssignTable::new(floor.table.id, party_id, floor.server.id);
        tokio::spawn(async move { engine.assign_table(request).await })
    };
    let a = spawn_assign(first.id);
    let b = spawn_assign(second.id);
    let results = [a.await.unwrap(), b.await.unwrap()];

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one assignment may win: {results:?}");
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    SeatingError::TableNotAvailable { .. } | SeatingError::ConcurrentConflict { .. }
                ),
                "loser must see a conflict, got {err:?}"
            );
        }
    }

    let table = TableRepository::new(db).get(floor.table.id).await.unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_assignments_on_a_pooled_file_database_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let engine = setup_file_engine(dir.path()).await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();

    for round in 0..10 {
        let table = create_test_table(&db, floor.restaurant.id, &format!("R{round}"), 4)
            .await
            .unwrap();
        let first = create_test_party(&db, 2).await.unwrap();
        let second = create_test_party(&db, 2).await.unwrap();

        let spawn_assign = |party_id| {
            let engine = engine.clone();
            let request = AssignTable::new(table.id, party_id, floor.server.id);
            tokio::spawn(async move { engine.assign_table(request).await })
        };
        let a = spawn_assign(first.id);
        let b = spawn_assign(second.id);
        let results = [a.await.unwrap(), b.await.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "round {round}: exactly one assignment may win: {results:?}");
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(
                    err,
                    SeatingError::TableNotAvailable { .. } | SeatingError::ConcurrentConflict { .. }
                ),
                "round {round}: loser must see a conflict, got {err:?}"
            );
        }

        let stored = TableRepository::new(db.clone()).get(table.id).await.unwrap();
        assert_eq!(stored.status, TableStatus::Occupied);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reassigning_while_cancelling_never_surfaces_a_database_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = setup_file_engine(dir.path()).await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();

    for _ in 0..10 {
        let party = create_test_party(&db, 2).await.unwrap();
        let seated = engine
            .assign_table(AssignTable::new(floor.table.id, party.id, floor.server.id))
            .await
            .unwrap();
        let seated_id = seated.id;

        let cancel = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.cancel_assignment(seated_id).await })
        };
        let reassign = {
            let engine = engine.clone();
            let request = AssignTable::new(floor.table.id, party.id, floor.server.id);
            tokio::spawn(async move { engine.assign_table(request).await })
        };
        let cancelled = cancel.await.unwrap();
        let reassigned = reassign.await.unwrap();

        if let Err(err) = &cancelled {
            assert!(
                matches!(err, SeatingError::ConcurrentConflict { .. }),
                "cancel failed with {err:?}"
            );
        }
        if let Err(err) = &reassigned {
            assert!(
                matches!(
                    err,
                    SeatingError::TableNotAvailable { .. }
                        | SeatingError::PartyNotWaiting { .. }
                        | SeatingError::ConcurrentConflict { .. }
                ),
                "reassign failed with {err:?}"
            );
        }

        // Leave the floor empty for the next round.
        if let Ok(assignment) = reassigned {
            engine.complete_assignment(assignment.id).await.unwrap();
        } else if cancelled.is_err() {
            engine.complete_assignment(seated_id).await.unwrap();
        }
        let stored = TableRepository::new(db.clone()).get(floor.table.id).await.unwrap();
        assert_eq!(stored.status, TableStatus::Available);
    }
}

#[tokio::test]
async fn only_waiting_parties_can_be_cancelled() {
    let engine = setup_engine().await.unwrap();
    let db = engine.db().clone();
    let floor = seed_floor(&db, 4).await.unwrap();
    let leaving = create_test_party(&db, 2).await.unwrap();
    let seated = create_test_party(&db, 2).await.unwrap();

    let cancelled = engine.cancel_party(leaving.id).await.unwrap();
    assert_eq!(cancelled.status, PartyStatus::Cancelled);

    engine
        .assign_table(AssignTable::new(floor.table.id, seated.id, floor.server.id))
        .await
        .unwrap();
    let err = engine
        .cancel_party(seated.id)
        .await
        .expect_err("seated parties leave through their assignment");
    assert!(matches!(err, SeatingError::InvalidStateTransition { entity: "party", .. }));
}
