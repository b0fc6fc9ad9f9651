//! Reservation Ledger behavior over the in-memory stores.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)]

use fieldbook_core::{
    BookingError, Clock, ConflictReason, CreateReservation, ReservationFilter, ReservationId,
    ReservationStatus, SettingsPatch, UserId,
};
use fieldbook_testing::{fixtures, init_tracing, TestEngine};
use std::sync::Arc;

const TUESDAY: &str = "2026-02-24";
const SATURDAY: &str = "2026-02-28";

fn night_venue_engine() -> (TestEngine, fieldbook_core::Venue) {
    init_tracing();
    let engine = TestEngine::new();
    let venue = engine.add_venue(fixtures::venue(&[
        "17:00", "18:00", "19:00", "20:00", "21:00", "22:00", "23:00", "00:00",
    ]));
    (engine, venue)
}

#[tokio::test]
async fn create_stamps_pending_and_price() {
    let (engine, venue) = night_venue_engine();

    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "18:00"))
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.price.amount(), 1000);
    assert_eq!(reservation.venue_id, venue.id);
    assert_eq!(reservation.created_at, engine.clock.now());
    assert_eq!(engine.reservations.len(), 1);
}

#[tokio::test]
async fn saturday_night_costs_weekend_plus_surcharge() {
    let (engine, venue) = night_venue_engine();

    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, SATURDAY, "21:00"))
        .await
        .unwrap();
    assert_eq!(reservation.price.amount(), 1400);

    let after_midnight = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "00:00"))
        .await
        .unwrap();
    assert_eq!(after_midnight.price.amount(), 1200);
}

#[tokio::test]
async fn second_booking_of_same_slot_conflicts() {
    let (engine, venue) = night_venue_engine();

    engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "19:00"))
        .await
        .unwrap();

    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "19:00"))
        .await
        .unwrap_err();

    match err {
        BookingError::Conflict { venue_id, time, reason, .. } => {
            assert_eq!(venue_id, venue.id);
            assert_eq!(time, fixtures::slot("19:00"));
            assert_eq!(reason, ConflictReason::SlotHeld);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(engine.reservations.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_admit_exactly_one() {
    const CONTENDERS: usize = 32;
    let (engine, venue) = night_venue_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let request = CreateReservation {
                customer_name: format!("Customer {i}"),
                ..fixtures::request(&venue, SATURDAY, "21:00")
            };
            tokio::spawn(async move { engine.ledger.create(request).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;

    let mut created = 0;
    let mut conflicts = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(BookingError::Conflict { reason: ConflictReason::SlotHeld, .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, CONTENDERS - 1);

    let held = engine
        .ledger
        .list(ReservationFilter::Slot {
            venue_id: venue.id,
            date: fieldbook_core::types::parse_date(SATURDAY).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_distinct_slots_all_succeed() {
    let (engine, venue) = night_venue_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = venue
        .time_slots
        .iter()
        .map(|slot| {
            let engine = Arc::clone(&engine);
            let request = fixtures::request(&venue, TUESDAY, &slot.to_string());
            tokio::spawn(async move { engine.ledger.create(request).await })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }
    assert_eq!(engine.reservations.len(), venue.time_slots.len());
}

#[tokio::test]
async fn cancelled_slot_can_be_booked_again() {
    let (engine, venue) = night_venue_engine();

    let first = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "20:00"))
        .await
        .unwrap();
    engine
        .ledger
        .set_status(first.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    let second = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "20:00"))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(engine.ledger.get(first.id).await.unwrap().status, ReservationStatus::Cancelled);
    assert_eq!(engine.reservations.len(), 2);
}

#[tokio::test]
async fn completed_slot_can_be_booked_again() {
    let (engine, venue) = night_venue_engine();

    let first = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "22:00"))
        .await
        .unwrap();
    engine.ledger.set_status(first.id, ReservationStatus::Approved).await.unwrap();
    engine.ledger.set_status(first.id, ReservationStatus::Completed).await.unwrap();

    engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "22:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn blocked_slot_is_refused_as_conflict() {
    let (engine, venue) = night_venue_engine();
    let date = fieldbook_core::types::parse_date(TUESDAY).unwrap();

    engine
        .settings
        .update(
            SettingsPatch {
                blocked_slots: Some(fieldbook_core::BlockedSlots::from([(
                    date,
                    std::collections::BTreeSet::from([fixtures::slot("19:00")]),
                )])),
                ..SettingsPatch::default()
            },
            &fixtures::admin(),
        )
        .await
        .unwrap();

    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "19:00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::Conflict { reason: ConflictReason::SlotBlocked, .. }
    ));
    assert!(engine.reservations.is_empty());
}

#[tokio::test]
async fn time_outside_catalog_is_rejected() {
    let (engine, venue) = night_venue_engine();

    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "09:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn venue_without_slots_uses_default_catalog() {
    init_tracing();
    let engine = TestEngine::new();
    let venue = engine.add_venue(fixtures::venue(&[]));

    engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "09:00"))
        .await
        .unwrap();
    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "21:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn missing_fields_are_rejected_before_any_store_access() {
    let (engine, venue) = night_venue_engine();
    engine.reservations.set_offline(true);

    let request = CreateReservation {
        customer_surname: String::new(),
        ..fixtures::request(&venue, TUESDAY, "18:00")
    };
    let err = engine.ledger.create(request).await.unwrap_err();

    let BookingError::Validation(message) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(message.contains("customer_surname"));
}

#[tokio::test]
async fn unknown_venue_is_not_found() {
    let (engine, venue) = night_venue_engine();
    engine.venues.remove(venue.id);

    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "18:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { resource: "venue", .. }));
}

#[tokio::test]
async fn store_outage_surfaces_as_unavailable() {
    let (engine, venue) = night_venue_engine();
    engine.reservations.set_offline(true);

    let err = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "18:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Unavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn user_id_and_trimmed_names_are_kept() {
    let (engine, venue) = night_venue_engine();

    let reservation = engine
        .ledger
        .create(CreateReservation {
            customer_name: "  Ada  ".to_string(),
            user_id: Some(UserId("user-42".to_string())),
            ..fixtures::request(&venue, TUESDAY, "18:00")
        })
        .await
        .unwrap();

    assert_eq!(reservation.customer_name, "Ada");
    assert_eq!(reservation.user_id, Some(UserId("user-42".to_string())));

    let mine = engine
        .ledger
        .list(ReservationFilter::User(UserId("user-42".to_string())))
        .await
        .unwrap();
    assert_eq!(mine, vec![reservation]);
}

#[tokio::test]
async fn lifecycle_follows_transition_table() {
    let (engine, venue) = night_venue_engine();
    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "21:00"))
        .await
        .unwrap();

    let approved = engine
        .ledger
        .set_status(reservation.id, ReservationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, ReservationStatus::Approved);

    let completed = engine
        .ledger
        .set_status(reservation.id, ReservationStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);

    let err = engine
        .ledger
        .set_status(reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::InvalidTransition {
            from: ReservationStatus::Completed,
            to: ReservationStatus::Cancelled,
        }
    );
}

#[tokio::test]
async fn pending_cannot_jump_to_completed() {
    let (engine, venue) = night_venue_engine();
    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "21:00"))
        .await
        .unwrap();

    let err = engine
        .ledger
        .set_status(reservation.id, ReservationStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::InvalidTransition { .. }));
    let unchanged = engine.ledger.get(reservation.id).await.unwrap();
    assert_eq!(unchanged.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn cancelled_is_terminal() {
    let (engine, venue) = night_venue_engine();
    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "21:00"))
        .await
        .unwrap();
    engine
        .ledger
        .set_status(reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    for next in [
        ReservationStatus::Pending,
        ReservationStatus::Approved,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
    ] {
        let err = engine.ledger.set_status(reservation.id, next).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transitions_apply_once() {
    let (engine, venue) = night_venue_engine();
    let engine = Arc::new(engine);
    let reservation = engine
        .ledger
        .create(fixtures::request(&venue, TUESDAY, "21:00"))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .ledger
                    .set_status(reservation.id, ReservationStatus::Approved)
                    .await
            })
        })
        .collect();

    let mut approved = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(_) => approved += 1,
            Err(BookingError::InvalidTransition { from, .. }) => {
                assert_eq!(from, ReservationStatus::Approved);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(approved, 1);
}

#[tokio::test]
async fn unknown_reservation_is_not_found() {
    let (engine, _) = night_venue_engine();

    let missing = ReservationId::new();
    assert!(matches!(
        engine.ledger.get(missing).await,
        Err(BookingError::NotFound { resource: "reservation", .. })
    ));
    assert!(matches!(
        engine.ledger.set_status(missing, ReservationStatus::Approved).await,
        Err(BookingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn listings_are_ordered_and_filtered() {
    init_tracing();
    let engine = TestEngine::new();
    let arena = engine.add_venue(fixtures::venue(&["18:00", "19:00", "20:00"]));
    let court = engine.add_venue(fixtures::venue(&["18:00", "19:00", "20:00"]));

    for (venue, date, time) in [
        (&arena, SATURDAY, "20:00"),
        (&arena, TUESDAY, "19:00"),
        (&court, TUESDAY, "18:00"),
        (&arena, TUESDAY, "18:00"),
    ] {
        engine
            .ledger
            .create(fixtures::request(venue, date, time))
            .await
            .unwrap();
    }

    let all = engine.ledger.list(ReservationFilter::All).await.unwrap();
    assert_eq!(all.len(), 4);
    let keys: Vec<(String, String)> = all
        .iter()
        .map(|r| (r.date.to_string(), r.time.to_string()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let arena_only = engine.ledger.list(ReservationFilter::Venue(arena.id)).await.unwrap();
    assert_eq!(arena_only.len(), 3);
    assert!(arena_only.iter().all(|r| r.venue_id == arena.id));

    let first = arena_only.first().unwrap();
    engine
        .ledger
        .set_status(first.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    let tuesday = engine
        .ledger
        .list(ReservationFilter::Slot {
            venue_id: arena.id,
            date: fieldbook_core::types::parse_date(TUESDAY).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(tuesday.len(), 1);
    assert_eq!(tuesday[0].time, fixtures::slot("19:00"));

    // Venue listings include every status.
    let arena_all = engine.ledger.list(ReservationFilter::Venue(arena.id)).await.unwrap();
    assert_eq!(arena_all.len(), 3);
}
