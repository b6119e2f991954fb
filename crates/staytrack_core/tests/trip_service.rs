use chrono::{NaiveDate, TimeDelta};
use rusqlite::Connection;
use staytrack_core::db::open_db_in_memory;
use staytrack_core::{
    BlockedDatesQuery, RecalcCoordinator, SqliteTripRepository, SqliteVisaRepository,
    SweepGuard, TripDraft, TripSegment, TripService, TripServiceError, TripStatus, Visa,
    VisaCategory, VisaService,
};

/// Day 1 is 2025-01-01.
fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + TimeDelta::days(n - 1)
}

fn stay(country: &str, from: i64, to: i64) -> TripSegment {
    TripSegment::stay(country, day(from), day(to)).unwrap()
}

fn service(conn: &Connection) -> TripService<SqliteTripRepository<'_>, SqliteVisaRepository<'_>> {
    TripService::new(
        SqliteTripRepository::try_new(conn).unwrap(),
        SqliteVisaRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn save_derives_planned_flag_from_evaluation_date() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);

    let past = trips.save_trip(TripDraft::new(vec![stay("DE", 1, 5)]), day(10)).unwrap();
    let planned = trips.save_trip(TripDraft::new(vec![stay("FR", 20, 25)]), day(10)).unwrap();

    assert!(!past.is_planned);
    assert!(planned.is_planned);
    assert_eq!(planned.status_on(day(10)), TripStatus::Planned);
    assert_eq!(trips.list_past_trips().unwrap().len(), 1);
    assert_eq!(trips.list_planned_trips().unwrap()[0].id, planned.id);
}

#[test]
fn save_is_rejected_when_a_window_would_exceed_ninety() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    trips.save_trip(TripDraft::new(vec![stay("DE", 1, 60)]), day(1)).unwrap();

    let err = trips
        .save_trip(TripDraft::new(vec![stay("DE", 61, 95)]), day(1))
        .unwrap_err();
    assert!(matches!(
        err,
        TripServiceError::DatesUnavailable { days_used: 91, .. }
    ));
    assert_eq!(trips.list_trips().unwrap().len(), 1);

    trips.save_trip(TripDraft::new(vec![stay("DE", 61, 90)]), day(1)).unwrap();
    assert_eq!(trips.days_calculation(day(90)).unwrap().total_days_used, 90);
}

#[test]
fn overlapping_trips_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let first = trips.save_trip(TripDraft::new(vec![stay("AT", 10, 20)]), day(1)).unwrap();

    let err = trips
        .save_trip(TripDraft::new(vec![stay("CH", 20, 22)]), day(1))
        .unwrap_err();

    assert!(matches!(err, TripServiceError::OverlapsExistingTrip(id) if id == first.id));
}

#[test]
fn update_is_checked_without_its_own_stored_days() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let stored = trips.save_trip(TripDraft::new(vec![stay("ES", 1, 90)]), day(1)).unwrap();

    let updated = trips
        .update_trip(stored.id, TripDraft::new(vec![stay("ES", 2, 91)]), day(1))
        .unwrap();

    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.created_at, stored.created_at);
    assert_eq!(updated.start_date(), day(2));
    assert_eq!(trips.list_trips().unwrap().len(), 1);
}

#[test]
fn exemption_is_resolved_from_stored_permits() {
    let conn = open_db_in_memory().unwrap();
    let visas = VisaService::new(SqliteVisaRepository::try_new(&conn).unwrap());
    visas
        .add_visa(&Visa::new("RP-1", VisaCategory::ResidencePermit, Some("PL"), day(1), day(400)).unwrap())
        .unwrap();
    let trips = service(&conn);

    trips.save_trip(TripDraft::new(vec![stay("PL", 1, 150)]), day(1)).unwrap();
    trips.save_trip(TripDraft::new(vec![stay("DE", 151, 200)]), day(1)).unwrap();

    let calculation = trips.days_calculation(day(200)).unwrap();
    assert_eq!(calculation.total_days_used, 50);
    assert_eq!(calculation.days_per_country.get("PL"), Some(&130));
    assert_eq!(calculation.chargeable_days_per_country.get("DE"), Some(&50));
}

#[test]
fn blocked_dates_use_bound_visa() {
    let conn = open_db_in_memory().unwrap();
    let visas = VisaService::new(SqliteVisaRepository::try_new(&conn).unwrap());
    let visa = visas
        .add_visa(&Visa::new("C-9", VisaCategory::TypeC, None, day(30), day(60)).unwrap())
        .unwrap();
    let trips = service(&conn);
    let query = BlockedDatesQuery {
        visa_id: Some(visa.id),
        ..BlockedDatesQuery::new(day(1))
    };

    let starts = trips
        .blocked_start_dates(&query, &SweepGuard::unguarded())
        .unwrap();
    let ends = trips
        .blocked_end_dates(&query, day(40), &SweepGuard::unguarded())
        .unwrap();

    assert!(starts.contains(&day(29)));
    assert!(!starts.contains(&day(30)));
    assert!(ends.contains(&day(39)));
    assert!(!ends.contains(&day(60)));
    assert!(ends.contains(&day(61)));
}

#[test]
fn superseded_sweep_surfaces_engine_error() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let coordinator = RecalcCoordinator::new();
    let stale = coordinator.begin();
    let _fresh = coordinator.begin();

    let err = trips
        .blocked_start_dates(&BlockedDatesQuery::new(day(1)), &stale)
        .unwrap_err();

    assert!(matches!(
        err,
        TripServiceError::Engine(staytrack_core::EngineError::Superseded)
    ));
}

#[test]
fn statistics_default_to_the_trailing_year() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    trips.save_trip(TripDraft::new(vec![stay("IT", 1, 10)]), day(1)).unwrap();
    trips
        .save_trip(
            TripDraft::new(vec![
                stay("FR", 400, 405),
                TripSegment::transit("BE", day(405), day(405)).unwrap(),
            ]),
            day(1),
        )
        .unwrap();

    let stats = trips.country_statistics(None, day(410)).unwrap();

    assert_eq!(stats.get("FR"), Some(&6));
    assert!(!stats.contains_key("IT"));
    assert!(!stats.contains_key("BE"));
}

#[test]
fn calendar_marks_trip_days_and_remaining_allowance() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let saved = trips.save_trip(TripDraft::new(vec![stay("NL", 5, 14)]), day(1)).unwrap();

    let cells = trips
        .calendar(day(1), day(20), day(1), &SweepGuard::unguarded())
        .unwrap();

    assert_eq!(cells.len(), 20);
    assert!(!cells[4].is_available);
    assert_eq!(cells[4].trip_id, Some(saved.id));
    assert!(cells[0].is_available);
    assert_eq!(cells[19].remaining_days_on_date, 80);
}

#[test]
fn missing_trip_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let id = uuid::Uuid::new_v4();

    assert!(matches!(
        trips.delete_trip(id),
        Err(TripServiceError::TripNotFound(missing)) if missing == id
    ));
    assert!(matches!(
        trips.update_trip(id, TripDraft::new(vec![stay("DE", 1, 2)]), day(1)),
        Err(TripServiceError::TripNotFound(_))
    ));
}

#[test]
fn trips_in_period_include_partial_overlaps() {
    let conn = open_db_in_memory().unwrap();
    let trips = service(&conn);
    let straddling = trips.save_trip(TripDraft::new(vec![stay("DE", 5, 15)]), day(1)).unwrap();
    let inside = trips.save_trip(TripDraft::new(vec![stay("FR", 20, 25)]), day(1)).unwrap();
    trips.save_trip(TripDraft::new(vec![stay("IT", 40, 45)]), day(1)).unwrap();

    let listed: Vec<_> = trips
        .list_trips_in_period(day(10), day(30))
        .unwrap()
        .into_iter()
        .map(|trip| trip.id)
        .collect();

    assert_eq!(listed, vec![straddling.id, inside.id]);
    assert!(matches!(
        trips.list_trips_in_period(day(30), day(10)),
        Err(TripServiceError::Validation(_))
    ));
}
