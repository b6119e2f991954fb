use chrono::NaiveDate;
use rusqlite::Connection;
use staytrack_core::db::open_db_in_memory;
use staytrack_core::{
    RepoError, SqliteTripRepository, SqliteVisaRepository, Trip, TripListQuery, TripPurpose,
    TripRepository, TripSegment, Visa, VisaCategory, VisaRepository,
};
use uuid::Uuid;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn sample_trip() -> Trip {
    let mut trip = Trip::new(
        vec![
            TripSegment::stay("de", date(3, 1), date(3, 10))
                .unwrap()
                .with_cities(["Berlin", "Potsdam"]),
            TripSegment::transit("AT", date(3, 10), date(3, 10)).unwrap(),
            TripSegment::stay("IT", date(3, 10), date(3, 20)).unwrap(),
        ],
        date(2, 1),
    )
    .unwrap();
    trip.purpose = TripPurpose::Business;
    trip.notes = Some("conference".to_string());
    trip
}

fn segment_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM trip_segments;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_and_get_round_trips_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let trip = sample_trip();

    let id = repo.create_trip(&trip).unwrap();
    let loaded = repo.get_trip(id).unwrap().unwrap();

    assert_eq!(loaded, trip);
    assert_eq!(loaded.segments()[0].cities, vec!["Berlin", "Potsdam"]);
    assert_eq!(segment_rows(&conn), 3);
}

#[test]
fn replace_swaps_the_whole_segment_set() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let mut trip = sample_trip();
    repo.create_trip(&trip).unwrap();

    trip.replace_segments(vec![TripSegment::stay("FR", date(4, 1), date(4, 3)).unwrap()])
        .unwrap();
    trip.notes = None;
    repo.replace_trip(&trip).unwrap();

    let loaded = repo.get_trip(trip.id).unwrap().unwrap();
    assert_eq!(loaded.segments().len(), 1);
    assert_eq!(loaded.start_date(), date(4, 1));
    assert_eq!(loaded.end_date(), date(4, 3));
    assert_eq!(loaded.notes, None);
    assert_eq!(segment_rows(&conn), 1);
}

#[test]
fn delete_cascades_to_segments() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let trip = sample_trip();
    repo.create_trip(&trip).unwrap();

    repo.delete_trip(trip.id).unwrap();

    assert!(repo.get_trip(trip.id).unwrap().is_none());
    assert_eq!(segment_rows(&conn), 0);
}

#[test]
fn missing_trip_operations_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let trip = sample_trip();

    assert!(matches!(
        repo.replace_trip(&trip),
        Err(RepoError::TripNotFound(id)) if id == trip.id
    ));
    assert!(matches!(
        repo.delete_trip(trip.id),
        Err(RepoError::TripNotFound(_))
    ));
}

#[test]
fn unknown_visa_binding_is_rejected_without_partial_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let mut trip = sample_trip();
    trip.visa_id = Some(Uuid::new_v4());

    assert!(matches!(
        repo.create_trip(&trip),
        Err(RepoError::VisaNotFound(_))
    ));
    assert!(repo.list_trips(&TripListQuery::all()).unwrap().is_empty());
    assert_eq!(segment_rows(&conn), 0);
}

#[test]
fn deleting_bound_visa_unbinds_trip() {
    let conn = open_db_in_memory().unwrap();
    let trips = SqliteTripRepository::try_new(&conn).unwrap();
    let visas = SqliteVisaRepository::try_new(&conn).unwrap();
    let visa = Visa::new("C-77", VisaCategory::TypeC, None, date(1, 1), date(12, 31)).unwrap();
    visas.create_visa(&visa).unwrap();
    let mut trip = sample_trip();
    trip.visa_id = Some(visa.id);
    trips.create_trip(&trip).unwrap();

    visas.delete_visa(visa.id).unwrap();

    assert_eq!(trips.get_trip(trip.id).unwrap().unwrap().visa_id, None);
}

#[test]
fn list_filters_by_plan_flag_period_and_country() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();

    let past = sample_trip();
    let mut planned = Trip::new(
        vec![TripSegment::stay("ES", date(8, 1), date(8, 14)).unwrap()],
        date(2, 1),
    )
    .unwrap();
    planned.is_planned = true;
    repo.create_trip(&planned).unwrap();
    repo.create_trip(&past).unwrap();

    let all = repo.list_trips(&TripListQuery::all()).unwrap();
    assert_eq!(
        all.iter().map(|trip| trip.id).collect::<Vec<_>>(),
        vec![past.id, planned.id]
    );

    let only_planned = repo
        .list_trips(&TripListQuery {
            planned: Some(true),
            ..TripListQuery::default()
        })
        .unwrap();
    assert_eq!(only_planned.len(), 1);
    assert_eq!(only_planned[0].id, planned.id);

    let in_march = repo
        .list_trips(&TripListQuery {
            overlapping: Some((date(3, 20), date(3, 31))),
            ..TripListQuery::default()
        })
        .unwrap();
    assert_eq!(in_march.len(), 1);
    assert_eq!(in_march[0].id, past.id);

    let italy = repo
        .list_trips(&TripListQuery {
            country: Some("it".to_string()),
            ..TripListQuery::default()
        })
        .unwrap();
    assert_eq!(italy.len(), 1);
    assert_eq!(italy[0].id, past.id);
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteTripRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("trips"))
    ));
}

#[test]
fn corrupt_persisted_dates_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTripRepository::try_new(&conn).unwrap();
    let trip = sample_trip();
    repo.create_trip(&trip).unwrap();
    conn.execute(
        "UPDATE trip_segments SET end_date = '2025-13-40' WHERE position = 0;",
        [],
    )
    .unwrap();

    assert!(matches!(
        repo.get_trip(trip.id),
        Err(RepoError::InvalidData(_))
    ));
}
