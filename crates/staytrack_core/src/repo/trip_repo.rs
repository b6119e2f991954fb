//! Trip repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist trips together with their full segment set.
//! - Provide the filtered trip listings the ledger and screens consume.
//!
//! # Invariants
//! - A trip row and its segments are written in one transaction.
//! - `replace_trip` swaps the whole segment set; segments are never patched.
//! - Deleting a trip cascades to its segments (`ON DELETE CASCADE`).
//! - `trips.start_date`/`end_date` mirror the segment span for range queries.

use super::{
    bool_to_int, date_to_db, ensure_tables_ready, parse_bool, parse_date, parse_uuid, RepoError,
    RepoResult,
};
use crate::model::segment::{SegmentKind, TripSegment};
use crate::model::trip::{Trip, TripId, TripPurpose};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const TRIP_SELECT_SQL: &str = "SELECT
    id,
    visa_id,
    purpose,
    is_planned,
    notes,
    created_at
FROM trips";

const TRIP_COLUMNS: &[&str] = &[
    "id",
    "visa_id",
    "start_date",
    "end_date",
    "purpose",
    "is_planned",
    "notes",
    "created_at",
];

const SEGMENT_COLUMNS: &[&str] = &[
    "trip_id",
    "position",
    "country",
    "start_date",
    "end_date",
    "segment_type",
    "cities",
];

const CITY_SEPARATOR: &str = "\n";

/// Query options for listing trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripListQuery {
    /// Filter on the stored `is_planned` flag.
    pub planned: Option<bool>,
    /// Only trips whose span intersects the inclusive range.
    pub overlapping: Option<(NaiveDate, NaiveDate)>,
    /// Only trips with at least one segment in this country.
    pub country: Option<String>,
}

impl TripListQuery {
    pub fn all() -> Self {
        Self::default()
    }
}

/// Repository interface for trip persistence.
pub trait TripRepository {
    /// Inserts the trip and all of its segments atomically.
    fn create_trip(&self, trip: &Trip) -> RepoResult<TripId>;
    /// Replaces trip fields and its full segment set atomically.
    fn replace_trip(&self, trip: &Trip) -> RepoResult<()>;
    fn delete_trip(&self, id: TripId) -> RepoResult<()>;
    fn get_trip(&self, id: TripId) -> RepoResult<Option<Trip>>;
    /// Lists trips ordered by `start_date ASC, end_date ASC, id ASC`.
    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>>;
}

/// SQLite-backed trip repository.
pub struct SqliteTripRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTripRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_ready(
            conn,
            &[
                ("trips", TRIP_COLUMNS),
                ("trip_segments", SEGMENT_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl TripRepository for SqliteTripRepository<'_> {
    fn create_trip(&self, trip: &Trip) -> RepoResult<TripId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_visa_exists(&tx, trip)?;

        tx.execute(
            "INSERT INTO trips (
                id,
                visa_id,
                start_date,
                end_date,
                purpose,
                is_planned,
                notes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                trip.id.to_string(),
                trip.visa_id.map(|id| id.to_string()),
                date_to_db(trip.start_date()),
                date_to_db(trip.end_date()),
                purpose_to_db(trip.purpose),
                bool_to_int(trip.is_planned),
                trip.notes.as_deref(),
                date_to_db(trip.created_at),
            ],
        )?;
        insert_segments(&tx, trip)?;

        tx.commit()?;
        Ok(trip.id)
    }

    fn replace_trip(&self, trip: &Trip) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_visa_exists(&tx, trip)?;

        let changed = tx.execute(
            "UPDATE trips
             SET
                visa_id = ?1,
                start_date = ?2,
                end_date = ?3,
                purpose = ?4,
                is_planned = ?5,
                notes = ?6
             WHERE id = ?7;",
            params![
                trip.visa_id.map(|id| id.to_string()),
                date_to_db(trip.start_date()),
                date_to_db(trip.end_date()),
                purpose_to_db(trip.purpose),
                bool_to_int(trip.is_planned),
                trip.notes.as_deref(),
                trip.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TripNotFound(trip.id));
        }

        tx.execute(
            "DELETE FROM trip_segments WHERE trip_id = ?1;",
            [trip.id.to_string()],
        )?;
        insert_segments(&tx, trip)?;

        tx.commit()?;
        Ok(())
    }

    fn delete_trip(&self, id: TripId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TripNotFound(id));
        }
        Ok(())
    }

    fn get_trip(&self, id: TripId) -> RepoResult<Option<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TRIP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_trip_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>> {
        let mut sql = format!("{TRIP_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(planned) = query.planned {
            sql.push_str(" AND is_planned = ?");
            bind_values.push(Value::Integer(bool_to_int(planned)));
        }

        if let Some((from, to)) = query.overlapping {
            sql.push_str(" AND start_date <= ? AND end_date >= ?");
            bind_values.push(Value::Text(date_to_db(to)));
            bind_values.push(Value::Text(date_to_db(from)));
        }

        if let Some(country) = query.country.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM trip_segments s
                    WHERE s.trip_id = trips.id
                      AND s.country = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(country.trim().to_string()));
        }

        sql.push_str(" ORDER BY start_date ASC, end_date ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut trips = Vec::new();
        while let Some(row) = rows.next()? {
            trips.push(parse_trip_row(self.conn, row)?);
        }
        Ok(trips)
    }
}

fn ensure_visa_exists(tx: &Transaction<'_>, trip: &Trip) -> RepoResult<()> {
    let Some(visa_id) = trip.visa_id else {
        return Ok(());
    };
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM visas WHERE id = ?1);",
        [visa_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::VisaNotFound(visa_id))
    }
}

fn insert_segments(tx: &Transaction<'_>, trip: &Trip) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO trip_segments (
            trip_id,
            position,
            country,
            start_date,
            end_date,
            segment_type,
            cities
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
    )?;
    let trip_id = trip.id.to_string();
    for (position, segment) in trip.segments().iter().enumerate() {
        let cities = (!segment.cities.is_empty()).then(|| segment.cities.join(CITY_SEPARATOR));
        stmt.execute(params![
            trip_id.as_str(),
            position as i64,
            segment.country.as_str(),
            date_to_db(segment.start_date),
            date_to_db(segment.end_date),
            segment_kind_to_db(segment.kind),
            cities,
        ])?;
    }
    Ok(())
}

fn parse_trip_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Trip> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "trips.id")?;

    let visa_id = match row.get::<_, Option<String>>("visa_id")? {
        Some(value) => Some(parse_uuid(&value, "trips.visa_id")?),
        None => None,
    };

    let purpose_text: String = row.get("purpose")?;
    let purpose = parse_purpose(&purpose_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid purpose `{purpose_text}` in trips.purpose"))
    })?;

    let created_at: String = row.get("created_at")?;
    let segments = load_segments(conn, &id_text)?;
    if segments.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "trip `{id_text}` has no rows in trip_segments"
        )));
    }

    let mut trip = Trip::with_id(id, segments, parse_date(&created_at, "trips.created_at")?)?;
    trip.visa_id = visa_id;
    trip.purpose = purpose;
    trip.is_planned = parse_bool(row.get("is_planned")?, "trips.is_planned")?;
    trip.notes = row.get("notes")?;
    Ok(trip)
}

fn load_segments(conn: &Connection, trip_id: &str) -> RepoResult<Vec<TripSegment>> {
    let mut stmt = conn.prepare(
        "SELECT
            country,
            start_date,
            end_date,
            segment_type,
            cities
         FROM trip_segments
         WHERE trip_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([trip_id])?;
    let mut segments = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_text: String = row.get("segment_type")?;
        let kind = parse_segment_kind(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid segment type `{kind_text}` in trip_segments.segment_type"
            ))
        })?;
        let start: String = row.get("start_date")?;
        let end: String = row.get("end_date")?;
        let country: String = row.get("country")?;
        let cities: Option<String> = row.get("cities")?;

        let segment = TripSegment::new(
            country,
            parse_date(&start, "trip_segments.start_date")?,
            parse_date(&end, "trip_segments.end_date")?,
            kind,
        )?
        .with_cities(cities.as_deref().unwrap_or_default().split(CITY_SEPARATOR));
        segments.push(segment);
    }
    Ok(segments)
}

fn purpose_to_db(purpose: TripPurpose) -> &'static str {
    match purpose {
        TripPurpose::Tourism => "tourism",
        TripPurpose::Business => "business",
        TripPurpose::Family => "family",
        TripPurpose::Medical => "medical",
        TripPurpose::Education => "education",
        TripPurpose::Other => "other",
    }
}

fn parse_purpose(value: &str) -> Option<TripPurpose> {
    match value {
        "tourism" => Some(TripPurpose::Tourism),
        "business" => Some(TripPurpose::Business),
        "family" => Some(TripPurpose::Family),
        "medical" => Some(TripPurpose::Medical),
        "education" => Some(TripPurpose::Education),
        "other" => Some(TripPurpose::Other),
        _ => None,
    }
}

fn segment_kind_to_db(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Stay => "stay",
        SegmentKind::Transit => "transit",
    }
}

fn parse_segment_kind(value: &str) -> Option<SegmentKind> {
    match value {
        "stay" => Some(SegmentKind::Stay),
        "transit" => Some(SegmentKind::Transit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_purpose, purpose_to_db};
    use crate::model::trip::TripPurpose;

    #[test]
    fn purpose_mapping_is_stable() {
        for purpose in [
            TripPurpose::Tourism,
            TripPurpose::Business,
            TripPurpose::Family,
            TripPurpose::Medical,
            TripPurpose::Education,
            TripPurpose::Other,
        ] {
            assert_eq!(parse_purpose(purpose_to_db(purpose)), Some(purpose));
        }
        assert_eq!(parse_purpose("holiday"), None);
    }
}
