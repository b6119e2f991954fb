//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose trip, visa and ledger use cases to Dart via FRB.
//! - Translate ISO date strings and ids at the boundary.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Dates cross the boundary as `YYYY-MM-DD` strings.
//! - Structured payloads are JSON strings with `snake_case` keys.
//! - Only the latest request of each sweep kind (start picker, end picker,
//!   calendar) is authoritative; older in-flight sweeps of that kind report
//!   `superseded`. Kinds never cancel each other.

use chrono::NaiveDate;
use log::warn;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use staytrack_core::db::open_db;
use staytrack_core::model::country::SCHENGEN_COUNTRIES;
use staytrack_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BlockedDatesQuery, EngineError, RecalcCoordinator, SegmentKind, SqliteTripRepository,
    SqliteVisaRepository, TripDraft, TripId, TripSegment, TripService, TripServiceError, Visa,
    VisaId, VisaService, VisaServiceError,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "staytrack.sqlite3";
const DB_PATH_ENV: &str = "STAYTRACK_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static START_RECALC: OnceLock<RecalcCoordinator> = OnceLock::new();
static END_RECALC: OnceLock<RecalcCoordinator> = OnceLock::new();
static CALENDAR_RECALC: OnceLock<RecalcCoordinator> = OnceLock::new();

/// Independent recalculation streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepKind {
    StartDates,
    EndDates,
    Calendar,
}

type SqliteTripService<'conn> =
    TripService<SqliteTripRepository<'conn>, SqliteVisaRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One trip segment as entered in the trip form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInput {
    /// Schengen country code.
    pub country: String,
    /// `YYYY-MM-DD`.
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive.
    pub end_date: String,
    pub is_transit: bool,
    pub cities: Vec<String>,
}

/// Trip form fields shared by save and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripInput {
    pub segments: Vec<SegmentInput>,
    pub visa_id: Option<String>,
    /// `tourism|business|family|medical|education|other`; defaults to tourism.
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

/// Visa form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisaInput {
    pub visa_number: String,
    /// `type_c|type_d|residence_permit`.
    pub category: String,
    pub country: Option<String>,
    pub issue_date: String,
    pub expiry_date: String,
    /// `single|double|multi`; defaults to multi.
    pub entries: Option<String>,
    pub duration_of_stay: Option<u32>,
    pub notes: Option<String>,
}

/// Envelope for write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or changed record.
    pub id: Option<String>,
    /// Stable machine-readable failure code; empty on success.
    pub error_code: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            error_code: String::new(),
            message: message.into(),
        }
    }

    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: error_code.to_string(),
            message: message.into(),
        }
    }
}

/// Envelope for read operations carrying a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub ok: bool,
    /// JSON document; `None` on failure.
    pub payload_json: Option<String>,
    pub error_code: String,
    pub message: String,
}

impl QueryResponse {
    fn from_result<T: Serialize>(result: Result<T, FfiError>) -> Self {
        match result.and_then(|value| to_json(&value)) {
            Ok(payload) => Self {
                ok: true,
                payload_json: Some(payload),
                error_code: String::new(),
                message: String::new(),
            },
            Err(err) => Self {
                ok: false,
                payload_json: None,
                error_code: err.code.to_string(),
                message: err.message,
            },
        }
    }
}

/// Envelope for date-picker sweeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedDatesResponse {
    pub ok: bool,
    /// A newer request started; discard this result.
    pub superseded: bool,
    /// Sorted `YYYY-MM-DD` dates.
    pub dates: Vec<String>,
    pub message: String,
}

/// Selectable Schengen country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryItem {
    pub code: String,
    pub name: String,
}

/// Day accounting for the window ending at `period_end`.
///
/// Payload: `DaysCalculation` JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn days_calculation(period_end: String) -> QueryResponse {
    QueryResponse::from_result(parse_date(&period_end).and_then(|period_end| {
        with_trip_service(|service| Ok(service.days_calculation(period_end)?))
    }))
}

/// Checks whether the proposed segments can be saved.
///
/// Payload: `{"status":"available"}` or
/// `{"status":"unavailable","anchor":...,"days_used":...}`.
#[flutter_rust_bridge::frb(sync)]
pub fn check_trip_availability(
    segments: Vec<SegmentInput>,
    evaluation_date: String,
    exclude_trip_id: Option<String>,
) -> QueryResponse {
    QueryResponse::from_result((|| {
        let segments = parse_segments(&segments)?;
        let evaluation_date = parse_date(&evaluation_date)?;
        let exclude = parse_optional_id(exclude_trip_id.as_deref())?;
        with_trip_service(|service| {
            Ok(service.check_availability(&segments, evaluation_date, exclude)?)
        })
    })())
}

/// Saves a new trip after the availability gate.
#[flutter_rust_bridge::frb(sync)]
pub fn save_trip(trip: TripInput, evaluation_date: String) -> ActionResponse {
    let result = parse_trip_input(&trip).and_then(|draft| {
        let evaluation_date = parse_date(&evaluation_date)?;
        with_trip_service(|service| Ok(service.save_trip(draft, evaluation_date)?))
    });
    match result {
        Ok(saved) => ActionResponse::success("Trip saved.", Some(saved.id.to_string())),
        Err(err) => err.into_action("save_trip"),
    }
}

/// Replaces a stored trip; the stored version is excluded from the check.
#[flutter_rust_bridge::frb(sync)]
pub fn update_trip(trip_id: String, trip: TripInput, evaluation_date: String) -> ActionResponse {
    let result = (|| {
        let id = parse_id(&trip_id)?;
        let draft = parse_trip_input(&trip)?;
        let evaluation_date = parse_date(&evaluation_date)?;
        with_trip_service(|service| Ok(service.update_trip(id, draft, evaluation_date)?))
    })();
    match result {
        Ok(saved) => ActionResponse::success("Trip updated.", Some(saved.id.to_string())),
        Err(err) => err.into_action("update_trip"),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_trip(trip_id: String) -> ActionResponse {
    let result = parse_id(&trip_id)
        .and_then(|id| with_trip_service(|service| Ok(service.delete_trip(id)?)));
    match result {
        Ok(()) => ActionResponse::success("Trip deleted.", Some(trip_id)),
        Err(err) => err.into_action("delete_trip"),
    }
}

/// Lists trips; `filter` is `all|past|planned`.
///
/// Payload: JSON array of trips ordered by start date.
#[flutter_rust_bridge::frb(sync)]
pub fn list_trips(filter: String) -> QueryResponse {
    QueryResponse::from_result(with_trip_service(|service| {
        match filter.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(service.list_trips()?),
            "past" => Ok(service.list_past_trips()?),
            "planned" => Ok(service.list_planned_trips()?),
            other => Err(FfiError::invalid_input(format!(
                "unknown trip filter `{other}`; expected all|past|planned"
            ))),
        }
    }))
}

/// Start dates the trip form must disable.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_start_dates(
    evaluation_date: String,
    visa_id: Option<String>,
    exclude_trip_id: Option<String>,
) -> BlockedDatesResponse {
    let guard = recalc(SweepKind::StartDates).begin();
    blocked_response((|| {
        let query = parse_blocked_query(&evaluation_date, visa_id, exclude_trip_id)?;
        with_trip_service(|service| Ok(service.blocked_start_dates(&query, &guard)?))
    })())
}

/// End dates the trip form must disable for `start_date`.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_end_dates(
    evaluation_date: String,
    start_date: String,
    visa_id: Option<String>,
    exclude_trip_id: Option<String>,
) -> BlockedDatesResponse {
    let guard = recalc(SweepKind::EndDates).begin();
    blocked_response((|| {
        let query = parse_blocked_query(&evaluation_date, visa_id, exclude_trip_id)?;
        let start_date = parse_date(&start_date)?;
        with_trip_service(|service| Ok(service.blocked_end_dates(&query, start_date, &guard)?))
    })())
}

/// Per-day availability cells for `[from, to]`.
///
/// Payload: JSON array of calendar days.
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_days(from: String, to: String, evaluation_date: String) -> QueryResponse {
    let guard = recalc(SweepKind::Calendar).begin();
    QueryResponse::from_result((|| {
        let from = parse_date(&from)?;
        let to = parse_date(&to)?;
        let evaluation_date = parse_date(&evaluation_date)?;
        with_trip_service(|service| Ok(service.calendar(from, to, evaluation_date, &guard)?))
    })())
}

/// Stay days per country; omitted bounds default to the year before `as_of`.
///
/// Payload: JSON object `{country: days}`.
#[flutter_rust_bridge::frb(sync)]
pub fn country_statistics(
    from: Option<String>,
    to: Option<String>,
    as_of: String,
) -> QueryResponse {
    QueryResponse::from_result((|| {
        let as_of = parse_date(&as_of)?;
        let range = match (from, to) {
            (Some(from), Some(to)) => Some((parse_date(&from)?, parse_date(&to)?)),
            (None, None) => None,
            _ => {
                return Err(FfiError::invalid_input(
                    "statistics range needs both bounds or neither",
                ))
            }
        };
        with_trip_service(|service| Ok(service.country_statistics(range, as_of)?))
    })())
}

#[flutter_rust_bridge::frb(sync)]
pub fn add_visa(visa: VisaInput) -> ActionResponse {
    let result = parse_visa_input(&visa, None)
        .and_then(|visa| with_visa_service(|service| Ok(service.add_visa(&visa)?)));
    match result {
        Ok(saved) => ActionResponse::success("Visa added.", Some(saved.id.to_string())),
        Err(err) => err.into_action("add_visa"),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn update_visa(visa_id: String, visa: VisaInput) -> ActionResponse {
    let result = (|| {
        let id = parse_id(&visa_id)?;
        let visa = parse_visa_input(&visa, Some(id))?;
        with_visa_service(|service| Ok(service.update_visa(&visa)?))
    })();
    match result {
        Ok(saved) => ActionResponse::success("Visa updated.", Some(saved.id.to_string())),
        Err(err) => err.into_action("update_visa"),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_visa(visa_id: String) -> ActionResponse {
    let result = parse_id(&visa_id)
        .and_then(|id| with_visa_service(|service| Ok(service.delete_visa(id)?)));
    match result {
        Ok(()) => ActionResponse::success("Visa deleted.", Some(visa_id)),
        Err(err) => err.into_action("delete_visa"),
    }
}

/// Payload: JSON array of visas ordered by expiry, latest first.
#[flutter_rust_bridge::frb(sync)]
pub fn list_visas(active_only: bool) -> QueryResponse {
    QueryResponse::from_result(with_visa_service(|service| {
        Ok(service.list_visas(active_only)?)
    }))
}

/// Marks visas that expired before `as_of` inactive.
#[flutter_rust_bridge::frb(sync)]
pub fn deactivate_expired_visas(as_of: String) -> ActionResponse {
    let result = parse_date(&as_of)
        .and_then(|as_of| with_visa_service(|service| Ok(service.deactivate_expired_visas(as_of)?)));
    match result {
        Ok(changed) => ActionResponse::success(format!("{changed} visa(s) deactivated."), None),
        Err(err) => err.into_action("deactivate_expired_visas"),
    }
}

/// Selectable Schengen countries in catalogue order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_countries() -> Vec<CountryItem> {
    SCHENGEN_COUNTRIES
        .iter()
        .map(|country| CountryItem {
            code: country.code.to_string(),
            name: country.name.to_string(),
        })
        .collect()
}

struct FfiError {
    code: &'static str,
    message: String,
}

impl FfiError {
    fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: "invalid_input",
            message: message.into(),
        }
    }

    fn into_action(self, operation: &str) -> ActionResponse {
        ActionResponse::failure(self.code, format!("{operation} failed: {}", self.message))
    }
}

impl From<TripServiceError> for FfiError {
    fn from(value: TripServiceError) -> Self {
        let code = match &value {
            TripServiceError::Validation(_) => "invalid_input",
            TripServiceError::Engine(EngineError::Superseded) => "superseded",
            TripServiceError::Engine(EngineError::InvalidInput(_)) => "invalid_input",
            TripServiceError::Engine(_) => "engine_error",
            TripServiceError::TripNotFound(_) => "trip_not_found",
            TripServiceError::VisaNotFound(_) => "visa_not_found",
            TripServiceError::DatesUnavailable { .. } => "dates_unavailable",
            TripServiceError::OverlapsExistingTrip(_) => "overlaps_existing_trip",
            TripServiceError::Repo(_) | TripServiceError::InconsistentState(_) => "storage_error",
        };
        Self {
            code,
            message: value.to_string(),
        }
    }
}

impl From<VisaServiceError> for FfiError {
    fn from(value: VisaServiceError) -> Self {
        let code = match &value {
            VisaServiceError::Validation(_) => "invalid_input",
            VisaServiceError::VisaNotFound(_) => "visa_not_found",
            VisaServiceError::Repo(_) | VisaServiceError::InconsistentState(_) => "storage_error",
        };
        Self {
            code,
            message: value.to_string(),
        }
    }
}

fn blocked_response(result: Result<BTreeSet<NaiveDate>, FfiError>) -> BlockedDatesResponse {
    match result {
        Ok(dates) => BlockedDatesResponse {
            ok: true,
            superseded: false,
            dates: dates.into_iter().map(|date| date.to_string()).collect(),
            message: String::new(),
        },
        Err(err) => BlockedDatesResponse {
            ok: false,
            superseded: err.code == "superseded",
            dates: Vec::new(),
            message: err.message,
        },
    }
}

fn recalc(kind: SweepKind) -> &'static RecalcCoordinator {
    let slot = match kind {
        SweepKind::StartDates => &START_RECALC,
        SweepKind::EndDates => &END_RECALC,
        SweepKind::Calendar => &CALENDAR_RECALC,
    };
    slot.get_or_init(RecalcCoordinator::new)
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_connection() -> Result<Connection, FfiError> {
    open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error_code=storage_error");
        FfiError {
            code: "storage_error",
            message: format!("database open failed: {err}"),
        }
    })
}

fn with_trip_service<T>(
    f: impl FnOnce(&SqliteTripService<'_>) -> Result<T, FfiError>,
) -> Result<T, FfiError> {
    let conn = open_connection()?;
    let service = TripService::new(
        SqliteTripRepository::try_new(&conn).map_err(storage_error)?,
        SqliteVisaRepository::try_new(&conn).map_err(storage_error)?,
    );
    f(&service)
}

fn with_visa_service<T>(
    f: impl FnOnce(&VisaService<SqliteVisaRepository<'_>>) -> Result<T, FfiError>,
) -> Result<T, FfiError> {
    let conn = open_connection()?;
    let service = VisaService::new(SqliteVisaRepository::try_new(&conn).map_err(storage_error)?);
    f(&service)
}

fn storage_error(err: staytrack_core::RepoError) -> FfiError {
    FfiError {
        code: "storage_error",
        message: format!("repository init failed: {err}"),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, FfiError> {
    serde_json::to_string(value).map_err(|err| FfiError {
        code: "serialization_error",
        message: err.to_string(),
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, FfiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        FfiError::invalid_input(format!("invalid date `{value}`; expected YYYY-MM-DD"))
    })
}

fn parse_id(value: &str) -> Result<Uuid, FfiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| FfiError::invalid_input(format!("invalid id `{value}`")))
}

fn parse_optional_id(value: Option<&str>) -> Result<Option<Uuid>, FfiError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse_id)
        .transpose()
}

/// Parses a `snake_case` enum label through its serde representation.
fn parse_label<T: DeserializeOwned>(value: &str, field: &str) -> Result<T, FfiError> {
    serde_json::from_value(serde_json::Value::String(
        value.trim().to_ascii_lowercase(),
    ))
    .map_err(|_| FfiError::invalid_input(format!("invalid {field} `{value}`")))
}

fn parse_segments(inputs: &[SegmentInput]) -> Result<Vec<TripSegment>, FfiError> {
    inputs
        .iter()
        .map(|input| {
            let kind = if input.is_transit {
                SegmentKind::Transit
            } else {
                SegmentKind::Stay
            };
            TripSegment::new(
                &input.country,
                parse_date(&input.start_date)?,
                parse_date(&input.end_date)?,
                kind,
            )
            .map(|segment| segment.with_cities(input.cities.iter().map(String::as_str)))
            .map_err(|err| FfiError::invalid_input(err.to_string()))
        })
        .collect()
}

fn parse_trip_input(input: &TripInput) -> Result<TripDraft, FfiError> {
    let mut draft = TripDraft::new(parse_segments(&input.segments)?);
    draft.visa_id = parse_optional_id(input.visa_id.as_deref())?;
    if let Some(purpose) = input.purpose.as_deref() {
        draft.purpose = parse_label(purpose, "purpose")?;
    }
    draft.notes = input.notes.clone();
    Ok(draft)
}

fn parse_visa_input(input: &VisaInput, id: Option<VisaId>) -> Result<Visa, FfiError> {
    let mut visa = Visa::new(
        &input.visa_number,
        parse_label(&input.category, "category")?,
        input.country.as_deref().filter(|value| !value.trim().is_empty()),
        parse_date(&input.issue_date)?,
        parse_date(&input.expiry_date)?,
    )
    .map_err(|err| FfiError::invalid_input(err.to_string()))?;
    if let Some(id) = id {
        visa.id = id;
    }
    if let Some(entries) = input.entries.as_deref() {
        visa.entries = parse_label(entries, "entries")?;
    }
    if let Some(duration) = input.duration_of_stay {
        visa.duration_of_stay = duration;
    }
    visa.notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string);
    Ok(visa)
}

fn parse_blocked_query(
    evaluation_date: &str,
    visa_id: Option<String>,
    exclude_trip_id: Option<String>,
) -> Result<BlockedDatesQuery, FfiError> {
    let exclude: Option<TripId> = parse_optional_id(exclude_trip_id.as_deref())?;
    Ok(BlockedDatesQuery {
        visa_id: parse_optional_id(visa_id.as_deref())?,
        exclude_trip_id: exclude,
        ..BlockedDatesQuery::new(parse_date(evaluation_date)?)
    })
}

#[cfg(test)]
mod tests {
    use super::{
        blocked_end_dates, calendar_days, check_trip_availability, core_version, days_calculation,
        init_logging, list_countries, parse_label, ping, recalc, save_trip, SegmentInput,
        SweepKind, TripInput,
    };
    use staytrack_core::{TripPurpose, VisaCategory};

    fn segment(country: &str, start: &str, end: &str) -> SegmentInput {
        SegmentInput {
            country: country.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            is_transit: false,
            cities: Vec::new(),
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_relative_dir() {
        let error = init_logging("info".to_string(), "tmp/logs".to_string());
        assert!(error.contains("absolute"));
    }

    #[test]
    fn labels_parse_through_serde_names() {
        assert_eq!(
            parse_label::<VisaCategory>("RESIDENCE_PERMIT", "category").ok(),
            Some(VisaCategory::ResidencePermit)
        );
        assert_eq!(
            parse_label::<TripPurpose>("business", "purpose").ok(),
            Some(TripPurpose::Business)
        );
        assert!(parse_label::<TripPurpose>("holiday", "purpose").is_err());
    }

    #[test]
    fn malformed_date_is_reported_without_touching_storage() {
        let response = days_calculation("31/12/2025".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code, "invalid_input");
        assert!(response.payload_json.is_none());
    }

    #[test]
    fn reversed_segment_is_invalid_input() {
        let response = save_trip(
            TripInput {
                segments: vec![segment("DE", "2031-05-10", "2031-05-01")],
                visa_id: None,
                purpose: None,
                notes: None,
            },
            "2031-01-01".to_string(),
        );
        assert!(!response.ok);
        assert_eq!(response.error_code, "invalid_input");
    }

    #[test]
    fn availability_payload_is_tagged_json() {
        let response = check_trip_availability(
            vec![segment("FR", "2040-03-01", "2040-03-05")],
            "2040-01-01".to_string(),
            None,
        );
        assert!(response.ok, "{}", response.message);
        let payload: serde_json::Value =
            serde_json::from_str(response.payload_json.as_deref().unwrap()).unwrap();
        assert_eq!(payload["status"], "available");
    }

    #[test]
    fn end_and_calendar_sweeps_leave_start_picker_running() {
        let start_guard = recalc(SweepKind::StartDates).begin();

        let response = blocked_end_dates(
            "2045-01-01".to_string(),
            "2045-02-01".to_string(),
            None,
            None,
        );
        assert!(response.ok, "{}", response.message);
        assert!(!response.superseded);
        assert!(response.dates.contains(&"2045-01-31".to_string()));
        assert!(!response.dates.contains(&"2045-02-01".to_string()));

        let calendar = calendar_days(
            "2045-01-01".to_string(),
            "2045-01-31".to_string(),
            "2045-01-01".to_string(),
        );
        assert!(calendar.ok, "{}", calendar.message);

        assert!(!start_guard.is_superseded());
    }

    #[test]
    fn each_sweep_kind_has_its_own_coordinator() {
        assert!(std::ptr::eq(
            recalc(SweepKind::StartDates),
            recalc(SweepKind::StartDates)
        ));
        assert!(!std::ptr::eq(
            recalc(SweepKind::StartDates),
            recalc(SweepKind::EndDates)
        ));
        assert!(!std::ptr::eq(
            recalc(SweepKind::EndDates),
            recalc(SweepKind::Calendar)
        ));
    }

    #[test]
    fn countries_include_germany() {
        assert!(list_countries().iter().any(|country| country.code == "DE"));
    }
}
