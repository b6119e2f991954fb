//! Trip use-case service.
//!
//! # Responsibility
//! - Save, edit, delete and list trips.
//! - Gate every save on the availability checker and on trip overlap.
//! - Serve day accounting, blocked dates, statistics and calendar views.
//!
//! # Invariants
//! - Exempt countries are resolved once per call and passed to the ledger as
//!   a single snapshot.
//! - A trip is persisted only when no touched window exceeds the ceiling.
//! - Edits exclude the trip's own stored days from the check.
//! - `is_planned` is derived at save time as `start_date > evaluation_date`.

use crate::ledger::availability::{check_availability, Availability};
use crate::ledger::blocked::{
    blocked_end_dates, blocked_start_dates, BlockedDatesRequest, SweepHorizon,
};
use crate::ledger::calendar::calendar_days;
use crate::ledger::exemption::ExemptionSnapshot;
use crate::ledger::sweep::SweepGuard;
use crate::ledger::window::{calculate_days, country_statistics};
use crate::ledger::EngineError;
use crate::model::days::{CalendarDay, DaysCalculation};
use crate::model::segment::TripSegment;
use crate::model::trip::{Trip, TripId, TripPurpose};
use crate::model::validation::ValidationError;
use crate::model::visa::{Visa, VisaId};
use crate::repo::{RepoError, TripListQuery, TripRepository, VisaRepository};
use chrono::{Months, NaiveDate};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for trip use-cases.
#[derive(Debug)]
pub enum TripServiceError {
    Validation(ValidationError),
    Engine(EngineError),
    TripNotFound(TripId),
    VisaNotFound(VisaId),
    /// Saving would push the window ending at `anchor` over the ceiling.
    DatesUnavailable { anchor: NaiveDate, days_used: u32 },
    /// The trip span intersects another stored trip.
    OverlapsExistingTrip(TripId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TripServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::TripNotFound(id) => write!(f, "trip not found: {id}"),
            Self::VisaNotFound(id) => write!(f, "visa not found: {id}"),
            Self::DatesUnavailable { anchor, days_used } => write!(
                f,
                "dates unavailable: window ending {anchor} would hold {days_used} days"
            ),
            Self::OverlapsExistingTrip(id) => write!(f, "trip overlaps existing trip {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent trip state: {details}"),
        }
    }
}

impl Error for TripServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for TripServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<EngineError> for TripServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for TripServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TripNotFound(id) => Self::TripNotFound(id),
            RepoError::VisaNotFound(id) => Self::VisaNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// User-entered trip form content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripDraft {
    pub segments: Vec<TripSegment>,
    pub visa_id: Option<VisaId>,
    pub purpose: TripPurpose,
    pub notes: Option<String>,
}

impl TripDraft {
    pub fn new(segments: Vec<TripSegment>) -> Self {
        Self {
            segments,
            visa_id: None,
            purpose: TripPurpose::default(),
            notes: None,
        }
    }
}

/// Date-picker state for blocked-date queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedDatesQuery {
    pub evaluation_date: NaiveDate,
    pub visa_id: Option<VisaId>,
    pub exclude_trip_id: Option<TripId>,
    pub horizon: SweepHorizon,
}

impl BlockedDatesQuery {
    pub fn new(evaluation_date: NaiveDate) -> Self {
        Self {
            evaluation_date,
            visa_id: None,
            exclude_trip_id: None,
            horizon: SweepHorizon::default(),
        }
    }
}

/// Trip service facade over trip and visa repositories.
pub struct TripService<T: TripRepository, V: VisaRepository> {
    trips: T,
    visas: V,
}

impl<T: TripRepository, V: VisaRepository> TripService<T, V> {
    pub fn new(trips: T, visas: V) -> Self {
        Self { trips, visas }
    }

    /// Day accounting for the window ending at `period_end`.
    pub fn days_calculation(
        &self,
        period_end: NaiveDate,
    ) -> Result<DaysCalculation, TripServiceError> {
        let started_at = Instant::now();
        let trips = self.trips.list_trips(&TripListQuery::all())?;
        let snapshot = self.exemption_snapshot(period_end)?;
        let calculation = calculate_days(&trips, period_end, &snapshot)?;
        info!(
            "event=days_calc module=ledger status=ok period_end={period_end} total={} remaining={} exempt={} duration_ms={}",
            calculation.total_days_used,
            calculation.remaining_days,
            calculation.exempt_countries.len(),
            started_at.elapsed().as_millis()
        );
        Ok(calculation)
    }

    /// Runs the availability checker against stored trips.
    pub fn check_availability(
        &self,
        segments: &[TripSegment],
        evaluation_date: NaiveDate,
        exclude_trip_id: Option<TripId>,
    ) -> Result<Availability, TripServiceError> {
        let trips = self.trips.list_trips(&TripListQuery::all())?;
        let snapshot = self.exemption_snapshot(evaluation_date)?;
        Ok(check_availability(
            &trips,
            segments,
            &snapshot,
            exclude_trip_id,
        )?)
    }

    /// Validates, gates and persists a new trip.
    ///
    /// # Errors
    /// - `Validation` for malformed segments.
    /// - `OverlapsExistingTrip` when the span intersects a stored trip.
    /// - `DatesUnavailable` when a touched window would exceed the ceiling.
    pub fn save_trip(
        &self,
        draft: TripDraft,
        evaluation_date: NaiveDate,
    ) -> Result<Trip, TripServiceError> {
        let mut trip = Trip::new(draft.segments, evaluation_date)?;
        trip.visa_id = draft.visa_id;
        trip.purpose = draft.purpose;
        trip.notes = normalize_notes(draft.notes);
        trip.is_planned = trip.start_date() > evaluation_date;

        self.ensure_savable(&trip, evaluation_date, None)?;
        let id = self.trips.create_trip(&trip)?;
        info!(
            "event=trip_save module=service status=ok segments={} start={} end={} planned={}",
            trip.segments().len(),
            trip.start_date(),
            trip.end_date(),
            trip.is_planned
        );
        self.trips
            .get_trip(id)?
            .ok_or(TripServiceError::InconsistentState(
                "created trip not found in read-back",
            ))
    }

    /// Replaces a stored trip with `draft`, checking it without its old days.
    pub fn update_trip(
        &self,
        id: TripId,
        draft: TripDraft,
        evaluation_date: NaiveDate,
    ) -> Result<Trip, TripServiceError> {
        let stored = self.get_trip(id)?;
        let mut trip = Trip::with_id(id, draft.segments, stored.created_at)?;
        trip.visa_id = draft.visa_id;
        trip.purpose = draft.purpose;
        trip.notes = normalize_notes(draft.notes);
        trip.is_planned = trip.start_date() > evaluation_date;

        self.ensure_savable(&trip, evaluation_date, Some(id))?;
        self.trips.replace_trip(&trip)?;
        info!(
            "event=trip_update module=service status=ok segments={} start={} end={}",
            trip.segments().len(),
            trip.start_date(),
            trip.end_date()
        );
        self.trips
            .get_trip(id)?
            .ok_or(TripServiceError::InconsistentState(
                "updated trip not found in read-back",
            ))
    }

    pub fn delete_trip(&self, id: TripId) -> Result<(), TripServiceError> {
        self.trips.delete_trip(id)?;
        info!("event=trip_delete module=service status=ok");
        Ok(())
    }

    pub fn get_trip(&self, id: TripId) -> Result<Trip, TripServiceError> {
        self.trips
            .get_trip(id)?
            .ok_or(TripServiceError::TripNotFound(id))
    }

    pub fn list_trips(&self) -> Result<Vec<Trip>, TripServiceError> {
        Ok(self.trips.list_trips(&TripListQuery::all())?)
    }

    /// Trips stored as already started at save time.
    pub fn list_past_trips(&self) -> Result<Vec<Trip>, TripServiceError> {
        Ok(self.trips.list_trips(&TripListQuery {
            planned: Some(false),
            ..TripListQuery::default()
        })?)
    }

    pub fn list_planned_trips(&self) -> Result<Vec<Trip>, TripServiceError> {
        Ok(self.trips.list_trips(&TripListQuery {
            planned: Some(true),
            ..TripListQuery::default()
        })?)
    }

    /// Trips whose span intersects `[from, to]`, including trips that only
    /// partly fall inside it. Statistics over a period rely on this: a trip
    /// straddling a bound still contributes its in-range days.
    pub fn list_trips_in_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Trip>, TripServiceError> {
        if to < from {
            return Err(ValidationError::InvalidRange {
                start: from,
                end: to,
            }
            .into());
        }
        Ok(self.trips.list_trips(&TripListQuery {
            overlapping: Some((from, to)),
            ..TripListQuery::default()
        })?)
    }

    pub fn list_trips_by_country(&self, country: &str) -> Result<Vec<Trip>, TripServiceError> {
        Ok(self.trips.list_trips(&TripListQuery {
            country: Some(country.trim().to_ascii_uppercase()),
            ..TripListQuery::default()
        })?)
    }

    /// Start dates the trip form must disable.
    pub fn blocked_start_dates(
        &self,
        query: &BlockedDatesQuery,
        guard: &SweepGuard,
    ) -> Result<BTreeSet<NaiveDate>, TripServiceError> {
        let started_at = Instant::now();
        let trips = self.trips.list_trips(&TripListQuery::all())?;
        let snapshot = self.exemption_snapshot(query.evaluation_date)?;
        let visa = self.bound_visa(query.visa_id)?;
        let request = BlockedDatesRequest {
            evaluation_date: query.evaluation_date,
            bound_visa: visa.as_ref(),
            exclude_trip_id: query.exclude_trip_id,
            horizon: query.horizon,
        };

        let blocked = log_sweep(
            "start",
            started_at,
            blocked_start_dates(&trips, &snapshot, &request, guard),
        )?;
        Ok(blocked)
    }

    /// End dates the trip form must disable once `start_date` is chosen.
    pub fn blocked_end_dates(
        &self,
        query: &BlockedDatesQuery,
        start_date: NaiveDate,
        guard: &SweepGuard,
    ) -> Result<BTreeSet<NaiveDate>, TripServiceError> {
        let started_at = Instant::now();
        let trips = self.trips.list_trips(&TripListQuery::all())?;
        let snapshot = self.exemption_snapshot(query.evaluation_date)?;
        let visa = self.bound_visa(query.visa_id)?;
        let request = BlockedDatesRequest {
            evaluation_date: query.evaluation_date,
            bound_visa: visa.as_ref(),
            exclude_trip_id: query.exclude_trip_id,
            horizon: query.horizon,
        };

        let blocked = log_sweep(
            "end",
            started_at,
            blocked_end_dates(&trips, &snapshot, &request, start_date, guard),
        )?;
        Ok(blocked)
    }

    /// Stay presence per country; `range` defaults to the year before `as_of`.
    pub fn country_statistics(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
        as_of: NaiveDate,
    ) -> Result<BTreeMap<String, u32>, TripServiceError> {
        let (from, to) = range.unwrap_or_else(|| {
            (
                as_of
                    .checked_sub_months(Months::new(12))
                    .unwrap_or(NaiveDate::MIN),
                as_of,
            )
        });
        let trips = self.trips.list_trips(&TripListQuery {
            overlapping: Some((from.min(to), to.max(from))),
            ..TripListQuery::default()
        })?;
        Ok(country_statistics(&trips, from, to)?)
    }

    /// Per-day availability cells for `[from, to]`.
    pub fn calendar(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        evaluation_date: NaiveDate,
        guard: &SweepGuard,
    ) -> Result<Vec<CalendarDay>, TripServiceError> {
        let trips = self.trips.list_trips(&TripListQuery::all())?;
        let snapshot = self.exemption_snapshot(evaluation_date)?;
        Ok(calendar_days(&trips, &snapshot, from, to, guard)?)
    }

    fn exemption_snapshot(&self, as_of: NaiveDate) -> Result<ExemptionSnapshot, TripServiceError> {
        let countries = self.visas.exempt_countries(as_of)?;
        Ok(ExemptionSnapshot::from_countries(as_of, countries))
    }

    fn bound_visa(
        &self,
        visa_id: Option<VisaId>,
    ) -> Result<Option<Visa>, TripServiceError> {
        match visa_id {
            Some(id) => self
                .visas
                .get_visa(id)?
                .map(Some)
                .ok_or(TripServiceError::VisaNotFound(id)),
            None => Ok(None),
        }
    }

    fn ensure_savable(
        &self,
        trip: &Trip,
        evaluation_date: NaiveDate,
        exclude_trip_id: Option<TripId>,
    ) -> Result<(), TripServiceError> {
        let existing = self.trips.list_trips(&TripListQuery::all())?;
        if let Some(other) = existing.iter().find(|other| {
            Some(other.id) != exclude_trip_id && trip.overlaps(other.start_date(), other.end_date())
        }) {
            warn!(
                "event=trip_save module=service status=rejected reason=overlap start={} end={}",
                trip.start_date(),
                trip.end_date()
            );
            return Err(TripServiceError::OverlapsExistingTrip(other.id));
        }

        let snapshot = self.exemption_snapshot(evaluation_date)?;
        match check_availability(&existing, trip.segments(), &snapshot, exclude_trip_id)? {
            Availability::Available => Ok(()),
            Availability::Unavailable { anchor, days_used } => {
                warn!(
                    "event=trip_save module=service status=rejected reason=limit anchor={anchor} days_used={days_used}"
                );
                Err(TripServiceError::DatesUnavailable { anchor, days_used })
            }
        }
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn log_sweep(
    kind: &'static str,
    started_at: Instant,
    result: Result<BTreeSet<NaiveDate>, EngineError>,
) -> Result<BTreeSet<NaiveDate>, EngineError> {
    match &result {
        Ok(blocked) => info!(
            "event=blocked_dates module=ledger status=ok kind={kind} blocked={} duration_ms={}",
            blocked.len(),
            started_at.elapsed().as_millis()
        ),
        Err(EngineError::Superseded) => info!(
            "event=blocked_dates module=ledger status=superseded kind={kind} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=blocked_dates module=ledger status=error kind={kind} error={err}"
        ),
    }
    result
}
