//! Trip model.
//!
//! # Responsibility
//! - Group the segments of one travel event under a stable id.
//! - Derive span and display status from segments and an explicit date.
//!
//! # Invariants
//! - A trip carries at least one segment, ordered by start date.
//! - Segments may share a border-crossing day but never overlap further.
//! - `start_date()`/`end_date()` are the min/max over segments.
//! - Edits replace the full segment set; segments are never patched in place.

use super::segment::TripSegment;
use super::validation::ValidationError;
use super::visa::VisaId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a trip.
pub type TripId = Uuid;

/// Why the trip was taken. No accounting effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripPurpose {
    #[default]
    Tourism,
    Business,
    Family,
    Medical,
    Education,
    Other,
}

/// Display classification relative to an evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Planned,
    Ongoing,
    Past,
}

/// One travel event made of ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TripRecord")]
pub struct Trip {
    pub id: TripId,
    /// Visa the trip was entered on, if the user bound one.
    pub visa_id: Option<VisaId>,
    segments: Vec<TripSegment>,
    pub purpose: TripPurpose,
    /// Stored at save time as `start_date > evaluation_date`.
    pub is_planned: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDate,
}

#[derive(Deserialize)]
struct TripRecord {
    id: TripId,
    visa_id: Option<VisaId>,
    segments: Vec<TripSegment>,
    purpose: TripPurpose,
    is_planned: bool,
    notes: Option<String>,
    created_at: NaiveDate,
}

impl TryFrom<TripRecord> for Trip {
    type Error = ValidationError;

    fn try_from(value: TripRecord) -> Result<Self, Self::Error> {
        let mut trip = Self::with_id(value.id, value.segments, value.created_at)?;
        trip.visa_id = value.visa_id;
        trip.purpose = value.purpose;
        trip.is_planned = value.is_planned;
        trip.notes = value.notes;
        Ok(trip)
    }
}

impl Trip {
    /// Creates a trip with a generated id.
    pub fn new(segments: Vec<TripSegment>, created_at: NaiveDate) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), segments, created_at)
    }

    /// Creates a trip with a caller-provided id (storage read-back, edits).
    ///
    /// Segments are sorted by `(start_date, end_date)` before validation.
    pub fn with_id(
        id: TripId,
        segments: Vec<TripSegment>,
        created_at: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let segments = order_segments(segments)?;
        Ok(Self {
            id,
            visa_id: None,
            segments,
            purpose: TripPurpose::default(),
            is_planned: false,
            notes: None,
            created_at,
        })
    }

    pub fn segments(&self) -> &[TripSegment] {
        &self.segments
    }

    /// Replaces the whole segment set.
    pub fn replace_segments(&mut self, segments: Vec<TripSegment>) -> Result<(), ValidationError> {
        self.segments = order_segments(segments)?;
        Ok(())
    }

    pub fn start_date(&self) -> NaiveDate {
        self.segments
            .iter()
            .map(|segment| segment.start_date)
            .min()
            .unwrap_or(self.created_at)
    }

    pub fn end_date(&self) -> NaiveDate {
        self.segments
            .iter()
            .map(|segment| segment.end_date)
            .max()
            .unwrap_or(self.created_at)
    }

    pub fn duration_days(&self) -> u32 {
        super::inclusive_days(self.start_date(), self.end_date())
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date() <= end && start <= self.end_date()
    }

    pub fn visits_country(&self, country: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.country.eq_ignore_ascii_case(country.trim()))
    }

    /// Classifies the trip against `date`.
    pub fn status_on(&self, date: NaiveDate) -> TripStatus {
        if self.start_date() > date {
            TripStatus::Planned
        } else if self.end_date() >= date {
            TripStatus::Ongoing
        } else {
            TripStatus::Past
        }
    }
}

fn order_segments(mut segments: Vec<TripSegment>) -> Result<Vec<TripSegment>, ValidationError> {
    if segments.is_empty() {
        return Err(ValidationError::EmptyTrip);
    }
    for segment in &segments {
        segment.validate()?;
    }
    segments.sort_by_key(|segment| (segment.start_date, segment.end_date));

    let mut widest = &segments[0];
    for segment in &segments[1..] {
        if segment.start_date < widest.end_date {
            return Err(ValidationError::OverlappingSegments {
                first: (widest.start_date, widest.end_date),
                second: (segment.start_date, segment.end_date),
            });
        }
        if segment.end_date > widest.end_date {
            widest = segment;
        }
    }
    Ok(segments)
}
