//! Trip segment model.
//!
//! # Responsibility
//! - Represent one continuous stay or transit in a single country.
//! - Reject reversed date ranges at construction and deserialization.
//!
//! # Invariants
//! - `start_date <= end_date`, so `duration_days() >= 1`.
//! - `country` is trimmed and upper-cased.
//! - Transit segments are display-only and never chargeable.

use super::validation::{normalize_country, ValidationError};
use super::{inclusive_days, shift_days};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of presence a segment records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Physical stay; chargeable unless the country is exempt.
    Stay,
    /// Passing through; never counted.
    Transit,
}

/// Continuous presence in one country over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TripSegmentRecord")]
pub struct TripSegment {
    pub country: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: SegmentKind,
    /// Ordered free-text labels with no accounting effect.
    pub cities: Vec<String>,
}

#[derive(Deserialize)]
struct TripSegmentRecord {
    country: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    kind: SegmentKind,
    #[serde(default)]
    cities: Vec<String>,
}

impl TryFrom<TripSegmentRecord> for TripSegment {
    type Error = ValidationError;

    fn try_from(value: TripSegmentRecord) -> Result<Self, Self::Error> {
        Ok(Self::new(value.country, value.start_date, value.end_date, value.kind)?
            .with_cities(value.cities))
    }
}

impl TripSegment {
    /// Creates a validated segment.
    ///
    /// # Errors
    /// - `InvalidRange` when `end_date < start_date`.
    /// - `EmptyCountry` when `country` is blank.
    pub fn new(
        country: impl AsRef<str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kind: SegmentKind,
    ) -> Result<Self, ValidationError> {
        if end_date < start_date {
            return Err(ValidationError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            country: normalize_country(country.as_ref())?,
            start_date,
            end_date,
            kind,
            cities: Vec::new(),
        })
    }

    pub fn stay(
        country: impl AsRef<str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        Self::new(country, start_date, end_date, SegmentKind::Stay)
    }

    pub fn transit(
        country: impl AsRef<str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        Self::new(country, start_date, end_date, SegmentKind::Transit)
    }

    /// Replaces city labels, dropping blank entries.
    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities
            .into_iter()
            .map(Into::into)
            .map(|city| city.trim().to_string())
            .filter(|city| !city.is_empty())
            .collect();
        self
    }

    /// Re-checks invariants on a record whose public fields may have been edited.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.country.trim().is_empty() {
            return Err(ValidationError::EmptyCountry);
        }
        Ok(())
    }

    /// Inclusive number of calendar days covered.
    pub fn duration_days(&self) -> u32 {
        inclusive_days(self.start_date, self.end_date)
    }

    pub fn is_stay(&self) -> bool {
        self.kind == SegmentKind::Stay
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Intersects this segment with `[from, to]`, returning the clipped range.
    pub fn clip(&self, from: NaiveDate, to: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start_date.max(from);
        let end = self.end_date.min(to);
        (start <= end).then_some((start, end))
    }

    /// Calendar dates covered by this segment, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..i64::from(self.duration_days())).map(move |offset| shift_days(self.start_date, offset))
    }
}
