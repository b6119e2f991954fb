//! Output records of the stay-day ledger.

use super::trip::TripId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Length of the rolling window, anchor included.
pub const PERIOD_DAYS: u32 = 180;
/// Ceiling of chargeable days inside any window.
pub const MAX_STAY_DAYS: u32 = 90;
/// Non-blocking warning threshold.
pub const WARNING_THRESHOLD: u32 = 75;

/// Day accounting for the window ending at `period_end`.
///
/// `total_days_used` and `chargeable_days_per_country` drive limit decisions.
/// `days_per_country` is statistical presence: it includes exempt countries
/// and is never used for limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysCalculation {
    pub total_days_used: u32,
    pub remaining_days: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub is_near_limit: bool,
    pub is_over_limit: bool,
    pub exempt_countries: BTreeSet<String>,
    pub days_per_country: BTreeMap<String, u32>,
    pub chargeable_days_per_country: BTreeMap<String, u32>,
}

impl DaysCalculation {
    pub(crate) fn limit_flags(total_days_used: u32) -> (u32, bool, bool) {
        (
            MAX_STAY_DAYS.saturating_sub(total_days_used),
            total_days_used >= WARNING_THRESHOLD,
            total_days_used > MAX_STAY_DAYS,
        )
    }
}

/// Per-date projection for calendar rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// Whether a new single-day stay starting here would pass the checker.
    pub is_available: bool,
    pub is_in_trip: bool,
    pub trip_id: Option<TripId>,
    /// `MAX_STAY_DAYS` minus chargeable days in the window ending here.
    pub remaining_days_on_date: u32,
}
