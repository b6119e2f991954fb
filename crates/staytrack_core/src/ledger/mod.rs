//! Stay-day ledger: rolling 90/180 accounting over trip segments.
//!
//! # Responsibility
//! - Count chargeable days in the trailing window of any anchor date.
//! - Decide whether a proposed trip breaches the ceiling anywhere it touches.
//! - Derive date-picker blocked sets that never under-block the checker.
//!
//! # Invariants
//! - Every entry point is a pure function of trips, one exemption snapshot
//!   and explicit dates; nothing reads the system clock.
//! - Day counting is a union of calendar dates, never a sum of durations.
//! - Transit segments and exempt countries never produce chargeable days.

pub mod availability;
pub mod blocked;
pub mod calendar;
pub mod day_set;
pub mod exemption;
pub mod stays;
pub mod sweep;
pub mod window;

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Caller contract violations surfaced by the ledger.
///
/// None of these should be defaulted to "available"; callers must block the
/// save path when they see one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Empty or malformed segment/date input.
    InvalidInput(String),
    /// Snapshot was resolved for a different date than the one evaluated.
    InconsistentExemptionSnapshot {
        resolved_for: NaiveDate,
        evaluated_at: NaiveDate,
    },
    /// A newer recalculation started; this result must be discarded.
    Superseded,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid ledger input: {message}"),
            Self::InconsistentExemptionSnapshot {
                resolved_for,
                evaluated_at,
            } => write!(
                f,
                "exemption snapshot resolved for {resolved_for} used to evaluate {evaluated_at}"
            ),
            Self::Superseded => write!(f, "calculation superseded by a newer request"),
        }
    }
}

impl Error for EngineError {}

/// First day of the window anchored at `anchor` (`anchor - 179`).
pub fn window_start(anchor: NaiveDate) -> NaiveDate {
    crate::model::shift_days(anchor, -(i64::from(crate::model::days::PERIOD_DAYS) - 1))
}

/// Last anchor whose window still contains `date` (`date + 179`).
pub(crate) fn last_anchor_touching(date: NaiveDate) -> NaiveDate {
    crate::model::shift_days(date, i64::from(crate::model::days::PERIOD_DAYS) - 1)
}
