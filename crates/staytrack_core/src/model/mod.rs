//! Domain model for trips, stay segments and visas.
//!
//! # Responsibility
//! - Define the canonical records consumed by the stay-day ledger.
//! - Validate date ranges at construction so the engine never sees them.
//!
//! # Invariants
//! - Every segment satisfies `start_date <= end_date`.
//! - Exemption status is never stored on a segment; it is resolved per
//!   evaluation from visa records.

pub mod country;
pub mod days;
pub mod segment;
pub mod trip;
pub mod validation;
pub mod visa;

use chrono::{NaiveDate, TimeDelta};

/// Shifts a calendar date by `days`, saturating at the representable range.
pub(crate) fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(TimeDelta::days(days))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

/// Inclusive day count of `[start, end]`; zero when the range is reversed.
pub(crate) fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = end.signed_duration_since(start).num_days() + 1;
    u32::try_from(span.max(0)).unwrap_or(u32::MAX)
}
