//! Calendar projection of per-day availability.

use super::blocked::{forward_window_counts, saturated_starts};
use super::exemption::ExemptionSnapshot;
use super::stays::{LedgerScope, StayLedger};
use super::sweep::SweepGuard;
use super::{EngineError, EngineResult};
use crate::model::days::{CalendarDay, MAX_STAY_DAYS};
use crate::model::shift_days;
use crate::model::trip::{Trip, TripId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

const MAX_CALENDAR_DAYS: i64 = 1_461;

/// Projects `[from, to]` into calendar cells.
///
/// `is_available` uses the same rule as the start-date picker without the
/// visa constraint: the date is outside every trip and no window containing
/// it is already saturated.
///
/// # Errors
/// - `InvalidInput` for a reversed range or one longer than four years.
pub fn calendar_days(
    existing: &[Trip],
    exemptions: &ExemptionSnapshot,
    from: NaiveDate,
    to: NaiveDate,
    guard: &SweepGuard,
) -> EngineResult<Vec<CalendarDay>> {
    let span = to.signed_duration_since(from).num_days();
    if span < 0 {
        return Err(EngineError::InvalidInput(format!(
            "calendar range end ({to}) is before start ({from})"
        )));
    }
    if span >= MAX_CALENDAR_DAYS {
        return Err(EngineError::InvalidInput(format!(
            "calendar range of {} days exceeds {MAX_CALENDAR_DAYS}",
            span + 1
        )));
    }

    let ledger = StayLedger::build(existing, exemptions, LedgerScope::All { exclude_trip: None })?;
    let counts = forward_window_counts(ledger.chargeable(), from, to);
    let saturated: BTreeSet<NaiveDate> = saturated_starts(ledger.chargeable(), from, to, guard)?
        .into_iter()
        .collect();
    let occupied = trip_days(existing, from, to);

    Ok((0..=span)
        .map(|offset| {
            let date = shift_days(from, offset);
            let trip_id = occupied.get(&date).copied();
            let used = counts.get(offset as usize).copied().unwrap_or_default();
            CalendarDay {
                date,
                is_available: trip_id.is_none() && !saturated.contains(&date),
                is_in_trip: trip_id.is_some(),
                trip_id,
                remaining_days_on_date: MAX_STAY_DAYS.saturating_sub(used),
            }
        })
        .collect())
}

fn trip_days(trips: &[Trip], from: NaiveDate, to: NaiveDate) -> BTreeMap<NaiveDate, TripId> {
    let mut days = BTreeMap::new();
    for trip in trips {
        let start = trip.start_date().max(from);
        let end = trip.end_date().min(to);
        let mut date = start;
        while date <= end {
            days.entry(date).or_insert(trip.id);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
    }
    days
}
