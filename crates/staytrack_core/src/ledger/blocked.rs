//! Blocked-date deriver for the trip form's date pickers.
//!
//! # Responsibility
//! - Produce start and end dates that cannot lead to a savable trip.
//!
//! # Invariants
//! - Never under-blocks the availability checker: a date left selectable
//!   passes `check_availability` for the smallest trip it can start or end,
//!   assuming every proposed day is chargeable.
//! - Sweeps are bounded by `SweepHorizon` around the evaluation date.
//! - One exemption snapshot is used for the whole sweep.

use super::availability::first_breach;
use super::day_set::{forward_window_max, DaySet};
use super::exemption::ExemptionSnapshot;
use super::last_anchor_touching;
use super::stays::{LedgerScope, StayLedger};
use super::sweep::SweepGuard;
use super::EngineResult;
use crate::model::days::{MAX_STAY_DAYS, PERIOD_DAYS};
use crate::model::shift_days;
use crate::model::trip::{Trip, TripId};
use crate::model::visa::Visa;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DEFAULT_HORIZON_DAYS: u32 = 365;
const MAX_HORIZON_DAYS: u32 = 730;

/// Range of dates a sweep covers, relative to the evaluation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepHorizon {
    pub lookbehind_days: u32,
    pub lookahead_days: u32,
}

impl Default for SweepHorizon {
    fn default() -> Self {
        Self {
            lookbehind_days: DEFAULT_HORIZON_DAYS,
            lookahead_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl SweepHorizon {
    /// Clamps both sides to the supported maximum.
    pub fn normalized(self) -> Self {
        Self {
            lookbehind_days: self.lookbehind_days.min(MAX_HORIZON_DAYS),
            lookahead_days: self.lookahead_days.min(MAX_HORIZON_DAYS),
        }
    }

    /// Inclusive `(first, last)` dates swept around `evaluation_date`.
    pub fn bounds(self, evaluation_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let horizon = self.normalized();
        (
            shift_days(evaluation_date, -i64::from(horizon.lookbehind_days)),
            shift_days(evaluation_date, i64::from(horizon.lookahead_days)),
        )
    }
}

/// Form state the deriver needs.
#[derive(Debug, Clone, Copy)]
pub struct BlockedDatesRequest<'a> {
    pub evaluation_date: NaiveDate,
    /// Visa the trip is being entered on; dates outside its validity block.
    pub bound_visa: Option<&'a Visa>,
    /// Trip being edited, excluded from the existing ledger.
    pub exclude_trip_id: Option<TripId>,
    pub horizon: SweepHorizon,
}

/// Dates that cannot be chosen as a trip start.
///
/// A start is blocked when it lies inside another trip, outside the bound
/// visa, or when some window containing it already holds the full ceiling.
pub fn blocked_start_dates(
    existing: &[Trip],
    exemptions: &ExemptionSnapshot,
    request: &BlockedDatesRequest<'_>,
    guard: &SweepGuard,
) -> EngineResult<BTreeSet<NaiveDate>> {
    let (from, to) = request.horizon.bounds(request.evaluation_date);
    let others = other_trips(existing, request.exclude_trip_id);
    let mut blocked = BTreeSet::new();

    for trip in &others {
        if let Some((start, end)) = clip(trip.start_date(), trip.end_date(), from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }
    if let Some(visa) = request.bound_visa {
        block_outside_visa(&mut blocked, visa, from, to);
    }
    guard.checkpoint()?;

    let ledger = StayLedger::build(
        existing,
        exemptions,
        LedgerScope::All {
            exclude_trip: request.exclude_trip_id,
        },
    )?;
    let saturated = saturated_starts(ledger.chargeable(), from, to, guard)?;
    blocked.extend(saturated);
    Ok(blocked)
}

/// Dates that cannot be chosen as the end of a trip starting at `start_date`.
///
/// Blocks dates before the start, outside the bound visa, from the next
/// existing trip onward, and from the first end at which the trip (counted
/// fully chargeable) breaches any window. The breach is monotone in the end
/// date, so the first failing end is located by binary search.
pub fn blocked_end_dates(
    existing: &[Trip],
    exemptions: &ExemptionSnapshot,
    request: &BlockedDatesRequest<'_>,
    start_date: NaiveDate,
    guard: &SweepGuard,
) -> EngineResult<BTreeSet<NaiveDate>> {
    let (from, to) = request.horizon.bounds(request.evaluation_date);
    let mut blocked = BTreeSet::new();

    if let Some(before_start) = start_date.pred_opt() {
        if let Some((start, end)) = clip(from, before_start, from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }
    if let Some(visa) = request.bound_visa {
        block_outside_visa(&mut blocked, visa, from, to);
    }

    let barrier = other_trips(existing, request.exclude_trip_id)
        .into_iter()
        .filter(|trip| trip.end_date() >= start_date)
        .map(|trip| trip.start_date().max(start_date))
        .min();
    if let Some(barrier) = barrier {
        if let Some((start, end)) = clip(barrier, to, from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }

    let ledger = StayLedger::build(
        existing,
        exemptions,
        LedgerScope::All {
            exclude_trip: request.exclude_trip_id,
        },
    )?;
    if let Some(first_bad) = first_breaching_end(ledger.chargeable(), start_date, to, guard)? {
        if let Some((start, end)) = clip(first_bad, to, from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }
    Ok(blocked)
}

/// Starts in `[from, to]` where some window containing them already holds
/// `MAX_STAY_DAYS` chargeable days.
pub(crate) fn saturated_starts(
    chargeable: &DaySet,
    from: NaiveDate,
    to: NaiveDate,
    guard: &SweepGuard,
) -> EngineResult<Vec<NaiveDate>> {
    let counts = forward_window_counts(chargeable, from, to);
    guard.checkpoint()?;

    let mut saturated = Vec::new();
    for (offset, peak) in forward_window_max(&counts, PERIOD_DAYS as usize)
        .into_iter()
        .enumerate()
    {
        if peak >= MAX_STAY_DAYS {
            saturated.push(shift_days(from, offset as i64));
        }
    }
    Ok(saturated)
}

/// Window counts for anchors `[from, to + 179]`.
pub(crate) fn forward_window_counts(chargeable: &DaySet, from: NaiveDate, to: NaiveDate) -> Vec<u32> {
    chargeable
        .window_counts(from, last_anchor_touching(to))
        .map(|(_, count)| count)
        .collect()
}

fn first_breaching_end(
    existing: &DaySet,
    start_date: NaiveDate,
    last_end: NaiveDate,
    guard: &SweepGuard,
) -> EngineResult<Option<NaiveDate>> {
    if last_end < start_date {
        return Ok(None);
    }
    let breaches = |end: NaiveDate| first_breach(existing, &DaySet::span(start_date, end)).is_some();

    guard.checkpoint()?;
    if !breaches(last_end) {
        return Ok(None);
    }

    let (mut lo, mut hi) = (0_i64, last_end.signed_duration_since(start_date).num_days());
    while lo < hi {
        guard.checkpoint()?;
        let mid = lo + (hi - lo) / 2;
        if breaches(shift_days(start_date, mid)) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(Some(shift_days(start_date, lo)))
}

fn other_trips(existing: &[Trip], exclude: Option<TripId>) -> Vec<&Trip> {
    existing
        .iter()
        .filter(|trip| Some(trip.id) != exclude)
        .collect()
}

fn block_outside_visa(blocked: &mut BTreeSet<NaiveDate>, visa: &Visa, from: NaiveDate, to: NaiveDate) {
    if let Some(before_issue) = visa.issue_date.pred_opt() {
        if let Some((start, end)) = clip(from, before_issue, from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }
    if let Some(after_expiry) = visa.expiry_date.succ_opt() {
        if let Some((start, end)) = clip(after_expiry, to, from, to) {
            blocked.extend(DaySet::span(start, end).iter());
        }
    }
}

fn clip(
    start: NaiveDate,
    end: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = start.max(from);
    let end = end.min(to);
    (start <= end).then_some((start, end))
}
