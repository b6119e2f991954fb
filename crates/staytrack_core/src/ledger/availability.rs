//! Availability checker: the authoritative save-time gate.
//!
//! # Invariants
//! - Every window that contains at least one proposed chargeable day is
//!   checked, i.e. anchors from the first proposed chargeable day through
//!   179 days after the last one.
//! - Existing and proposed days are merged as a set before counting.
//! - A proposal without chargeable days (all exempt or transit) is available.

use super::day_set::DaySet;
use super::exemption::ExemptionSnapshot;
use super::last_anchor_touching;
use super::stays::{chargeable_days, ensure_well_formed, LedgerScope, StayLedger};
use super::{EngineError, EngineResult};
use crate::model::days::MAX_STAY_DAYS;
use crate::model::segment::TripSegment;
use crate::model::trip::{Trip, TripId};
use chrono::NaiveDate;
use serde::Serialize;

/// Outcome of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    Available,
    /// The earliest breaching window and its chargeable-day total.
    Unavailable { anchor: NaiveDate, days_used: u32 },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Checks whether `proposed` can be added to `existing` without any touched
/// window exceeding the ceiling.
///
/// Pass `exclude_trip_id` when editing, so the trip's pre-edit segments are
/// not counted against its replacement.
///
/// # Errors
/// - `InvalidInput` when `proposed` is empty or a segment is malformed.
pub fn check_availability(
    existing: &[Trip],
    proposed: &[TripSegment],
    exemptions: &ExemptionSnapshot,
    exclude_trip_id: Option<TripId>,
) -> EngineResult<Availability> {
    if proposed.is_empty() {
        return Err(EngineError::InvalidInput(
            "proposed trip has no segments".to_string(),
        ));
    }
    for segment in proposed {
        ensure_well_formed(segment)?;
    }

    let ledger = StayLedger::build(
        existing,
        exemptions,
        LedgerScope::All {
            exclude_trip: exclude_trip_id,
        },
    )?;
    let proposed_days = chargeable_days(proposed, exemptions);

    Ok(match first_breach(ledger.chargeable(), &proposed_days) {
        Some((anchor, days_used)) => Availability::Unavailable { anchor, days_used },
        None => Availability::Available,
    })
}

/// Earliest anchor whose window holds a proposed day and exceeds the ceiling.
pub(crate) fn first_breach(existing: &DaySet, proposed: &DaySet) -> Option<(NaiveDate, u32)> {
    let (first, last) = (proposed.first()?, proposed.last()?);
    let last_anchor = last_anchor_touching(last);
    let combined = existing.union(proposed);

    combined
        .window_counts(first, last_anchor)
        .zip(proposed.window_counts(first, last_anchor))
        .find(|((_, total), (_, own))| *own > 0 && *total > MAX_STAY_DAYS)
        .map(|((anchor, total), _)| (anchor, total))
}
