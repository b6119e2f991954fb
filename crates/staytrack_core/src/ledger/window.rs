//! Window accountant.
//!
//! Counts distinct chargeable dates in `[anchor - 179, anchor]` from trips
//! already under way at the anchor. Exempt countries are taken from a
//! snapshot that must be resolved for the anchor itself, since exemption
//! follows visa expiry relative to the anchor.

use super::exemption::ExemptionSnapshot;
use super::stays::{LedgerScope, StayLedger};
use super::{EngineError, EngineResult};
use crate::model::days::DaysCalculation;
use crate::model::trip::Trip;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Computes the day accounting for the window ending at `period_end`.
///
/// An empty trip list is valid and yields zero days used.
///
/// # Errors
/// - `InconsistentExemptionSnapshot` when `exemptions` was resolved for
///   another date.
/// - `InvalidInput` when a stored segment is malformed.
pub fn calculate_days(
    trips: &[Trip],
    period_end: NaiveDate,
    exemptions: &ExemptionSnapshot,
) -> EngineResult<DaysCalculation> {
    exemptions.ensure_resolved_for(period_end)?;
    let ledger = StayLedger::build(trips, exemptions, LedgerScope::ElapsedAt(period_end))?;
    Ok(ledger.days_calculation(period_end, exemptions.countries()))
}

/// Stay presence per country inside `[from, to]` for statistics display.
///
/// Transit is excluded; exemption is ignored.
pub fn country_statistics(
    trips: &[Trip],
    from: NaiveDate,
    to: NaiveDate,
) -> EngineResult<BTreeMap<String, u32>> {
    if to < from {
        return Err(EngineError::InvalidInput(format!(
            "statistics range end ({to}) is before start ({from})"
        )));
    }
    let ledger = StayLedger::build(
        trips,
        &ExemptionSnapshot::empty(to),
        LedgerScope::All { exclude_trip: None },
    )?;
    Ok(ledger.presence_between(from, to))
}
