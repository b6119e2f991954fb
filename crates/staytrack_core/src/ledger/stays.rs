//! Chargeable and presence day sets built from trips.

use super::day_set::DaySet;
use super::exemption::ExemptionSnapshot;
use super::window_start;
use super::{EngineError, EngineResult};
use crate::model::days::DaysCalculation;
use crate::model::segment::TripSegment;
use crate::model::trip::{Trip, TripId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Which trips feed a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerScope {
    /// Trips already under way by the given date; future trips are ignored.
    ElapsedAt(NaiveDate),
    /// Every stored trip, optionally minus the one being edited.
    All { exclude_trip: Option<TripId> },
}

impl LedgerScope {
    fn admits(&self, trip: &Trip) -> bool {
        match self {
            Self::ElapsedAt(date) => trip.start_date() <= *date,
            Self::All { exclude_trip } => Some(trip.id) != *exclude_trip,
        }
    }
}

/// Day sets derived from one trip snapshot and one exemption snapshot.
#[derive(Debug, Clone, Default)]
pub struct StayLedger {
    chargeable: DaySet,
    chargeable_by_country: BTreeMap<String, DaySet>,
    presence_by_country: BTreeMap<String, DaySet>,
}

impl StayLedger {
    /// Builds the ledger.
    ///
    /// # Errors
    /// - `InvalidInput` when a stored segment violates its range invariant.
    pub fn build(
        trips: &[Trip],
        exemptions: &ExemptionSnapshot,
        scope: LedgerScope,
    ) -> EngineResult<Self> {
        let mut chargeable: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        let mut presence: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();

        for trip in trips.iter().filter(|trip| scope.admits(trip)) {
            for segment in trip.segments() {
                ensure_well_formed(segment)?;
                if !segment.is_stay() {
                    continue;
                }
                presence
                    .entry(segment.country.clone())
                    .or_default()
                    .extend(segment.days());
                if !exemptions.is_exempt(&segment.country) {
                    chargeable
                        .entry(segment.country.clone())
                        .or_default()
                        .extend(segment.days());
                }
            }
        }

        let chargeable_by_country: BTreeMap<String, DaySet> = chargeable
            .into_iter()
            .map(|(country, days)| (country, DaySet::from_dates(days)))
            .collect();
        let all_chargeable = chargeable_by_country
            .values()
            .fold(DaySet::default(), |acc, days| acc.union(days));

        Ok(Self {
            chargeable: all_chargeable,
            chargeable_by_country,
            presence_by_country: presence
                .into_iter()
                .map(|(country, days)| (country, DaySet::from_dates(days)))
                .collect(),
        })
    }

    /// All chargeable dates across countries.
    pub fn chargeable(&self) -> &DaySet {
        &self.chargeable
    }

    /// Chargeable days in the window ending at `anchor`.
    pub fn days_used_at(&self, anchor: NaiveDate) -> u32 {
        self.chargeable.count_in_window(anchor)
    }

    /// Stay presence per country inside `[from, to]`, ignoring exemption.
    pub fn presence_between(&self, from: NaiveDate, to: NaiveDate) -> BTreeMap<String, u32> {
        count_per_country(&self.presence_by_country, from, to)
    }

    /// Full accounting for the window ending at `anchor`.
    pub fn days_calculation(
        &self,
        anchor: NaiveDate,
        exempt_countries: &BTreeSet<String>,
    ) -> DaysCalculation {
        let period_start = window_start(anchor);
        let total_days_used = self.days_used_at(anchor);
        let (remaining_days, is_near_limit, is_over_limit) =
            DaysCalculation::limit_flags(total_days_used);

        DaysCalculation {
            total_days_used,
            remaining_days,
            period_start,
            period_end: anchor,
            is_near_limit,
            is_over_limit,
            exempt_countries: exempt_countries.clone(),
            days_per_country: self.presence_between(period_start, anchor),
            chargeable_days_per_country: count_per_country(
                &self.chargeable_by_country,
                period_start,
                anchor,
            ),
        }
    }
}

/// Chargeable dates of a proposed segment list under `exemptions`.
pub fn chargeable_days(segments: &[TripSegment], exemptions: &ExemptionSnapshot) -> DaySet {
    DaySet::from_dates(
        segments
            .iter()
            .filter(|segment| segment.is_stay() && !exemptions.is_exempt(&segment.country))
            .flat_map(TripSegment::days),
    )
}

pub(crate) fn ensure_well_formed(segment: &TripSegment) -> EngineResult<()> {
    segment
        .validate()
        .map_err(|err| EngineError::InvalidInput(format!("segment {}: {err}", segment.country)))
}

fn count_per_country(
    sets: &BTreeMap<String, DaySet>,
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<String, u32> {
    sets.iter()
        .map(|(country, days)| (country.clone(), days.count_between(from, to)))
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{chargeable_days, LedgerScope, StayLedger};
    use crate::ledger::exemption::ExemptionSnapshot;
    use crate::model::segment::TripSegment;
    use crate::model::trip::Trip;
    use chrono::NaiveDate;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::TimeDelta::days(offset)
    }

    fn trip(segments: Vec<TripSegment>) -> Trip {
        Trip::new(segments, day(0)).unwrap()
    }

    #[test]
    fn elapsed_scope_ignores_trips_starting_after_date() {
        let past = trip(vec![TripSegment::stay("DE", day(0), day(9)).unwrap()]);
        let future = trip(vec![TripSegment::stay("DE", day(20), day(29)).unwrap()]);
        let snapshot = ExemptionSnapshot::empty(day(15));

        let ledger =
            StayLedger::build(&[past, future], &snapshot, LedgerScope::ElapsedAt(day(15))).unwrap();
        assert_eq!(ledger.chargeable().len(), 10);
    }

    #[test]
    fn all_scope_can_exclude_the_trip_being_edited() {
        let kept = trip(vec![TripSegment::stay("DE", day(0), day(9)).unwrap()]);
        let edited = trip(vec![TripSegment::stay("FR", day(20), day(24)).unwrap()]);
        let snapshot = ExemptionSnapshot::empty(day(0));
        let scope = LedgerScope::All {
            exclude_trip: Some(edited.id),
        };

        let ledger = StayLedger::build(&[kept, edited], &snapshot, scope).unwrap();
        assert_eq!(ledger.chargeable().len(), 10);
    }

    #[test]
    fn presence_keeps_exempt_countries_but_chargeable_does_not() {
        let trips = vec![trip(vec![
            TripSegment::stay("PL", day(0), day(9)).unwrap(),
            TripSegment::transit("CZ", day(10), day(10)).unwrap(),
            TripSegment::stay("AT", day(10), day(12)).unwrap(),
        ])];
        let snapshot = ExemptionSnapshot::from_countries(day(12), ["PL"]);
        let ledger =
            StayLedger::build(&trips, &snapshot, LedgerScope::ElapsedAt(day(12))).unwrap();

        let calc = ledger.days_calculation(day(12), snapshot.countries());
        assert_eq!(calc.total_days_used, 3);
        assert_eq!(calc.days_per_country.get("PL"), Some(&10));
        assert_eq!(calc.days_per_country.get("AT"), Some(&3));
        assert_eq!(calc.days_per_country.get("CZ"), None);
        assert_eq!(calc.chargeable_days_per_country.get("PL"), None);
    }

    #[test]
    fn proposed_chargeable_days_skip_transit_and_exempt() {
        let segments = vec![
            TripSegment::stay("PL", day(0), day(4)).unwrap(),
            TripSegment::transit("DE", day(5), day(5)).unwrap(),
            TripSegment::stay("FR", day(5), day(6)).unwrap(),
        ];
        let snapshot = ExemptionSnapshot::from_countries(day(0), ["PL"]);
        let days = chargeable_days(&segments, &snapshot);
        assert_eq!(days.len(), 2);
        assert_eq!(days.first(), Some(day(5)));
    }
}
