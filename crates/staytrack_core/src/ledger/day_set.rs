//! Sorted calendar-date sets and sliding window counts.
//!
//! # Invariants
//! - `DaySet` is strictly increasing; duplicates collapse on construction.
//! - `WindowCounts` advances two cursors monotonically, so sweeping `n`
//!   consecutive anchors costs `O(n + |set|)`.

use super::window_start;
use crate::model::shift_days;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySet {
    days: Vec<NaiveDate>,
}

impl DaySet {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut days: Vec<NaiveDate> = dates.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        Self { days }
    }

    /// Every date of the inclusive span `[start, end]`.
    pub fn span(start: NaiveDate, end: NaiveDate) -> Self {
        let len = end.signed_duration_since(start).num_days() + 1;
        Self {
            days: (0..len.max(0)).map(|offset| shift_days(start, offset)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.days.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.days.last().copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }

    /// Number of dates inside `[from, to]`.
    pub fn count_between(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        if to < from {
            return 0;
        }
        let lo = self.days.partition_point(|day| *day < from);
        let hi = self.days.partition_point(|day| *day <= to);
        u32::try_from(hi - lo).unwrap_or(u32::MAX)
    }

    /// Number of dates inside the window anchored at `anchor`.
    pub fn count_in_window(&self, anchor: NaiveDate) -> u32 {
        self.count_between(window_start(anchor), anchor)
    }

    pub fn union(&self, other: &DaySet) -> DaySet {
        let mut days = Vec::with_capacity(self.days.len() + other.days.len());
        let (mut i, mut j) = (0, 0);
        while i < self.days.len() && j < other.days.len() {
            let (a, b) = (self.days[i], other.days[j]);
            if a < b {
                days.push(a);
                i += 1;
            } else if b < a {
                days.push(b);
                j += 1;
            } else {
                days.push(a);
                i += 1;
                j += 1;
            }
        }
        days.extend_from_slice(&self.days[i..]);
        days.extend_from_slice(&other.days[j..]);
        DaySet { days }
    }

    /// Window counts for every anchor in `[first_anchor, last_anchor]`.
    pub fn window_counts(&self, first_anchor: NaiveDate, last_anchor: NaiveDate) -> WindowCounts<'_> {
        WindowCounts {
            days: &self.days,
            next_anchor: Some(first_anchor),
            last_anchor,
            lo: 0,
            hi: 0,
        }
    }
}

/// Sliding `(anchor, count)` iterator over consecutive anchors.
pub struct WindowCounts<'a> {
    days: &'a [NaiveDate],
    next_anchor: Option<NaiveDate>,
    last_anchor: NaiveDate,
    lo: usize,
    hi: usize,
}

impl Iterator for WindowCounts<'_> {
    type Item = (NaiveDate, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let anchor = self.next_anchor.filter(|anchor| *anchor <= self.last_anchor)?;
        let from = window_start(anchor);

        while self.hi < self.days.len() && self.days[self.hi] <= anchor {
            self.hi += 1;
        }
        while self.lo < self.hi && self.days[self.lo] < from {
            self.lo += 1;
        }

        self.next_anchor = anchor.succ_opt();
        let count = u32::try_from(self.hi - self.lo).unwrap_or(u32::MAX);
        Some((anchor, count))
    }
}

/// For each index `i`, the maximum of `counts[i..i + width]`.
///
/// Returns `counts.len() + 1 - width` values (empty when too short).
pub(crate) fn forward_window_max(counts: &[u32], width: usize) -> Vec<u32> {
    use std::collections::VecDeque;

    if width == 0 || counts.len() < width {
        return Vec::new();
    }
    let mut maxima = Vec::with_capacity(counts.len() + 1 - width);
    let mut candidates: VecDeque<usize> = VecDeque::new();
    for (index, value) in counts.iter().enumerate() {
        while candidates
            .back()
            .is_some_and(|&back| counts[back] <= *value)
        {
            candidates.pop_back();
        }
        candidates.push_back(index);

        if index + 1 >= width {
            let window_begin = index + 1 - width;
            while candidates.front().is_some_and(|&front| front < window_begin) {
                candidates.pop_front();
            }
            if let Some(&front) = candidates.front() {
                maxima.push(counts[front]);
            }
        }
    }
    maxima
}

#[cfg(test)]
mod tests {
    use super::{forward_window_max, DaySet};
    use crate::ledger::window_start;
    use chrono::NaiveDate;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::TimeDelta::days(offset)
    }

    #[test]
    fn from_dates_deduplicates() {
        let set = DaySet::from_dates([day(3), day(1), day(3), day(2)]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.first(), Some(day(1)));
        assert_eq!(set.last(), Some(day(3)));
    }

    #[test]
    fn union_counts_shared_dates_once() {
        let a = DaySet::span(day(1), day(5));
        let b = DaySet::span(day(3), day(8));
        assert_eq!(a.union(&b).len(), 8);
    }

    #[test]
    fn sliding_counts_match_direct_counts() {
        let set = DaySet::from_dates(
            (0..400)
                .filter(|offset| offset % 3 != 0 || offset % 7 == 0)
                .map(day),
        );
        let sliding: Vec<_> = set.window_counts(day(-10), day(420)).collect();
        assert_eq!(sliding.len(), 431);
        for (anchor, count) in sliding {
            assert_eq!(count, set.count_between(window_start(anchor), anchor), "{anchor}");
        }
    }

    #[test]
    fn window_boundary_is_inclusive_of_anchor_minus_179() {
        let anchor = day(300);
        let edge = DaySet::from_dates([window_start(anchor)]);
        let outside = DaySet::from_dates([window_start(anchor).pred_opt().unwrap()]);
        assert_eq!(edge.count_in_window(anchor), 1);
        assert_eq!(outside.count_in_window(anchor), 0);
    }

    #[test]
    fn forward_window_max_tracks_running_maximum() {
        let counts = [1, 3, 2, 5, 4, 0, 0];
        assert_eq!(forward_window_max(&counts, 3), vec![3, 5, 5, 5, 4]);
        assert!(forward_window_max(&counts, 8).is_empty());
    }
}
