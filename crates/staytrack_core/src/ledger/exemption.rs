//! Exemption snapshots.
//!
//! A snapshot is the set of exempt countries resolved once for one
//! evaluation date. Every anchor inside a single evaluation reads the same
//! snapshot, so a visa edited mid-sweep cannot split the result.

use super::{EngineError, EngineResult};
use crate::model::visa::Visa;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExemptionSnapshot {
    resolved_for: NaiveDate,
    countries: BTreeSet<String>,
}

impl ExemptionSnapshot {
    /// Resolves exempt countries from visa records as of `date`.
    pub fn resolve<'a>(visas: impl IntoIterator<Item = &'a Visa>, date: NaiveDate) -> Self {
        Self::from_countries(
            date,
            visas
                .into_iter()
                .filter_map(|visa| visa.exempt_country_on(date)),
        )
    }

    /// Builds a snapshot from already-resolved country codes.
    pub fn from_countries<I, S>(resolved_for: NaiveDate, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            resolved_for,
            countries: countries
                .into_iter()
                .map(|country| country.as_ref().trim().to_ascii_uppercase())
                .filter(|country| !country.is_empty())
                .collect(),
        }
    }

    pub fn empty(resolved_for: NaiveDate) -> Self {
        Self {
            resolved_for,
            countries: BTreeSet::new(),
        }
    }

    pub fn resolved_for(&self) -> NaiveDate {
        self.resolved_for
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn is_exempt(&self, country: &str) -> bool {
        self.countries.contains(country)
    }

    /// Fails when this snapshot was not resolved for `date`.
    pub fn ensure_resolved_for(&self, date: NaiveDate) -> EngineResult<()> {
        if self.resolved_for != date {
            return Err(EngineError::InconsistentExemptionSnapshot {
                resolved_for: self.resolved_for,
                evaluated_at: date,
            });
        }
        Ok(())
    }
}
