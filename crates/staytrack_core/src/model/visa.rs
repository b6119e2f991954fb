//! Visa and residence-permit records.
//!
//! # Responsibility
//! - Describe the documents a traveller holds.
//! - Decide whether a record is an exemption source for a country on a date.
//!
//! # Invariants
//! - `issue_date <= expiry_date`.
//! - Only long-stay visas and residence permits with a country can exempt.
//! - Exemption is evaluated against an explicit date, never ambient time.

use super::validation::{normalize_country, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a visa record.
pub type VisaId = Uuid;

/// Document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaCategory {
    /// Short-stay Schengen visa; subject to the 90/180 rule.
    TypeC,
    /// National long-stay visa.
    TypeD,
    ResidencePermit,
}

impl VisaCategory {
    /// Whether documents of this category remove their country from counting.
    pub fn is_long_stay(self) -> bool {
        matches!(self, Self::TypeD | Self::ResidencePermit)
    }
}

/// Number of entries a visa allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaEntries {
    Single,
    Double,
    #[default]
    Multi,
}

/// A visa or residence permit held by the traveller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visa {
    pub id: VisaId,
    pub visa_number: String,
    pub category: VisaCategory,
    /// Issuing country; required for long-stay categories.
    pub country: Option<String>,
    pub issue_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub duration_of_stay: u32,
    pub entries: VisaEntries,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl Visa {
    /// Creates an active, validated visa with a generated id.
    pub fn new(
        visa_number: impl AsRef<str>,
        category: VisaCategory,
        country: Option<&str>,
        issue_date: NaiveDate,
        expiry_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let visa = Self {
            id: Uuid::new_v4(),
            visa_number: visa_number.as_ref().trim().to_string(),
            category,
            country: country.map(normalize_country).transpose()?,
            issue_date,
            expiry_date,
            duration_of_stay: 90,
            entries: VisaEntries::default(),
            is_active: true,
            notes: None,
        };
        visa.validate()?;
        Ok(visa)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.visa_number.trim().is_empty() {
            return Err(ValidationError::EmptyVisaNumber);
        }
        if self.expiry_date < self.issue_date {
            return Err(ValidationError::InvalidVisaWindow {
                issue_date: self.issue_date,
                expiry_date: self.expiry_date,
            });
        }
        if self.category.is_long_stay() && self.country.is_none() {
            return Err(ValidationError::MissingVisaCountry);
        }
        if let Some(country) = &self.country {
            if country.trim().is_empty() {
                return Err(ValidationError::EmptyCountry);
            }
        }
        Ok(())
    }

    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiry_date < date
    }

    /// Signed days from `date` to expiry; negative once expired.
    pub fn days_until_expiry(&self, date: NaiveDate) -> i64 {
        self.expiry_date.signed_duration_since(date).num_days()
    }

    /// Returns the exempted country when this record is an active long-stay
    /// source that has not expired by `date`.
    pub fn exempt_country_on(&self, date: NaiveDate) -> Option<&str> {
        if !self.is_active || !self.category.is_long_stay() || self.expiry_date < date {
            return None;
        }
        self.country.as_deref()
    }
}
