//! Construction-time validation errors for domain records.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejection reasons raised before a record can reach storage or the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `end` is earlier than `start`.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Country code is blank after trimming.
    EmptyCountry,
    /// A trip must carry at least one segment.
    EmptyTrip,
    /// Two segments of one trip overlap by more than a shared travel day.
    OverlappingSegments {
        first: (NaiveDate, NaiveDate),
        second: (NaiveDate, NaiveDate),
    },
    /// Visa expires before it is issued.
    InvalidVisaWindow {
        issue_date: NaiveDate,
        expiry_date: NaiveDate,
    },
    /// Visa number is blank after trimming.
    EmptyVisaNumber,
    /// Long-stay visas and residence permits must name their issuing country.
    MissingVisaCountry,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "end date ({end}) must be >= start date ({start})")
            }
            Self::EmptyCountry => write!(f, "country code must not be blank"),
            Self::EmptyTrip => write!(f, "trip must contain at least one segment"),
            Self::OverlappingSegments { first, second } => write!(
                f,
                "segments {}..{} and {}..{} overlap by more than one travel day",
                first.0, first.1, second.0, second.1
            ),
            Self::InvalidVisaWindow {
                issue_date,
                expiry_date,
            } => write!(
                f,
                "visa expiry ({expiry_date}) must be >= issue date ({issue_date})"
            ),
            Self::EmptyVisaNumber => write!(f, "visa number must not be blank"),
            Self::MissingVisaCountry => {
                write!(f, "long-stay visa or residence permit requires a country")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims and upper-cases a country code, rejecting blank input.
pub(crate) fn normalize_country(country: &str) -> Result<String, ValidationError> {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCountry);
    }
    Ok(trimmed.to_ascii_uppercase())
}
