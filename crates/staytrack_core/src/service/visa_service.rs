//! Visa use-case service.
//!
//! # Responsibility
//! - Manage visa and residence-permit records.
//! - Resolve exempt-country snapshots for a given evaluation date.
//!
//! # Invariants
//! - Expiry housekeeping only touches records that expired before `as_of`.

use crate::ledger::exemption::ExemptionSnapshot;
use crate::model::validation::ValidationError;
use crate::model::visa::{Visa, VisaId};
use crate::repo::{RepoError, VisaRepository};
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for visa use-cases.
#[derive(Debug)]
pub enum VisaServiceError {
    Validation(ValidationError),
    VisaNotFound(VisaId),
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for VisaServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::VisaNotFound(id) => write!(f, "visa not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent visa state: {details}"),
        }
    }
}

impl Error for VisaServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for VisaServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for VisaServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::VisaNotFound(id) => Self::VisaNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Visa service facade over repository implementations.
pub struct VisaService<R: VisaRepository> {
    repo: R,
}

impl<R: VisaRepository> VisaService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a new record and returns the persisted state.
    pub fn add_visa(&self, visa: &Visa) -> Result<Visa, VisaServiceError> {
        let id = self.repo.create_visa(visa)?;
        info!(
            "event=visa_add module=service status=ok category={:?} exemption_source={}",
            visa.category,
            visa.category.is_long_stay()
        );
        self.repo
            .get_visa(id)?
            .ok_or(VisaServiceError::InconsistentState(
                "created visa not found in read-back",
            ))
    }

    /// Replaces all fields of an existing record.
    pub fn update_visa(&self, visa: &Visa) -> Result<Visa, VisaServiceError> {
        self.repo.update_visa(visa)?;
        self.repo
            .get_visa(visa.id)?
            .ok_or(VisaServiceError::InconsistentState(
                "updated visa not found in read-back",
            ))
    }

    pub fn delete_visa(&self, id: VisaId) -> Result<(), VisaServiceError> {
        self.repo.delete_visa(id)?;
        Ok(())
    }

    pub fn get_visa(&self, id: VisaId) -> Result<Visa, VisaServiceError> {
        self.repo
            .get_visa(id)?
            .ok_or(VisaServiceError::VisaNotFound(id))
    }

    pub fn list_visas(&self, active_only: bool) -> Result<Vec<Visa>, VisaServiceError> {
        Ok(self.repo.list_visas(active_only)?)
    }

    /// Marks every record that expired before `as_of` inactive.
    ///
    /// Returns the number of records changed.
    pub fn deactivate_expired_visas(&self, as_of: NaiveDate) -> Result<usize, VisaServiceError> {
        let changed = self.repo.deactivate_expired(as_of)?;
        info!("event=visa_deactivate_expired module=service status=ok as_of={as_of} changed={changed}");
        Ok(changed)
    }

    /// Resolves the exempt-country set once for `as_of`.
    pub fn exemption_snapshot(
        &self,
        as_of: NaiveDate,
    ) -> Result<ExemptionSnapshot, VisaServiceError> {
        let countries = self.repo.exempt_countries(as_of)?;
        Ok(ExemptionSnapshot::from_countries(as_of, countries))
    }
}
