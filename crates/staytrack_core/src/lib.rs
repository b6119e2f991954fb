//! Core domain logic for StayTrack.
//! Owns the 90/180 stay-day ledger and the trip/visa records it reads.

pub mod db;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use ledger::availability::{check_availability, Availability};
pub use ledger::blocked::{blocked_end_dates, blocked_start_dates, BlockedDatesRequest, SweepHorizon};
pub use ledger::calendar::calendar_days;
pub use ledger::exemption::ExemptionSnapshot;
pub use ledger::sweep::{RecalcCoordinator, SweepGuard};
pub use ledger::window::{calculate_days, country_statistics};
pub use ledger::{EngineError, EngineResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::days::{CalendarDay, DaysCalculation, MAX_STAY_DAYS, PERIOD_DAYS, WARNING_THRESHOLD};
pub use model::segment::{SegmentKind, TripSegment};
pub use model::trip::{Trip, TripId, TripPurpose, TripStatus};
pub use model::validation::ValidationError;
pub use model::visa::{Visa, VisaCategory, VisaEntries, VisaId};
pub use repo::{
    RepoError, RepoResult, SqliteTripRepository, SqliteVisaRepository, TripListQuery,
    TripRepository, VisaRepository,
};
pub use service::{
    BlockedDatesQuery, TripDraft, TripService, TripServiceError, VisaService, VisaServiceError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
