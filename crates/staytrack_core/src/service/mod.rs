//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Resolve one exemption snapshot per evaluation and hand it to the ledger.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod trip_service;
pub mod visa_service;

pub use trip_service::{BlockedDatesQuery, TripDraft, TripService, TripServiceError};
pub use visa_service::{VisaService, VisaServiceError};
