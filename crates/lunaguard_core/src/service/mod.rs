//! Core use-case services.
//!
//! # Responsibility
//! - Turn screen-level flows into coordinator calls.
//! - Post the success notices the UI shows after each flow.
//!
//! Services borrow the session coordinator mutably for their lifetime, so a
//! flow cannot interleave with another write.

pub mod period_service;
pub mod safety_service;

pub use period_service::PeriodService;
pub use safety_service::{SafetyError, SafetyService};
