//! Core domain logic for LunaGuard.
//! This crate is the single source of truth for cycle tracking and safety
//! record invariants, and for how records move between backend and device.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod ports;
pub mod predict;
pub mod remote;
pub mod service;
pub mod sync;

pub use cache::{CacheError, CacheResult, LocalCache, SqliteLocalCache};
pub use config::{AppConfig, CacheConfig, ConfigError, LoggingConfig, RemoteConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::contact::{EmergencyContact, NewContact};
pub use model::entity::{Deletable, Entity, EntityKind, RecordId};
pub use model::period::PeriodRecord;
pub use model::sos::SosEvent;
pub use model::validation::ValidationError;
pub use predict::calendar::{CycleCalendar, DayMarker};
pub use predict::cycle::{predict_cycle, try_predict_cycle, CycleForecast};
pub use remote::{RemoteError, RemoteErrorKind, RemoteStore, RemoteTransport, RestTransport};
pub use service::{PeriodService, SafetyError, SafetyService};
pub use sync::{
    Capabilities, DataSource, SyncCoordinator, SyncOutcome, SyncWarning, TrackingEvent,
    TrackingHandle, DEFAULT_TRACKING_INTERVAL,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
