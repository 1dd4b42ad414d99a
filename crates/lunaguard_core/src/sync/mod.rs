//! Dual-store synchronization.
//!
//! # Responsibility
//! - Give the UI a usable view of every entity kind whether or not the
//!   backend is reachable.
//! - Write through to the local cache on every save and delete.
//! - Run position tracking as an explicit, cancellable task.
//!
//! # Invariants
//! - Mutating operations take `&mut self`: one writer per session.
//! - Remote failures never surface as errors, only as `SyncWarning`s.

mod coordinator;
mod outcome;
mod tracking;
mod working_set;

pub use coordinator::SyncCoordinator;
pub use outcome::{DataSource, SyncOperation, SyncOutcome, SyncWarning};
pub use tracking::{TrackingEvent, TrackingHandle, DEFAULT_TRACKING_INTERVAL};
pub use working_set::{SyncEntity, WorkingSet, WorkingSetSlot};

use crate::ports::clock::{Clock, SystemClock};
use crate::ports::ids::{IdGenerator, UuidIdGenerator};
use crate::ports::notify::{LogNotifier, Notifier};
use std::sync::Arc;

/// Injected collaborators shared by the coordinator and services.
#[derive(Clone)]
pub struct Capabilities {
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Capabilities {
    /// Wall clock, UUID ids, log-only notices.
    pub fn system() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdGenerator),
            notifier: Arc::new(LogNotifier),
        }
    }
}
