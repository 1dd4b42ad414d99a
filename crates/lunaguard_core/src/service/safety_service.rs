//! Safety hub use cases: emergency contacts, SOS alerts, position tracking.
//!
//! # Invariants
//! - An SOS alert is only created when at least one emergency contact exists.
//! - After a geolocation permission denial no further position is requested
//!   in this session.
//! - Contact edits are delete + recreate; the replacement is validated before
//!   the old contact is removed.
//! - At most one sampler runs per session, held by the coordinator.

use crate::cache::LocalCache;
use crate::model::contact::{EmergencyContact, NewContact};
use crate::model::entity::Entity;
use crate::model::sos::{SosEvent, ANONYMOUS_USER_ID, DEFAULT_ALERT_MESSAGE};
use crate::model::validation::ValidationError;
use crate::ports::geo::{GeoError, GeolocationProvider};
use crate::ports::notify::Notice;
use crate::remote::RemoteTransport;
use crate::sync::{
    DataSource, SyncCoordinator, SyncOutcome, SyncWarning, TrackingEvent, TrackingHandle,
};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SafetyError {
    Validation(ValidationError),
    NoEmergencyContacts,
    AlertNotFound(String),
    Location(GeoError),
    /// Permission was denied earlier in this session.
    GeolocationDisabled,
    TrackingActive,
}

impl Display for SafetyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoEmergencyContacts => write!(f, "Please add emergency contacts first"),
            Self::AlertNotFound(id) => write!(f, "SOS alert `{id}` not found"),
            Self::Location(err) => write!(f, "{err}"),
            Self::GeolocationDisabled => {
                write!(f, "location access was denied for this session")
            }
            Self::TrackingActive => write!(f, "location tracking is already on"),
        }
    }
}

impl Error for SafetyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Location(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for SafetyError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub struct SafetyService<'a, T: RemoteTransport, C: LocalCache> {
    coordinator: &'a mut SyncCoordinator<T, C>,
}

impl<'a, T: RemoteTransport, C: LocalCache> SafetyService<'a, T, C> {
    pub fn new(coordinator: &'a mut SyncCoordinator<T, C>) -> Self {
        Self { coordinator }
    }

    pub fn contacts(&mut self) -> SyncOutcome<Vec<EmergencyContact>> {
        self.coordinator.load::<EmergencyContact>()
    }

    pub fn add_contact(
        &mut self,
        input: NewContact,
    ) -> Result<SyncOutcome<EmergencyContact>, SafetyError> {
        let contact =
            EmergencyContact::new(self.coordinator.next_id(), input, self.coordinator.now());
        let outcome = self.save_reporting(contact)?;
        self.coordinator
            .notify(Notice::success("Emergency contact added"));
        Ok(outcome)
    }

    pub fn remove_contact(&mut self, id: &str) -> SyncOutcome<bool> {
        let outcome = self.coordinator.delete::<EmergencyContact>(id);
        self.coordinator.notify(Notice::success("Contact removed"));
        outcome
    }

    /// Replaces contact `id` with a new record built from `input`.
    ///
    /// The replacement gets a fresh id. Nothing is deleted when `input` is
    /// invalid.
    pub fn replace_contact(
        &mut self,
        id: &str,
        input: NewContact,
    ) -> Result<SyncOutcome<EmergencyContact>, SafetyError> {
        let replacement =
            EmergencyContact::new(self.coordinator.next_id(), input, self.coordinator.now());
        if let Err(err) = replacement.validate(self.coordinator.today()) {
            self.coordinator.notify(Notice::error(err.to_string()));
            return Err(err.into());
        }

        let removed = self.coordinator.delete::<EmergencyContact>(id);
        let mut outcome = self.save_reporting(replacement)?;
        if removed.source == DataSource::Local {
            outcome.source = DataSource::Local;
        }
        let mut warnings = removed.warnings;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;

        self.coordinator.notify(Notice::success("Emergency contact updated"));
        Ok(outcome)
    }

    /// Records an SOS alert at the current position.
    ///
    /// # Errors
    /// - `NoEmergencyContacts` when no contact is known.
    /// - `GeolocationDisabled` after an earlier permission denial.
    /// - `Location` when the position fix fails.
    pub fn send_alert(
        &mut self,
        message: Option<&str>,
        geo: &dyn GeolocationProvider,
    ) -> Result<SyncOutcome<SosEvent>, SafetyError> {
        let contact_count = self.known_contact_count();
        if contact_count == 0 {
            let err = SafetyError::NoEmergencyContacts;
            self.coordinator.notify(Notice::error(err.to_string()));
            return Err(err);
        }
        if !self.coordinator.geolocation_enabled() {
            return Err(SafetyError::GeolocationDisabled);
        }

        let position = match geo.current_position() {
            Ok(position) => position,
            Err(err) => {
                self.handle_geo_error(&err);
                return Err(SafetyError::Location(err));
            }
        };

        let message = message
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(DEFAULT_ALERT_MESSAGE);
        let alert = SosEvent::alert(
            self.coordinator.next_id(),
            self.user_id(),
            position,
            message,
            self.coordinator.now(),
        );

        let outcome = self.save_reporting(alert)?;
        self.coordinator.notify(Notice::success(format!(
            "Alert sent to {contact_count} emergency contacts"
        )));
        Ok(outcome)
    }

    /// Marks alert `id` resolved. Resolving twice is a no-op save.
    ///
    /// When `id` is not in the session view the alerts are reloaded first;
    /// that load's source and warnings are folded into the result.
    pub fn resolve_alert(&mut self, id: &str) -> Result<SyncOutcome<SosEvent>, SafetyError> {
        let loaded = match self.coordinator.working_set().find::<SosEvent>(id) {
            Some(_) => None,
            None => Some(self.coordinator.load::<SosEvent>()),
        };
        let mut alert = self
            .coordinator
            .working_set()
            .find::<SosEvent>(id)
            .cloned()
            .ok_or_else(|| SafetyError::AlertNotFound(id.to_string()))?;

        alert.resolve(self.coordinator.now());
        let mut outcome = self.save_reporting(alert)?;
        if let Some(loaded) = loaded {
            if loaded.source == DataSource::Local {
                outcome.source = DataSource::Local;
            }
            let mut warnings = loaded.warnings;
            warnings.append(&mut outcome.warnings);
            outcome.warnings = warnings;
        }
        Ok(outcome)
    }

    /// Starts background sampling owned by the session.
    ///
    /// Samples are saved by `pump_tracking` and `stop_tracking`; they stay
    /// queued in the session until then, even if this service is dropped.
    ///
    /// # Errors
    /// - `GeolocationDisabled` after an earlier permission denial.
    /// - `TrackingActive` when a sampler is already running.
    pub fn start_tracking(
        &mut self,
        provider: Arc<dyn GeolocationProvider>,
        interval: Duration,
    ) -> Result<(), SafetyError> {
        if !self.coordinator.geolocation_enabled() {
            return Err(SafetyError::GeolocationDisabled);
        }
        if self.is_tracking() {
            return Err(SafetyError::TrackingActive);
        }
        let clock = Arc::clone(&self.coordinator.capabilities().clock);
        let handle = TrackingHandle::start(provider, clock, interval)
            .map_err(|err| SafetyError::Location(GeoError::Unavailable(err.to_string())))?;
        // A finished sampler may still hold unsaved events.
        if let Some(previous) = self.coordinator.attach_tracker(handle) {
            let events = previous.drain();
            self.save_tracking_events(events);
        }
        self.coordinator
            .notify(Notice::success("Location tracking enabled"));
        Ok(())
    }

    /// True while the session sampler is running.
    pub fn is_tracking(&self) -> bool {
        self.coordinator
            .tracker()
            .is_some_and(TrackingHandle::is_active)
    }

    /// Waits up to `wait` for the next sample, then saves it along with every
    /// other pending one.
    ///
    /// The value is the number of samples saved. A sampler that ended on its
    /// own (permission denied, provider failure) is released here.
    pub fn pump_tracking(&mut self, wait: Duration) -> SyncOutcome<usize> {
        let Some(tracker) = self.coordinator.tracker() else {
            return SyncOutcome::new(0, DataSource::Remote);
        };
        let mut events: Vec<TrackingEvent> = tracker.next_timeout(wait).into_iter().collect();
        events.extend(tracker.drain());
        if !tracker.is_active() {
            events.extend(tracker.drain());
            self.coordinator.take_tracker();
        }
        self.save_tracking_events(events)
    }

    /// Stops sampling and stores every sample already taken.
    pub fn stop_tracking(&mut self) -> SyncOutcome<usize> {
        let Some(mut tracker) = self.coordinator.take_tracker() else {
            return SyncOutcome::new(0, DataSource::Remote);
        };
        tracker.stop();
        let outcome = self.save_tracking_events(tracker.drain());
        self.coordinator
            .notify(Notice::success("Location tracking disabled"));
        outcome
    }

    /// Saves samples as resolved tracking events.
    fn save_tracking_events(&mut self, events: Vec<TrackingEvent>) -> SyncOutcome<usize> {
        let mut outcome = SyncOutcome::new(0, DataSource::Remote);

        for event in events {
            match event {
                TrackingEvent::Sample {
                    position,
                    sampled_at,
                } => {
                    let sample = SosEvent::tracking_sample(
                        self.coordinator.next_id(),
                        self.user_id(),
                        position,
                        sampled_at,
                    );
                    match self.coordinator.save(sample) {
                        Ok(saved) => {
                            outcome.value += 1;
                            if saved.source == DataSource::Local {
                                outcome.source = DataSource::Local;
                            }
                            outcome.warnings.extend(saved.warnings);
                        }
                        Err(err) => warn!(
                            "event=tracking_record module=safety status=error error_code=invalid_sample reason={err}"
                        ),
                    }
                }
                TrackingEvent::Failed(err) => {
                    if let Some(warning) = self.handle_geo_error(&err) {
                        outcome.warnings.push(warning);
                    }
                }
            }
        }
        outcome
    }

    fn save_reporting<E: crate::sync::SyncEntity>(
        &mut self,
        record: E,
    ) -> Result<SyncOutcome<E>, SafetyError> {
        self.coordinator.save(record).map_err(|err| {
            self.coordinator.notify(Notice::error(err.to_string()));
            SafetyError::Validation(err)
        })
    }

    fn known_contact_count(&mut self) -> usize {
        let known = self.coordinator.records::<EmergencyContact>().len();
        if known > 0 {
            return known;
        }
        self.coordinator.load::<EmergencyContact>().value.len()
    }

    fn handle_geo_error(&mut self, err: &GeoError) -> Option<SyncWarning> {
        match err {
            GeoError::PermissionDenied => {
                let first_denial = self.coordinator.geolocation_enabled();
                let warning = self.coordinator.disable_geolocation();
                first_denial.then_some(warning)
            }
            GeoError::Unavailable(message) => {
                let warning = SyncWarning::LocationUnavailable {
                    message: message.clone(),
                };
                self.coordinator
                    .notify(Notice::error(warning.user_message()));
                Some(warning)
            }
        }
    }

    /// Signed-in user id, else the shared anonymous id.
    fn user_id(&self) -> String {
        self.coordinator
            .remote()
            .current_user_id()
            .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string())
    }
}
