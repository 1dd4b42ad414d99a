//! SOS alert and location tracking event.
//!
//! # Invariants
//! - Created once; only `is_resolved` / `resolved_at` may change afterwards.
//! - A resolved event never becomes unresolved.
//! - The client never deletes an `SosEvent` (it does not implement `Deletable`).

use crate::model::entity::{Entity, EntityKind, RecordId};
use crate::model::validation::ValidationError;
use crate::ports::geo::Position;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ALERT_MESSAGE: &str = "I need help! Please check on me at my current location.";
pub const TRACKING_MESSAGE: &str = "Location tracking update";
/// User id recorded when neither the row nor the identity provider has one.
pub const ANONYMOUS_USER_ID: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosEvent {
    pub id: RecordId,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
    pub message: String,
    pub is_resolved: bool,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SosEvent {
    /// Creates an open alert at `position`.
    pub fn alert(
        id: impl Into<RecordId>,
        user_id: impl Into<String>,
        position: Position,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            message: message.into(),
            is_resolved: false,
            resolved_at: None,
            created_at: now,
        }
    }

    /// Creates a tracking sample. Samples are informational and start resolved.
    pub fn tracking_sample(
        id: impl Into<RecordId>,
        user_id: impl Into<String>,
        position: Position,
        sampled_at: DateTime<Utc>,
    ) -> Self {
        let mut event = Self::alert(id, user_id, position, TRACKING_MESSAGE, sampled_at);
        event.is_resolved = true;
        event.resolved_at = Some(sampled_at);
        event
    }

    /// Marks the event resolved. Resolving twice keeps the first timestamp.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        if self.is_resolved {
            return;
        }
        self.is_resolved = true;
        self.resolved_at = Some(at);
    }

    pub fn position(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
        }
    }
}

impl Entity for SosEvent {
    const KIND: EntityKind = EntityKind::SosAlert;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self, _today: NaiveDate) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId);
        }
        let latitude_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let longitude_ok =
            self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if !latitude_ok || !longitude_ok {
            return Err(ValidationError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !self.accuracy.is_finite() || self.accuracy < 0.0 {
            return Err(ValidationError::InvalidAccuracy(self.accuracy));
        }
        Ok(())
    }

    fn check_transition(previous: &Self, next: &Self) -> Result<(), ValidationError> {
        if previous.user_id != next.user_id {
            return Err(ValidationError::ImmutableAlertField("user_id"));
        }
        if previous.latitude != next.latitude || previous.longitude != next.longitude {
            return Err(ValidationError::ImmutableAlertField("location"));
        }
        if previous.accuracy != next.accuracy {
            return Err(ValidationError::ImmutableAlertField("accuracy"));
        }
        if previous.message != next.message {
            return Err(ValidationError::ImmutableAlertField("message"));
        }
        if previous.created_at != next.created_at {
            return Err(ValidationError::ImmutableAlertField("created_at"));
        }
        if previous.is_resolved && !next.is_resolved {
            return Err(ValidationError::AlertReopened);
        }
        Ok(())
    }
}
