//! Entity kind registry and the shared entity contract.

use crate::model::validation::ValidationError;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// Opaque stable identifier shared by local and remote copies of a record.
pub type RecordId = String;

/// Persisted entity kinds. Each kind owns one cache namespace and one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Period,
    Contact,
    SosAlert,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Period, Self::Contact, Self::SosAlert];

    /// Local cache namespace key.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Period => "luna-guard-period-data",
            Self::Contact => "luna-guard-emergency-contacts",
            Self::SosAlert => "luna-guard-sos-alerts",
        }
    }

    /// Remote table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Period => "period_data",
            Self::Contact => "emergency_contacts",
            Self::SosAlert => "sos_alerts",
        }
    }

    /// Short label used in log events and notices.
    pub fn label(self) -> &'static str {
        match self {
            Self::Period => "period",
            Self::Contact => "contacts",
            Self::SosAlert => "sos_alerts",
        }
    }

    /// Parses a label or namespace key back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| {
            kind.label() == normalized
                || kind.namespace() == normalized
                || kind.table() == normalized
        })
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Contract implemented by every persisted record.
///
/// # Invariants
/// - `id()` is stable for the lifetime of the record.
/// - `validate()` must pass before the record reaches any store.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Checks domain invariants. `today` bounds date fields that may not lie
    /// in the future.
    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError>;

    /// Checks whether `next` may replace `previous` under the same id.
    fn check_transition(previous: &Self, next: &Self) -> Result<(), ValidationError> {
        let _ = (previous, next);
        Ok(())
    }
}

/// Marker for kinds the client is allowed to delete.
///
/// `SosEvent` deliberately does not implement it.
pub trait Deletable: Entity {}
