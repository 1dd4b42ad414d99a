//! Tagged results returned by every coordinator operation.

use crate::model::entity::EntityKind;
use crate::remote::RemoteError;
use std::fmt::{Display, Formatter};

/// Which store produced the returned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    Local,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Load,
    Save,
    Delete,
}

impl SyncOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Save => "save",
            Self::Delete => "delete",
        }
    }
}

/// Recoverable problem met while completing an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncWarning {
    /// The backend call failed; the local cache was used instead.
    RemoteUnavailable {
        kind: EntityKind,
        operation: SyncOperation,
        error: RemoteError,
    },
    /// The local write did not fit into storage.
    StorageExhausted { kind: EntityKind, message: String },
    /// The local cache could not be read or written for another reason.
    CacheUnavailable {
        kind: EntityKind,
        operation: SyncOperation,
        message: String,
    },
    /// A cached record could not be decoded and was skipped.
    CorruptRecord { kind: EntityKind, message: String },
    /// Geolocation permission was refused; location features are off for
    /// the rest of the session.
    PermissionDenied,
    /// A position fix failed for a reason other than permission.
    LocationUnavailable { message: String },
}

impl SyncWarning {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable { error, .. } => error.kind().code(),
            Self::StorageExhausted { .. } => "storage_exhausted",
            Self::CacheUnavailable { .. } => "cache_unavailable",
            Self::CorruptRecord { .. } => "cache_corrupt_record",
            Self::PermissionDenied => "geo_permission_denied",
            Self::LocationUnavailable { .. } => "geo_unavailable",
        }
    }

    /// Short user-facing message for the notifier.
    pub fn user_message(&self) -> String {
        match self {
            Self::RemoteUnavailable {
                kind,
                operation: SyncOperation::Load,
                ..
            } => format!("Failed to load {kind} from server; showing saved data"),
            Self::RemoteUnavailable {
                kind,
                operation: SyncOperation::Save,
                ..
            } => format!("Could not reach server; {kind} saved on this device"),
            Self::RemoteUnavailable {
                kind,
                operation: SyncOperation::Delete,
                ..
            } => format!("Could not reach server; {kind} removed on this device only"),
            Self::StorageExhausted { kind, .. } => {
                format!("Device storage is full; {kind} may not be kept offline")
            }
            Self::CacheUnavailable { kind, .. } => {
                format!("Saved {kind} on this device could not be accessed")
            }
            Self::CorruptRecord { kind, .. } => {
                format!("Some saved {kind} could not be read and were skipped")
            }
            Self::PermissionDenied => {
                "Unable to get your location. Please check your permissions.".to_string()
            }
            Self::LocationUnavailable { .. } => "Unable to get your location.".to_string(),
        }
    }
}

impl Display for SyncWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteUnavailable {
                kind,
                operation,
                error,
            } => write!(f, "remote {} of {kind} failed: {error}", operation.as_str()),
            Self::StorageExhausted { kind, message } => {
                write!(f, "local storage exhausted for {kind}: {message}")
            }
            Self::CacheUnavailable {
                kind,
                operation,
                message,
            } => write!(f, "local {} of {kind} failed: {message}", operation.as_str()),
            Self::CorruptRecord { kind, message } => {
                write!(f, "skipped unreadable cached {kind} record: {message}")
            }
            Self::PermissionDenied => write!(f, "geolocation permission denied"),
            Self::LocationUnavailable { message } => write!(f, "location unavailable: {message}"),
        }
    }
}

/// Value plus the store it came from and any warnings raised on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<T> {
    pub value: T,
    pub source: DataSource,
    pub warnings: Vec<SyncWarning>,
}

impl<T> SyncOutcome<T> {
    pub fn new(value: T, source: DataSource) -> Self {
        Self {
            value,
            source,
            warnings: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
