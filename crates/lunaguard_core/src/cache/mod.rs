//! Durable on-device record cache.
//!
//! # Responsibility
//! - Keep one ordered id → record collection per entity kind.
//! - Survive restarts so the UI has data while the backend is unreachable.
//!
//! # Invariants
//! - `get_all` returns records in insertion order.
//! - `put` overwrites an existing id in place and appends unseen ids.
//! - `remove` of an absent id is a no-op.
//! - Records are stored as JSON objects carrying an `id` field.
//!
//! Storage-quota exhaustion is the only expected failure; callers treat it as
//! a warning and carry on.

use crate::db::DbError;
use crate::model::entity::EntityKind;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_cache;

pub use sqlite_cache::{SqliteLocalCache, DEFAULT_CACHE_QUOTA_BYTES};

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Db(DbError),
    /// The write would exceed the cache quota or the device is full.
    StorageExhausted {
        namespace: &'static str,
        required_bytes: usize,
        quota_bytes: Option<usize>,
    },
    /// A stored payload is not a JSON array of records.
    InvalidData {
        namespace: &'static str,
        message: String,
    },
}

impl CacheError {
    pub fn is_storage_exhausted(&self) -> bool {
        matches!(self, Self::StorageExhausted { .. })
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::StorageExhausted {
                namespace,
                required_bytes,
                quota_bytes: Some(quota),
            } => write!(
                f,
                "local storage exhausted for `{namespace}`: {required_bytes} bytes needed, quota {quota}"
            ),
            Self::StorageExhausted { namespace, .. } => {
                write!(f, "local storage exhausted for `{namespace}`: device is full")
            }
            Self::InvalidData { namespace, message } => {
                write!(f, "invalid cached data in `{namespace}`: {message}")
            }
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CacheError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Namespaced record store.
pub trait LocalCache {
    /// All records of `kind` in insertion order; empty when never written.
    fn get_all(&self, kind: EntityKind) -> CacheResult<Vec<Value>>;

    /// Inserts `record` under `id`, or overwrites the existing entry in place.
    fn put(&self, kind: EntityKind, id: &str, record: Value) -> CacheResult<()>;

    /// Removes the record with `id`; absent ids are ignored.
    fn remove(&self, kind: EntityKind, id: &str) -> CacheResult<()>;

    /// Replaces the whole namespace with `records`, keeping their order.
    fn replace_all(&self, kind: EntityKind, records: Vec<Value>) -> CacheResult<()>;
}

/// Reads the `id` field of a cached record.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}
