//! SQLite-backed `LocalCache`.
//!
//! Each namespace is one row in `cache_namespaces` holding a JSON array.
//! Mutations are read-modify-write inside one transaction, so a failed write
//! leaves the previous payload untouched.

use super::{record_id, CacheError, CacheResult, LocalCache};
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::model::entity::EntityKind;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Default quota shared by all namespaces, sized like a browser local-storage budget.
pub const DEFAULT_CACHE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub struct SqliteLocalCache {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteLocalCache {
    /// Wraps an already-migrated connection with the default quota.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            quota_bytes: Some(DEFAULT_CACHE_QUOTA_BYTES),
        }
    }

    /// Opens the cache file at `path`, creating and migrating it when needed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Sets the byte quota; `None` disables the check.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Number of writes applied to `kind`'s namespace; 0 when never written.
    pub fn revision(&self, kind: EntityKind) -> CacheResult<u64> {
        let revision: Option<i64> = self
            .conn
            .query_row(
                "SELECT revision FROM cache_namespaces WHERE namespace = ?1;",
                [kind.namespace()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(revision.map_or(0, |value| u64::try_from(value).unwrap_or(0)))
    }

    /// Total payload bytes across all namespaces.
    pub fn usage_bytes(&self) -> CacheResult<usize> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(payload AS BLOB))), 0) FROM cache_namespaces;",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(used).unwrap_or(0))
    }

    /// Applies `change` to the namespace in one transaction.
    ///
    /// `change` returns whether it modified the records; unchanged namespaces
    /// are not rewritten.
    fn mutate<F>(&self, kind: EntityKind, change: F) -> CacheResult<()>
    where
        F: FnOnce(&mut Vec<Value>) -> bool,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut records = read_namespace(&tx, kind)?;
        if change(&mut records) {
            self.write_namespace(&tx, kind, &records)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn write_namespace(
        &self,
        conn: &Connection,
        kind: EntityKind,
        records: &[Value],
    ) -> CacheResult<()> {
        let namespace = kind.namespace();
        let payload = serde_json::to_string(records).map_err(|err| CacheError::InvalidData {
            namespace,
            message: err.to_string(),
        })?;

        if let Some(quota) = self.quota_bytes {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(payload AS BLOB))), 0)
                 FROM cache_namespaces
                 WHERE namespace != ?1;",
                [namespace],
                |row| row.get(0),
            )?;
            let required = usize::try_from(others).unwrap_or(0) + payload.len();
            if required > quota {
                warn!(
                    "event=cache_write module=cache status=error namespace={namespace} error_code=quota_exceeded required_bytes={required} quota_bytes={quota}"
                );
                return Err(CacheError::StorageExhausted {
                    namespace,
                    required_bytes: required,
                    quota_bytes: Some(quota),
                });
            }
        }

        conn.execute(
            "INSERT INTO cache_namespaces (namespace, payload, updated_at, revision)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000), 1)
             ON CONFLICT(namespace) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at,
                revision = cache_namespaces.revision + 1;",
            params![namespace, payload],
        )
        .map_err(|err| write_error(kind, payload.len(), err))?;

        debug!(
            "event=cache_write module=cache status=ok namespace={namespace} count={} bytes={}",
            records.len(),
            payload.len()
        );
        Ok(())
    }
}

impl LocalCache for SqliteLocalCache {
    fn get_all(&self, kind: EntityKind) -> CacheResult<Vec<Value>> {
        read_namespace(&self.conn, kind)
    }

    fn put(&self, kind: EntityKind, id: &str, record: Value) -> CacheResult<()> {
        let record = with_id(record, id);
        self.mutate(kind, |records| {
            match records.iter_mut().find(|existing| record_id(existing) == Some(id)) {
                Some(slot) => *slot = record,
                None => records.push(record),
            }
            true
        })
    }

    fn remove(&self, kind: EntityKind, id: &str) -> CacheResult<()> {
        self.mutate(kind, |records| {
            let before = records.len();
            records.retain(|existing| record_id(existing) != Some(id));
            records.len() != before
        })
    }

    fn replace_all(&self, kind: EntityKind, records: Vec<Value>) -> CacheResult<()> {
        self.mutate(kind, move |current| {
            *current = records;
            true
        })
    }
}

fn read_namespace(conn: &Connection, kind: EntityKind) -> CacheResult<Vec<Value>> {
    let namespace = kind.namespace();
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM cache_namespaces WHERE namespace = ?1;",
            [namespace],
            |row| row.get(0),
        )
        .optional()?;

    let Some(payload) = payload else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Value>(&payload) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(_) => Err(CacheError::InvalidData {
            namespace,
            message: "payload is not a JSON array".to_string(),
        }),
        Err(err) => Err(CacheError::InvalidData {
            namespace,
            message: err.to_string(),
        }),
    }
}

fn with_id(mut record: Value, id: &str) -> Value {
    if let Value::Object(fields) = &mut record {
        fields.insert("id".to_string(), Value::String(id.to_string()));
    }
    record
}

fn write_error(kind: EntityKind, payload_bytes: usize, err: rusqlite::Error) -> CacheError {
    let err = DbError::from(err);
    if err.is_disk_full() {
        warn!(
            "event=cache_write module=cache status=error namespace={} error_code=disk_full",
            kind.namespace()
        );
        return CacheError::StorageExhausted {
            namespace: kind.namespace(),
            required_bytes: payload_bytes,
            quota_bytes: None,
        };
    }
    CacheError::Db(err)
}
