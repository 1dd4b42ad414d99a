//! Load/save/delete orchestration across the remote store and local cache.
//!
//! # Invariants
//! - `save` validates before touching any store; a rejected record leaves
//!   both stores and the working set unchanged.
//! - `save` and `delete` always apply locally, whatever the remote outcome.
//! - A non-empty remote `load` wholesale replaces the local namespace.
//! - Nothing is queued for retry; a failed remote write stays local-only.

use super::outcome::{DataSource, SyncOperation, SyncOutcome, SyncWarning};
use super::tracking::TrackingHandle;
use super::working_set::{SyncEntity, WorkingSet};
use super::Capabilities;
use crate::cache::{CacheError, LocalCache};
use crate::model::entity::{Deletable, EntityKind};
use crate::model::validation::ValidationError;
use crate::ports::notify::Notice;
use crate::remote::{RemoteStore, RemoteTransport};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde_json::Value;
use std::time::Instant;

pub struct SyncCoordinator<T: RemoteTransport, C: LocalCache> {
    remote: RemoteStore<T>,
    cache: C,
    capabilities: Capabilities,
    working_set: WorkingSet,
    geolocation_denied: bool,
    tracker: Option<TrackingHandle>,
}

impl<T: RemoteTransport, C: LocalCache> SyncCoordinator<T, C> {
    pub fn new(remote: RemoteStore<T>, cache: C, capabilities: Capabilities) -> Self {
        Self {
            remote,
            cache,
            capabilities,
            working_set: WorkingSet::default(),
            geolocation_denied: false,
            tracker: None,
        }
    }

    pub fn remote(&self) -> &RemoteStore<T> {
        &self.remote
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    /// Session view of `E`, as of the last load/save/delete.
    pub fn records<E: SyncEntity>(&self) -> &[E] {
        self.working_set.records::<E>()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.capabilities.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.capabilities.clock.today()
    }

    pub fn next_id(&self) -> String {
        self.capabilities.ids.next_id()
    }

    pub fn notify(&self, notice: Notice) {
        self.capabilities.notifier.notify(notice);
    }

    pub fn geolocation_enabled(&self) -> bool {
        !self.geolocation_denied
    }

    /// Turns location features off for the rest of the session.
    pub fn disable_geolocation(&mut self) -> SyncWarning {
        let warning = SyncWarning::PermissionDenied;
        if !self.geolocation_denied {
            self.geolocation_denied = true;
            self.report(std::slice::from_ref(&warning));
        }
        warning
    }

    /// Running sampler of this session, if any.
    pub fn tracker(&self) -> Option<&TrackingHandle> {
        self.tracker.as_ref()
    }

    /// Hands a started sampler to the session; returns the one it replaces.
    pub fn attach_tracker(&mut self, handle: TrackingHandle) -> Option<TrackingHandle> {
        self.tracker.replace(handle)
    }

    pub fn take_tracker(&mut self) -> Option<TrackingHandle> {
        self.tracker.take()
    }

    /// Loads all records of `E`, preferring the backend.
    ///
    /// Remote records come back newest first; local records come back in
    /// cache insertion order.
    pub fn load<E: SyncEntity>(&mut self) -> SyncOutcome<Vec<E>> {
        let kind = E::KIND;
        let started_at = Instant::now();

        let outcome = match self.remote.list::<E>() {
            Ok(records) if !records.is_empty() => self.adopt_remote(records),
            Ok(_) => self.load_local(Vec::new()),
            Err(error) => self.load_local(vec![SyncWarning::RemoteUnavailable {
                kind,
                operation: SyncOperation::Load,
                error,
            }]),
        };

        log_operation(
            SyncOperation::Load,
            kind,
            &outcome,
            outcome.value.len(),
            started_at,
        );
        self.report(&outcome.warnings);
        outcome
    }

    /// Validates and persists `record` to both stores.
    ///
    /// # Errors
    /// - Returns `ValidationError` before any write when the record or its
    ///   transition from the known previous version is invalid.
    pub fn save<E: SyncEntity>(&mut self, record: E) -> Result<SyncOutcome<E>, ValidationError> {
        let kind = E::KIND;
        let started_at = Instant::now();

        record.validate(self.today())?;
        if let Some(previous) = self.known_record::<E>(record.id()) {
            E::check_transition(&previous, &record)?;
        }

        let mut warnings = Vec::new();
        let source = match self.remote.upsert(&record) {
            Ok(()) => DataSource::Remote,
            Err(error) => {
                warnings.push(SyncWarning::RemoteUnavailable {
                    kind,
                    operation: SyncOperation::Save,
                    error,
                });
                DataSource::Local
            }
        };

        match serde_json::to_value(&record) {
            Ok(value) => {
                if let Err(err) = self.cache.put(kind, record.id(), value) {
                    warnings.push(cache_warning(kind, SyncOperation::Save, &err));
                }
            }
            Err(err) => warnings.push(SyncWarning::CacheUnavailable {
                kind,
                operation: SyncOperation::Save,
                message: err.to_string(),
            }),
        }

        self.working_set.upsert(record.clone());

        let outcome = SyncOutcome {
            value: record,
            source,
            warnings,
        };
        log_operation(SyncOperation::Save, kind, &outcome, 1, started_at);
        self.report(&outcome.warnings);
        Ok(outcome)
    }

    /// Deletes `id` remotely (best effort) and locally (always).
    ///
    /// The value reports whether the record was part of the session view.
    pub fn delete<E: SyncEntity + Deletable>(&mut self, id: &str) -> SyncOutcome<bool> {
        let kind = E::KIND;
        let started_at = Instant::now();

        let mut warnings = Vec::new();
        let source = match self.remote.delete::<E>(id) {
            Ok(()) => DataSource::Remote,
            Err(error) => {
                warnings.push(SyncWarning::RemoteUnavailable {
                    kind,
                    operation: SyncOperation::Delete,
                    error,
                });
                DataSource::Local
            }
        };

        if let Err(err) = self.cache.remove(kind, id) {
            warnings.push(cache_warning(kind, SyncOperation::Delete, &err));
        }
        let removed = self.working_set.remove::<E>(id);

        let outcome = SyncOutcome {
            value: removed,
            source,
            warnings,
        };
        log_operation(
            SyncOperation::Delete,
            kind,
            &outcome,
            usize::from(removed),
            started_at,
        );
        self.report(&outcome.warnings);
        outcome
    }

    fn adopt_remote<E: SyncEntity>(&mut self, records: Vec<E>) -> SyncOutcome<Vec<E>> {
        let kind = E::KIND;
        let mut outcome = SyncOutcome::new(records, DataSource::Remote);

        let encoded: Result<Vec<Value>, _> =
            outcome.value.iter().map(serde_json::to_value).collect();
        let write_result = match encoded {
            Ok(values) => self
                .cache
                .replace_all(kind, values)
                .map_err(|err| cache_warning(kind, SyncOperation::Load, &err)),
            Err(err) => Err(SyncWarning::CacheUnavailable {
                kind,
                operation: SyncOperation::Load,
                message: err.to_string(),
            }),
        };
        if let Err(warning) = write_result {
            outcome.warnings.push(warning);
        }

        self.working_set.replace(outcome.value.clone());
        outcome
    }

    fn load_local<E: SyncEntity>(&mut self, mut warnings: Vec<SyncWarning>) -> SyncOutcome<Vec<E>> {
        let kind = E::KIND;
        let records = match self.cache.get_all(kind) {
            Ok(values) => decode_cached::<E>(values, &mut warnings),
            Err(err) => {
                warnings.push(cache_warning(kind, SyncOperation::Load, &err));
                Vec::new()
            }
        };

        self.working_set.replace(records.clone());
        SyncOutcome {
            value: records,
            source: DataSource::Local,
            warnings,
        }
    }

    /// Stored version of `id` from the session view, else from the cache.
    pub fn known_record<E: SyncEntity>(&self, id: &str) -> Option<E> {
        if let Some(record) = self.working_set.find::<E>(id) {
            return Some(record.clone());
        }
        let values = self.cache.get_all(E::KIND).ok()?;
        values
            .into_iter()
            .filter(|value| crate::cache::record_id(value) == Some(id))
            .find_map(|value| serde_json::from_value::<E>(value).ok())
    }

    fn report(&self, warnings: &[SyncWarning]) {
        for warning in warnings {
            warn!(
                "event=sync_warning module=sync status=degraded error_code={}",
                warning.code()
            );
            self.notify(Notice::warning(warning.user_message()));
        }
    }
}

fn decode_cached<E: SyncEntity>(values: Vec<Value>, warnings: &mut Vec<SyncWarning>) -> Vec<E> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<E>(value) {
            Ok(record) => records.push(record),
            Err(err) => warnings.push(SyncWarning::CorruptRecord {
                kind: E::KIND,
                message: err.to_string(),
            }),
        }
    }
    records
}

fn cache_warning(kind: EntityKind, operation: SyncOperation, err: &CacheError) -> SyncWarning {
    if err.is_storage_exhausted() {
        SyncWarning::StorageExhausted {
            kind,
            message: err.to_string(),
        }
    } else {
        SyncWarning::CacheUnavailable {
            kind,
            operation,
            message: err.to_string(),
        }
    }
}

fn log_operation<V>(
    operation: SyncOperation,
    kind: EntityKind,
    outcome: &SyncOutcome<V>,
    count: usize,
    started_at: Instant,
) {
    let status = if outcome.is_clean() { "ok" } else { "degraded" };
    info!(
        "event=sync_{} module=sync status={} kind={} source={} count={} warnings={} duration_ms={}",
        operation.as_str(),
        status,
        kind,
        outcome.source.as_str(),
        count,
        outcome.warnings.len(),
        started_at.elapsed().as_millis()
    );
}
