//! Period tracker use cases.
//!
//! # Responsibility
//! - Pick the record the tracker screen edits.
//! - Save, restart and reset tracking through the coordinator.
//!
//! # Invariants
//! - A record is only persisted by `save_period`; new and reset records stay
//!   in memory until then.

use crate::cache::LocalCache;
use crate::model::period::PeriodRecord;
use crate::model::validation::ValidationError;
use crate::ports::notify::Notice;
use crate::predict::calendar::CycleCalendar;
use crate::predict::cycle::CycleForecast;
use crate::remote::RemoteTransport;
use crate::sync::{DataSource, SyncCoordinator, SyncOutcome};
use chrono::{DateTime, NaiveDate, Utc};

pub struct PeriodService<'a, T: RemoteTransport, C: LocalCache> {
    coordinator: &'a mut SyncCoordinator<T, C>,
}

impl<'a, T: RemoteTransport, C: LocalCache> PeriodService<'a, T, C> {
    pub fn new(coordinator: &'a mut SyncCoordinator<T, C>) -> Self {
        Self { coordinator }
    }

    /// Loads history and returns the record to edit.
    ///
    /// The record with the latest start date wins, then the latest
    /// `created_at`, then the later entry. Store order is not trusted: the
    /// cache keeps whatever order the last remote refresh wrote. With no
    /// history at all a fresh unsaved record starting today is returned.
    pub fn current_period(&mut self) -> SyncOutcome<PeriodRecord> {
        let loaded = self.coordinator.load::<PeriodRecord>();
        let SyncOutcome {
            value,
            source,
            warnings,
        } = loaded;

        let latest = value
            .into_iter()
            .max_by_key(|record| (record.last_period_start_date, record.created_at));
        let record = latest.unwrap_or_else(|| {
            PeriodRecord::new(
                self.coordinator.next_id(),
                self.coordinator.today(),
                self.coordinator.now(),
            )
        });

        SyncOutcome {
            value: record,
            source,
            warnings,
        }
    }

    /// Session history as last loaded or saved.
    pub fn history(&self) -> &[PeriodRecord] {
        self.coordinator.records::<PeriodRecord>()
    }

    /// Stored record with `id`, from the session or else the local cache.
    pub fn find_period(&self, id: &str) -> Option<PeriodRecord> {
        self.coordinator.known_record::<PeriodRecord>(id)
    }

    /// Unsaved record for a new period, keeping the current lengths.
    pub fn start_new_period(&self, current: &PeriodRecord, start: NaiveDate) -> PeriodRecord {
        let record = current.next_period(
            self.coordinator.next_id(),
            start,
            self.coordinator.now(),
        );
        self.coordinator
            .notify(Notice::success("New period tracking started"));
        record
    }

    /// Restores defaults on `record` in memory.
    pub fn reset(&self, record: &mut PeriodRecord) {
        record.reset(self.coordinator.today(), self.coordinator.now());
        self.coordinator
            .notify(Notice::success("Tracker reset to default values"));
    }

    /// Stamps `updated_at` and saves through both stores.
    pub fn save_period(
        &mut self,
        mut record: PeriodRecord,
    ) -> Result<SyncOutcome<PeriodRecord>, ValidationError> {
        record.touch(self.coordinator.now());
        match self.coordinator.save(record) {
            Ok(outcome) => {
                let message = match outcome.source {
                    DataSource::Remote => "Period data saved successfully",
                    DataSource::Local => "Period data saved locally",
                };
                self.coordinator.notify(Notice::success(message));
                Ok(outcome)
            }
            Err(err) => {
                self.coordinator.notify(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn delete_period(&mut self, id: &str) -> SyncOutcome<bool> {
        self.coordinator.delete::<PeriodRecord>(id)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.coordinator.now()
    }

    pub fn forecast(&self, record: &PeriodRecord) -> CycleForecast {
        record.forecast(self.coordinator.today())
    }

    pub fn calendar(&self, record: &PeriodRecord) -> CycleCalendar {
        CycleCalendar::for_record(record, self.coordinator.today())
    }
}
