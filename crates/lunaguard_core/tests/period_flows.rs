mod common;

use chrono::{TimeZone, Utc};
use common::{date, harness, harness_with, now, Backend, USER_ID};
use lunaguard_core::ports::identity::StaticIdentity;
use lunaguard_core::ports::notify::NoticeLevel;
use lunaguard_core::{
    DataSource, EntityKind, LocalCache, PeriodRecord, PeriodService, SqliteLocalCache,
    ValidationError,
};
use serde_json::json;

fn period_row(id: &str, start: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": USER_ID,
        "last_period_start_date": start,
        "cycle_length": 30,
        "period_length": 4,
        "symptoms": ["Cramps"],
        "notes": "",
        "created_at": created_at,
        "updated_at": created_at
    })
}

#[test]
fn first_visit_gets_an_unsaved_default_record() {
    let mut h = harness();
    let mut service = PeriodService::new(&mut h.coordinator);

    let current = service.current_period();
    assert_eq!(current.value.id, "id-1");
    assert_eq!(current.value.last_period_start_date, date(2024, 1, 10));
    assert_eq!(current.value.cycle_length, 28);
    assert_eq!(current.value.period_length, 5);
    assert!(service.history().is_empty());

    assert_eq!(h.transport.calls(), vec!["select:period_data".to_string()]);
    assert!(h
        .coordinator
        .cache()
        .get_all(EntityKind::Period)
        .unwrap()
        .is_empty());
}

#[test]
fn remote_history_picks_the_newest_record() {
    let mut h = harness();
    h.transport.seed(
        "period_data",
        vec![
            period_row("older", "2023-12-04", "2023-12-04T08:00:00Z"),
            period_row("newer", "2024-01-01", "2024-01-01T08:00:00Z"),
        ],
    );

    let mut service = PeriodService::new(&mut h.coordinator);
    let current = service.current_period();
    assert_eq!(current.source, DataSource::Remote);
    assert_eq!(current.value.id, "newer");
    assert_eq!(current.value.cycle_length, 30);
    assert_eq!(current.value.symptoms, vec!["Cramps".to_string()]);
    assert_eq!(service.history().len(), 2);
}

#[test]
fn offline_session_after_remote_refresh_still_picks_the_newest_record() {
    let mut h = harness();
    h.transport.seed(
        "period_data",
        vec![
            period_row("older", "2023-12-04", "2023-12-04T08:00:00Z"),
            period_row("newer", "2024-01-01", "2024-01-01T08:00:00Z"),
        ],
    );
    let online = PeriodService::new(&mut h.coordinator).current_period();
    assert_eq!(online.value.id, "newer");

    h.transport.set_backend(Backend::Offline);
    let offline = PeriodService::new(&mut h.coordinator).current_period();
    assert_eq!(offline.source, DataSource::Local);
    assert_eq!(offline.value.id, "newer");
}

#[test]
fn same_start_date_prefers_the_later_created_record() {
    let mut h = harness();
    h.transport.seed(
        "period_data",
        vec![
            period_row("late", "2024-01-01", "2024-01-02T08:00:00Z"),
            period_row("early", "2024-01-01", "2024-01-01T08:00:00Z"),
        ],
    );
    let current = PeriodService::new(&mut h.coordinator).current_period();
    assert_eq!(current.value.id, "late");
}

#[test]
fn local_history_picks_the_last_saved_record() {
    let mut h = harness();
    h.transport.set_backend(Backend::Offline);
    {
        let mut service = PeriodService::new(&mut h.coordinator);
        service
            .save_period(PeriodRecord::new("first", date(2023, 12, 4), now()))
            .unwrap();
        service
            .save_period(PeriodRecord::new("second", date(2024, 1, 1), now()))
            .unwrap();
    }

    let mut service = PeriodService::new(&mut h.coordinator);
    let current = service.current_period();
    assert_eq!(current.source, DataSource::Local);
    assert_eq!(current.value.id, "second");
}

#[test]
fn save_reports_where_the_record_landed() {
    let mut h = harness();
    {
        let mut service = PeriodService::new(&mut h.coordinator);
        let saved = service
            .save_period(PeriodRecord::new("p-1", date(2024, 1, 1), now()))
            .unwrap();
        assert_eq!(saved.source, DataSource::Remote);
    }
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        vec!["Period data saved successfully".to_string()]
    );

    h.notifier.clear();
    h.transport.set_backend(Backend::Offline);
    {
        let mut service = PeriodService::new(&mut h.coordinator);
        let saved = service
            .save_period(PeriodRecord::new("p-1", date(2024, 1, 2), now()))
            .unwrap();
        assert_eq!(saved.source, DataSource::Local);
    }
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        vec!["Period data saved locally".to_string()]
    );
    assert_eq!(h.notifier.messages(NoticeLevel::Warning).len(), 1);
}

#[test]
fn save_stamps_updated_at_from_the_clock() {
    let mut h = harness();
    h.clock.advance(chrono::Duration::hours(2));
    let mut service = PeriodService::new(&mut h.coordinator);

    let saved = service
        .save_period(PeriodRecord::new("p-1", date(2024, 1, 1), now()))
        .unwrap();
    assert_eq!(saved.value.created_at, now());
    assert_eq!(saved.value.updated_at, now() + chrono::Duration::hours(2));
}

#[test]
fn invalid_record_is_rejected_with_an_error_notice() {
    let mut h = harness();
    let mut record = PeriodRecord::new("p-1", date(2024, 1, 1), now());
    record.cycle_length = 45;

    let err = PeriodService::new(&mut h.coordinator)
        .save_period(record)
        .unwrap_err();
    assert_eq!(err, ValidationError::CycleLengthOutOfRange(45));
    assert!(h.transport.calls().is_empty());
    assert_eq!(h.notifier.messages(NoticeLevel::Error).len(), 1);
}

#[test]
fn future_start_date_is_rejected() {
    let mut h = harness();
    let record = PeriodRecord::new("p-1", date(2024, 1, 11), now());

    let err = PeriodService::new(&mut h.coordinator)
        .save_period(record)
        .unwrap_err();
    assert!(matches!(err, ValidationError::StartDateInFuture { .. }));
}

#[test]
fn new_period_keeps_lengths_under_a_fresh_id() {
    let mut h = harness();
    let service = PeriodService::new(&mut h.coordinator);
    let mut current = PeriodRecord::new("p-1", date(2023, 12, 4), now());
    current.cycle_length = 32;
    current.add_symptom("Bloating").unwrap();

    let next = service.start_new_period(&current, date(2024, 1, 5));
    assert_ne!(next.id, current.id);
    assert_eq!(next.cycle_length, 32);
    assert_eq!(next.last_period_start_date, date(2024, 1, 5));
    assert!(next.symptoms.is_empty());
    assert_eq!(
        h.notifier.messages(NoticeLevel::Success),
        vec!["New period tracking started".to_string()]
    );
}

#[test]
fn reset_restores_defaults_without_saving() {
    let mut h = harness();
    let service = PeriodService::new(&mut h.coordinator);
    let mut record = PeriodRecord::new("p-1", date(2023, 12, 4), now());
    record.cycle_length = 35;
    record.notes = "tired".to_string();

    service.reset(&mut record);
    assert_eq!(record.id, "p-1");
    assert_eq!(record.cycle_length, 28);
    assert_eq!(record.last_period_start_date, date(2024, 1, 10));
    assert!(record.notes.is_empty());
    assert!(h.transport.calls().is_empty());
}

#[test]
fn forecast_uses_the_clock_date() {
    let mut h = harness();
    let service = PeriodService::new(&mut h.coordinator);
    let record = PeriodRecord::new("p-1", date(2024, 1, 1), now());

    let forecast = service.forecast(&record);
    assert_eq!(forecast.next_period_date, date(2024, 1, 29));
    assert_eq!(forecast.days_until_next_period, 19);
}

#[test]
fn deleting_a_period_removes_it_from_history() {
    let mut h = harness();
    let mut service = PeriodService::new(&mut h.coordinator);
    service
        .save_period(PeriodRecord::new("p-1", date(2024, 1, 1), now()))
        .unwrap();

    let deleted = service.delete_period("p-1");
    assert!(deleted.value);
    assert!(service.history().is_empty());
}

#[test]
fn stored_period_is_found_in_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.sqlite3");
    let created_at = Utc.with_ymd_and_hms(2023, 12, 4, 8, 0, 0).unwrap();
    {
        let cache = SqliteLocalCache::open(&path).unwrap();
        let mut h = harness_with(StaticIdentity::signed_in(USER_ID), cache);
        PeriodService::new(&mut h.coordinator)
            .save_period(PeriodRecord::new("p-1", date(2023, 12, 4), created_at))
            .unwrap();
    }

    let cache = SqliteLocalCache::open(&path).unwrap();
    let mut h = harness_with(StaticIdentity::signed_in(USER_ID), cache);
    let service = PeriodService::new(&mut h.coordinator);
    assert!(service.history().is_empty());

    let found = service.find_period("p-1").unwrap();
    assert_eq!(found.created_at, created_at);
    assert_eq!(found.last_period_start_date, date(2023, 12, 4));
    assert!(service.find_period("ghost").is_none());
}
