mod common;

use common::{contact, date, now, position};
use lunaguard_core::model::entity::Entity;
use lunaguard_core::model::period::{PeriodRecord, COMMON_SYMPTOMS};
use lunaguard_core::model::sos::{SosEvent, TRACKING_MESSAGE};
use lunaguard_core::{EmergencyContact, NewContact, ValidationError};

#[test]
fn new_period_record_uses_defaults() {
    let record = PeriodRecord::new("p-1", date(2024, 1, 10), now());

    assert_eq!(record.cycle_length, 28);
    assert_eq!(record.period_length, 5);
    assert!(record.symptoms.is_empty());
    assert!(record.notes.is_empty());
    assert_eq!(record.created_at, record.updated_at);
    assert!(record.validate(date(2024, 1, 10)).is_ok());
}

#[test]
fn period_lengths_are_rejected_outside_domain() {
    let mut record = PeriodRecord::new("p-1", date(2024, 1, 1), now());

    assert_eq!(
        record.set_cycle_length(20),
        Err(ValidationError::CycleLengthOutOfRange(20))
    );
    assert_eq!(
        record.set_period_length(11),
        Err(ValidationError::PeriodLengthOutOfRange(11))
    );
    assert_eq!(record.cycle_length, 28);

    record.cycle_length = 41;
    assert_eq!(
        record.validate(date(2024, 1, 10)),
        Err(ValidationError::CycleLengthOutOfRange(41))
    );
}

#[test]
fn future_start_date_is_rejected() {
    let record = PeriodRecord::new("p-1", date(2024, 1, 11), now());
    assert!(matches!(
        record.validate(date(2024, 1, 10)),
        Err(ValidationError::StartDateInFuture { .. })
    ));
}

#[test]
fn symptoms_stay_unique_and_ordered() {
    let mut record = PeriodRecord::new("p-1", date(2024, 1, 1), now());

    assert_eq!(record.add_symptom("Cramps"), Ok(true));
    assert_eq!(record.add_symptom(" Headache "), Ok(true));
    assert_eq!(record.add_symptom("Cramps"), Ok(false));
    assert_eq!(record.add_symptom("  "), Err(ValidationError::EmptySymptom));
    assert_eq!(record.symptoms, vec!["Cramps", "Headache"]);

    assert!(record.remove_symptom("Cramps"));
    assert!(!record.remove_symptom("Cramps"));

    record.symptoms.push("Headache".to_string());
    assert_eq!(
        record.validate(date(2024, 1, 10)),
        Err(ValidationError::DuplicateSymptom("Headache".to_string()))
    );
    assert_eq!(COMMON_SYMPTOMS.len(), 10);
}

#[test]
fn next_period_keeps_lengths_and_clears_tracking_data() {
    let mut record = PeriodRecord::new("p-1", date(2024, 1, 1), now());
    record.set_cycle_length(32).unwrap();
    record.add_symptom("Fatigue").unwrap();
    record.notes = "tired".to_string();

    let next = record.next_period("p-2", date(2024, 2, 2), now());
    assert_eq!(next.id, "p-2");
    assert_eq!(next.cycle_length, 32);
    assert!(next.symptoms.is_empty());
    assert!(next.notes.is_empty());

    record.reset(date(2024, 1, 10), now());
    assert_eq!(record.id, "p-1");
    assert_eq!(record.cycle_length, 28);
    assert_eq!(record.last_period_start_date, date(2024, 1, 10));
}

#[test]
fn contact_without_phone_or_email_is_rejected() {
    let jane = contact("c-1", "Jane", None, None);
    assert_eq!(
        jane.validate(date(2024, 1, 10)),
        Err(ValidationError::MissingContactMethod)
    );
}

#[test]
fn contact_input_is_trimmed_and_blank_fields_dropped() {
    let created = EmergencyContact::new(
        "c-1",
        NewContact {
            name: "  Mom ".to_string(),
            phone: Some("   ".to_string()),
            email: Some(" mom@example.com ".to_string()),
            relationship: Some(String::new()),
        },
        now(),
    );

    assert_eq!(created.name, "Mom");
    assert_eq!(created.phone, None);
    assert_eq!(created.email.as_deref(), Some("mom@example.com"));
    assert_eq!(created.relationship, None);
    assert!(created.has_contact_method());
    assert!(created.validate(date(2024, 1, 10)).is_ok());
}

#[test]
fn contact_rejects_malformed_email_and_blank_name() {
    let bad_email = contact("c-1", "Jane", None, Some("jane-at-example"));
    assert!(matches!(
        bad_email.validate(date(2024, 1, 10)),
        Err(ValidationError::InvalidEmail(_))
    ));

    let no_name = contact("c-2", " ", Some("555-0100"), None);
    assert_eq!(
        no_name.validate(date(2024, 1, 10)),
        Err(ValidationError::EmptyContactName)
    );
}

#[test]
fn tracking_sample_starts_resolved() {
    let sample = SosEvent::tracking_sample("s-1", "user-1", position(), now());
    assert!(sample.is_resolved);
    assert_eq!(sample.resolved_at, Some(now()));
    assert_eq!(sample.message, TRACKING_MESSAGE);
    assert!(sample.validate(date(2024, 1, 10)).is_ok());
}

#[test]
fn sos_event_only_allows_resolution_changes() {
    let alert = SosEvent::alert("s-1", "user-1", position(), "help", now());

    let mut resolved = alert.clone();
    resolved.resolve(now());
    assert!(SosEvent::check_transition(&alert, &resolved).is_ok());

    let mut moved = alert.clone();
    moved.latitude = 0.0;
    assert_eq!(
        SosEvent::check_transition(&alert, &moved),
        Err(ValidationError::ImmutableAlertField("location"))
    );

    assert_eq!(
        SosEvent::check_transition(&resolved, &alert),
        Err(ValidationError::AlertReopened)
    );
}

#[test]
fn sos_event_rejects_out_of_range_coordinates() {
    let mut alert = SosEvent::alert("s-1", "user-1", position(), "help", now());
    alert.longitude = 181.0;
    assert!(matches!(
        alert.validate(date(2024, 1, 10)),
        Err(ValidationError::InvalidCoordinates { .. })
    ));

    alert.longitude = 80.0;
    alert.accuracy = -1.0;
    assert_eq!(
        alert.validate(date(2024, 1, 10)),
        Err(ValidationError::InvalidAccuracy(-1.0))
    );
}
