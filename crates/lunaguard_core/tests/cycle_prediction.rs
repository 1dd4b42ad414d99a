use chrono::{Duration, NaiveDate};
use lunaguard_core::model::period::{check_lengths, PeriodRecord};
use lunaguard_core::predict::calendar::{format_long, format_short};
use lunaguard_core::{predict_cycle, CycleCalendar, DayMarker, ValidationError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn standard_cycle_forecast_matches_reference_dates() {
    let forecast = predict_cycle(date(2024, 1, 1), 28, date(2024, 1, 10));

    assert_eq!(forecast.next_period_date, date(2024, 1, 29));
    assert_eq!(forecast.ovulation_date, date(2024, 1, 1));
    assert_eq!(forecast.fertility_window_start, date(2023, 12, 27));
    assert_eq!(forecast.fertility_window_end, date(2024, 1, 2));
    assert_eq!(forecast.days_until_next_period, 19);
    assert!(!forecast.is_overdue());
}

#[test]
fn forecast_is_pure_for_identical_inputs() {
    let first = predict_cycle(date(2024, 2, 14), 33, date(2024, 3, 1));
    let second = predict_cycle(date(2024, 2, 14), 33, date(2024, 3, 1));
    assert_eq!(first, second);
}

#[test]
fn next_period_and_ovulation_follow_cycle_length_across_domain() {
    let start = date(2024, 1, 1);
    for cycle_length in 21..=40u32 {
        let forecast = predict_cycle(start, cycle_length, start);
        let length = i64::from(cycle_length);

        assert_eq!(forecast.next_period_date, start + Duration::days(length));
        assert_eq!(
            forecast.ovulation_date,
            start + Duration::days(length / 2 - 14)
        );
        assert_eq!(forecast.days_until_next_period, length);

        let window = forecast.fertility_window_days();
        assert_eq!(window.len(), 7, "cycle {cycle_length}");
        assert_eq!(window[0], forecast.ovulation_date - Duration::days(5));
        assert_eq!(window[6], forecast.ovulation_date + Duration::days(1));
    }
}

#[test]
fn overdue_period_gives_negative_countdown() {
    let forecast = predict_cycle(date(2024, 1, 1), 28, date(2024, 2, 5));
    assert_eq!(forecast.days_until_next_period, -7);
    assert!(forecast.is_overdue());
}

#[test]
fn leap_day_is_counted() {
    let forecast = predict_cycle(date(2024, 2, 10), 28, date(2024, 2, 10));
    assert_eq!(forecast.next_period_date, date(2024, 3, 9));
}

#[test]
fn calendar_marks_period_ovulation_and_fertile_days() {
    let calendar = CycleCalendar::new(date(2024, 3, 1), 30, 5, date(2024, 3, 3));

    assert_eq!(calendar.period_days.len(), 5);
    assert_eq!(calendar.next_period_days[0], date(2024, 3, 31));
    assert_eq!(calendar.ovulation_day, date(2024, 3, 2));

    // Period wins over ovulation: Mar 2 is both.
    assert_eq!(calendar.marker(date(2024, 3, 2)), Some(DayMarker::Period));
    assert_eq!(calendar.marker(date(2024, 2, 27)), Some(DayMarker::Fertile));
    assert_eq!(calendar.marker(date(2024, 4, 4)), Some(DayMarker::Period));
    assert_eq!(calendar.marker(date(2024, 3, 15)), None);
}

#[test]
fn calendar_ovulation_day_outside_period_is_marked_ovulation() {
    let calendar = CycleCalendar::new(date(2024, 1, 1), 40, 3, date(2024, 1, 1));
    assert_eq!(calendar.ovulation_day, date(2024, 1, 7));
    assert_eq!(calendar.marker(date(2024, 1, 7)), Some(DayMarker::Ovulation));
    assert_eq!(calendar.marker(date(2024, 1, 8)), Some(DayMarker::Fertile));
}

#[test]
fn record_forecast_uses_record_fields() {
    let now = date(2024, 1, 1).and_hms_opt(8, 0, 0).unwrap().and_utc();
    let mut record = PeriodRecord::new("p-1", date(2024, 1, 1), now);
    record.set_cycle_length(35).unwrap();

    let forecast = record.forecast(date(2024, 1, 1));
    assert_eq!(forecast.next_period_date, date(2024, 2, 5));
    assert_eq!(
        CycleCalendar::for_record(&record, date(2024, 1, 1)).forecast,
        forecast
    );
}

#[test]
fn unchecked_calendar_input_is_rejected_instead_of_panicking() {
    assert_eq!(
        CycleCalendar::try_new(date(2024, 1, 1), u32::MAX, 5, date(2024, 1, 10)),
        Err(ValidationError::CycleLengthOutOfRange(u32::MAX))
    );
    assert_eq!(
        CycleCalendar::try_new(date(2024, 1, 1), 28, 0, date(2024, 1, 10)),
        Err(ValidationError::PeriodLengthOutOfRange(0))
    );
    assert_eq!(
        CycleCalendar::try_new(NaiveDate::MAX, 28, 5, date(2024, 1, 10)),
        Err(ValidationError::DateOutOfRange(NaiveDate::MAX))
    );
}

#[test]
fn checked_calendar_matches_unchecked_for_valid_lengths() {
    let checked = CycleCalendar::try_new(date(2024, 3, 1), 30, 5, date(2024, 3, 3));
    let unchecked = CycleCalendar::new(date(2024, 3, 1), 30, 5, date(2024, 3, 3));
    assert_eq!(checked, Ok(unchecked));
}

#[test]
fn length_bounds_are_inclusive() {
    assert_eq!(check_lengths(21, 3), Ok(()));
    assert_eq!(check_lengths(40, 10), Ok(()));
    assert_eq!(
        check_lengths(20, 5),
        Err(ValidationError::CycleLengthOutOfRange(20))
    );
    assert_eq!(
        check_lengths(28, 11),
        Err(ValidationError::PeriodLengthOutOfRange(11))
    );
}

#[test]
fn display_formats_match_calendar_labels() {
    assert_eq!(format_long(date(2024, 1, 29)), "January 29, 2024");
    assert_eq!(format_short(date(2024, 1, 9)), "Jan 9, 2024");
}
