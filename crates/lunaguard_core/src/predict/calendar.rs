//! Calendar day classification for the cycle view.

use crate::model::period::{check_lengths, PeriodRecord};
use crate::model::validation::ValidationError;
use crate::predict::cycle::{predict_cycle, try_predict_cycle, CycleForecast};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Highlight applied to one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMarker {
    Period,
    Ovulation,
    Fertile,
}

/// Highlighted days around one tracked cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleCalendar {
    pub forecast: CycleForecast,
    /// Days of the tracked period, starting at the recorded start date.
    pub period_days: Vec<NaiveDate>,
    /// Days of the predicted next period.
    pub next_period_days: Vec<NaiveDate>,
    pub fertility_days: Vec<NaiveDate>,
    pub ovulation_day: NaiveDate,
}

impl CycleCalendar {
    pub fn new(
        last_start: NaiveDate,
        cycle_length: u32,
        period_length: u32,
        today: NaiveDate,
    ) -> Self {
        let forecast = predict_cycle(last_start, cycle_length, today);
        Self::from_forecast(forecast, last_start, period_length)
    }

    /// Like `new`, for lengths that have not been validated.
    ///
    /// # Errors
    /// - A length outside its allowed range.
    /// - `DateOutOfRange` when a forecast date overflows the calendar.
    pub fn try_new(
        last_start: NaiveDate,
        cycle_length: u32,
        period_length: u32,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        check_lengths(cycle_length, period_length)?;
        let forecast = try_predict_cycle(last_start, cycle_length, today)
            .ok_or(ValidationError::DateOutOfRange(last_start))?;
        Ok(Self::from_forecast(forecast, last_start, period_length))
    }

    fn from_forecast(forecast: CycleForecast, last_start: NaiveDate, period_length: u32) -> Self {
        let span = usize::try_from(period_length).unwrap_or(usize::MAX);
        Self {
            forecast,
            period_days: last_start.iter_days().take(span).collect(),
            next_period_days: forecast.next_period_date.iter_days().take(span).collect(),
            fertility_days: forecast.fertility_window_days(),
            ovulation_day: forecast.ovulation_date,
        }
    }

    pub fn for_record(record: &PeriodRecord, today: NaiveDate) -> Self {
        Self::new(
            record.last_period_start_date,
            record.cycle_length,
            record.period_length,
            today,
        )
    }

    /// Marker for `date`. Period days win over ovulation, ovulation over fertile.
    pub fn marker(&self, date: NaiveDate) -> Option<DayMarker> {
        if self.period_days.contains(&date) || self.next_period_days.contains(&date) {
            return Some(DayMarker::Period);
        }
        if date == self.ovulation_day {
            return Some(DayMarker::Ovulation);
        }
        if self.forecast.is_in_fertility_window(date) {
            return Some(DayMarker::Fertile);
        }
        None
    }
}

/// "January 29, 2024"
pub fn format_long(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// "Jan 29, 2024"
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
