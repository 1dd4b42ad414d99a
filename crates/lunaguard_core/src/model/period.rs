//! Period tracking record.
//!
//! # Responsibility
//! - Hold one tracked cycle: start date, cycle/period lengths, symptoms, notes.
//! - Provide validated setters mirroring the settings and tracking editors.
//!
//! # Invariants
//! - `cycle_length` stays within 21..=40 and `period_length` within 3..=10.
//! - `symptoms` keeps insertion order and never contains duplicates.
//! - `last_period_start_date` is not after the caller's `today`.

use crate::model::entity::{Deletable, Entity, EntityKind, RecordId};
use crate::model::validation::ValidationError;
use crate::predict::cycle::{predict_cycle, CycleForecast};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

pub const CYCLE_LENGTH_RANGE: RangeInclusive<u32> = 21..=40;
pub const PERIOD_LENGTH_RANGE: RangeInclusive<u32> = 3..=10;
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

/// Symptoms offered by the tracking picker.
pub const COMMON_SYMPTOMS: [&str; 10] = [
    "Mood Swings",
    "Cramps",
    "Headache",
    "Breast Tenderness",
    "Bloating",
    "Lower Back Pain",
    "Fatigue",
    "Food Cravings",
    "Insomnia",
    "Nausea",
];

/// One tracked menstrual cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub id: RecordId,
    pub last_period_start_date: NaiveDate,
    pub cycle_length: u32,
    pub period_length: u32,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PeriodRecord {
    /// Creates a record with default lengths and no symptoms.
    pub fn new(id: impl Into<RecordId>, start: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            last_period_start_date: start,
            cycle_length: DEFAULT_CYCLE_LENGTH,
            period_length: DEFAULT_PERIOD_LENGTH,
            symptoms: Vec::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Starts tracking another period under a fresh id.
    ///
    /// Cycle and period lengths carry over; symptoms and notes start empty.
    pub fn next_period(
        &self,
        id: impl Into<RecordId>,
        start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            cycle_length: self.cycle_length,
            period_length: self.period_length,
            ..Self::new(id, start, now)
        }
    }

    /// Restores default lengths and clears tracking data, keeping the id.
    pub fn reset(&mut self, today: NaiveDate, now: DateTime<Utc>) {
        self.last_period_start_date = today;
        self.cycle_length = DEFAULT_CYCLE_LENGTH;
        self.period_length = DEFAULT_PERIOD_LENGTH;
        self.symptoms.clear();
        self.notes.clear();
        self.updated_at = now;
    }

    /// Sets the cycle length, rejecting values outside 21..=40.
    pub fn set_cycle_length(&mut self, days: u32) -> Result<(), ValidationError> {
        if !CYCLE_LENGTH_RANGE.contains(&days) {
            return Err(ValidationError::CycleLengthOutOfRange(days));
        }
        self.cycle_length = days;
        Ok(())
    }

    /// Sets the period length, rejecting values outside 3..=10.
    pub fn set_period_length(&mut self, days: u32) -> Result<(), ValidationError> {
        if !PERIOD_LENGTH_RANGE.contains(&days) {
            return Err(ValidationError::PeriodLengthOutOfRange(days));
        }
        self.period_length = days;
        Ok(())
    }

    /// Adds a symptom. Returns `Ok(false)` when it was already present.
    pub fn add_symptom(&mut self, symptom: &str) -> Result<bool, ValidationError> {
        let trimmed = symptom.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymptom);
        }
        if self.symptoms.iter().any(|existing| existing == trimmed) {
            return Ok(false);
        }
        self.symptoms.push(trimmed.to_string());
        Ok(true)
    }

    /// Removes a symptom. Returns whether anything was removed.
    pub fn remove_symptom(&mut self, symptom: &str) -> bool {
        let before = self.symptoms.len();
        self.symptoms.retain(|existing| existing != symptom.trim());
        before != self.symptoms.len()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Forecast derived from this record's start date and cycle length.
    pub fn forecast(&self, today: NaiveDate) -> CycleForecast {
        predict_cycle(self.last_period_start_date, self.cycle_length, today)
    }
}

/// Checks cycle and period lengths against their allowed ranges.
pub fn check_lengths(cycle_length: u32, period_length: u32) -> Result<(), ValidationError> {
    if !CYCLE_LENGTH_RANGE.contains(&cycle_length) {
        return Err(ValidationError::CycleLengthOutOfRange(cycle_length));
    }
    if !PERIOD_LENGTH_RANGE.contains(&period_length) {
        return Err(ValidationError::PeriodLengthOutOfRange(period_length));
    }
    Ok(())
}

impl Entity for PeriodRecord {
    const KIND: EntityKind = EntityKind::Period;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        check_lengths(self.cycle_length, self.period_length)?;
        if self.last_period_start_date > today {
            return Err(ValidationError::StartDateInFuture {
                start: self.last_period_start_date,
                today,
            });
        }

        let mut seen = HashSet::with_capacity(self.symptoms.len());
        for symptom in &self.symptoms {
            if symptom.trim().is_empty() {
                return Err(ValidationError::EmptySymptom);
            }
            if !seen.insert(symptom.as_str()) {
                return Err(ValidationError::DuplicateSymptom(symptom.clone()));
            }
        }

        Ok(())
    }
}

impl Deletable for PeriodRecord {}
