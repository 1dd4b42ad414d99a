//! Domain validation errors shared by all entity kinds.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Invariant violation that blocks a write before any store is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyId,
    CycleLengthOutOfRange(u32),
    PeriodLengthOutOfRange(u32),
    StartDateInFuture { start: NaiveDate, today: NaiveDate },
    /// Forecast dates derived from this start date overflow the calendar.
    DateOutOfRange(NaiveDate),
    EmptySymptom,
    DuplicateSymptom(String),
    EmptyContactName,
    MissingContactMethod,
    InvalidEmail(String),
    InvalidPhone(String),
    EmptyUserId,
    InvalidCoordinates { latitude: f64, longitude: f64 },
    InvalidAccuracy(f64),
    /// An append-only alert field differs from the stored record.
    ImmutableAlertField(&'static str),
    /// A resolved alert cannot be reopened.
    AlertReopened,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id cannot be empty"),
            Self::CycleLengthOutOfRange(value) => {
                write!(f, "cycle length {value} is outside 21..=40 days")
            }
            Self::PeriodLengthOutOfRange(value) => {
                write!(f, "period length {value} is outside 3..=10 days")
            }
            Self::StartDateInFuture { start, today } => {
                write!(f, "last period start {start} is after today ({today})")
            }
            Self::DateOutOfRange(start) => {
                write!(f, "forecast dates for start {start} are out of range")
            }
            Self::EmptySymptom => write!(f, "symptom cannot be empty"),
            Self::DuplicateSymptom(value) => write!(f, "symptom listed twice: `{value}`"),
            Self::EmptyContactName => write!(f, "please enter a contact name"),
            Self::MissingContactMethod => {
                write!(f, "please enter a phone number or email address")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::InvalidPhone(value) => write!(f, "invalid phone number: `{value}`"),
            Self::EmptyUserId => write!(f, "alert user id cannot be empty"),
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => write!(f, "invalid coordinates ({latitude}, {longitude})"),
            Self::InvalidAccuracy(value) => write!(f, "invalid location accuracy {value}"),
            Self::ImmutableAlertField(field) => {
                write!(f, "alert field `{field}` cannot change after creation")
            }
            Self::AlertReopened => write!(f, "a resolved alert cannot be reopened"),
        }
    }
}

impl Error for ValidationError {}
