//! Backend row shapes and entity mapping.
//!
//! Rows use the backend's snake_case column names. Nullable columns are
//! `Option` here and coerced to entity defaults on the way in.

use crate::model::contact::{non_blank, EmergencyContact};
use crate::model::entity::Entity;
use crate::model::period::{PeriodRecord, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};
use crate::model::sos::{SosEvent, ANONYMOUS_USER_ID};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const ROW_DATE_FORMAT: &str = "%Y-%m-%d";

/// Entity that maps to one backend table row.
pub trait RemoteRecord: Entity {
    type Row: Serialize + DeserializeOwned;

    /// Builds the row to upsert. `user_id` is the current identity, if any.
    fn to_row(&self, user_id: Option<&str>) -> Self::Row;

    /// Maps a fetched row back into an entity. Errors describe the bad column.
    fn from_row(row: Self::Row) -> Result<Self, String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub last_period_start_date: String,
    #[serde(default = "default_cycle_length")]
    pub cycle_length: u32,
    #[serde(default = "default_period_length")]
    pub period_length: u32,
    #[serde(default)]
    pub symptoms: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosAlertRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub alert_message: Option<String>,
    #[serde(default)]
    pub is_resolved: Option<bool>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RemoteRecord for PeriodRecord {
    type Row = PeriodRow;

    fn to_row(&self, user_id: Option<&str>) -> PeriodRow {
        PeriodRow {
            id: self.id.clone(),
            user_id: user_id.map(str::to_string),
            last_period_start_date: self.last_period_start_date.format(ROW_DATE_FORMAT).to_string(),
            cycle_length: self.cycle_length,
            period_length: self.period_length,
            symptoms: Some(self.symptoms.clone()),
            notes: Some(self.notes.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_row(row: PeriodRow) -> Result<Self, String> {
        let start = parse_row_date(&row.last_period_start_date).ok_or_else(|| {
            format!(
                "invalid last_period_start_date `{}`",
                row.last_period_start_date
            )
        })?;

        let mut symptoms: Vec<String> = Vec::new();
        for symptom in row.symptoms.unwrap_or_default() {
            let trimmed = symptom.trim();
            if !trimmed.is_empty() && !symptoms.iter().any(|s| s == trimmed) {
                symptoms.push(trimmed.to_string());
            }
        }

        Ok(PeriodRecord {
            id: row.id,
            last_period_start_date: start,
            cycle_length: row.cycle_length,
            period_length: row.period_length,
            symptoms,
            notes: row.notes.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl RemoteRecord for EmergencyContact {
    type Row = ContactRow;

    fn to_row(&self, user_id: Option<&str>) -> ContactRow {
        ContactRow {
            id: self.id.clone(),
            user_id: user_id.map(str::to_string),
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            relationship: self.relationship.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_row(row: ContactRow) -> Result<Self, String> {
        if row.name.trim().is_empty() {
            return Err("empty name".to_string());
        }
        Ok(EmergencyContact {
            id: row.id,
            name: row.name,
            phone: non_blank(row.phone),
            email: non_blank(row.email),
            relationship: non_blank(row.relationship),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl RemoteRecord for SosEvent {
    type Row = SosAlertRow;

    /// Synthesized anonymous ids stay local; only a real identity is sent.
    fn to_row(&self, user_id: Option<&str>) -> SosAlertRow {
        SosAlertRow {
            id: self.id.clone(),
            user_id: user_id.map(str::to_string),
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: Some(self.accuracy),
            alert_message: Some(self.message.clone()),
            is_resolved: Some(self.is_resolved),
            resolved_at: self.resolved_at,
            created_at: self.created_at,
        }
    }

    fn from_row(row: SosAlertRow) -> Result<Self, String> {
        Ok(SosEvent {
            id: row.id,
            user_id: non_blank(row.user_id).unwrap_or_else(|| ANONYMOUS_USER_ID.to_string()),
            latitude: row.latitude,
            longitude: row.longitude,
            accuracy: row.accuracy.unwrap_or(0.0),
            message: row.alert_message.unwrap_or_default(),
            is_resolved: row.is_resolved.unwrap_or(false),
            resolved_at: row.resolved_at,
            created_at: row.created_at,
        })
    }
}

/// Accepts plain dates and full RFC 3339 timestamps.
fn parse_row_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, ROW_DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        })
}

fn default_cycle_length() -> u32 {
    DEFAULT_CYCLE_LENGTH
}

fn default_period_length() -> u32 {
    DEFAULT_PERIOD_LENGTH
}
