//! Emergency contact record.
//!
//! # Invariants
//! - `name` is non-blank.
//! - At least one of `phone` / `email` is present.
//! - Blank optional input is stored as `None`, never as an empty string.
//! - Contacts are never edited in place; an edit is delete + recreate.

use crate::model::entity::{Deletable, Entity, EntityKind, RecordId};
use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()\-]+$").expect("valid phone regex"));

const MIN_PHONE_DIGITS: usize = 3;

/// Form input for a new contact, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
}

/// Trusted person who receives SOS alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmergencyContact {
    /// Builds a contact from form input, trimming text and dropping blanks.
    ///
    /// This constructor does not validate; callers go through `Entity::validate`.
    pub fn new(id: impl Into<RecordId>, input: NewContact, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: input.name.trim().to_string(),
            phone: non_blank(input.phone),
            email: non_blank(input.email),
            relationship: non_blank(input.relationship),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_contact_method(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }
}

impl Entity for EmergencyContact {
    const KIND: EntityKind = EntityKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self, _today: NaiveDate) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyContactName);
        }
        let phone = self.phone.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let email = self.email.as_deref().map(str::trim).filter(|v| !v.is_empty());
        if phone.is_none() && email.is_none() {
            return Err(ValidationError::MissingContactMethod);
        }
        if let Some(phone) = phone {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if !PHONE_RE.is_match(phone) || digits < MIN_PHONE_DIGITS {
                return Err(ValidationError::InvalidPhone(phone.to_string()));
            }
        }
        if let Some(email) = email {
            if !EMAIL_RE.is_match(email) {
                return Err(ValidationError::InvalidEmail(email.to_string()));
            }
        }
        Ok(())
    }
}

impl Deletable for EmergencyContact {}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
