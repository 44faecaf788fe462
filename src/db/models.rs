//! Database Models - documents stored in each collection, plus the validation
//! applied to inbound contact-form input before anything reaches the store.

use chrono::{DateTime, SubsecRound, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Field constraints
// ============================================================================

pub const NAME_LEN: (usize, usize) = (2, 100);
pub const SUBJECT_LEN: (usize, usize) = (5, 200);
pub const MESSAGE_LEN: (usize, usize) = (10, 2000);
const EMAIL_MAX_LEN: usize = 254;

lazy_static::lazy_static! {
    /// Address syntax: dot-atom local part, at least two DNS labels after the `@`.
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .unwrap();
}

/// Returns true when `email` is a syntactically valid address.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > EMAIL_MAX_LEN || !EMAIL_REGEX.is_match(email) {
        return false;
    }
    let local = email.split('@').next().unwrap_or_default();
    !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

// ============================================================================
// Validation errors
// ============================================================================

/// A single violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every constraint an input violated, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

fn string_field<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match fields.get(name) {
        None | Some(Value::Null) => {
            errors.push(name, "field required");
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(name, "must be a string");
            None
        }
    }
}

fn bounded_text(
    fields: &Map<String, Value>,
    name: &str,
    (min, max): (usize, usize),
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = string_field(fields, name, errors)?;
    let len = value.chars().count();
    if len < min {
        errors.push(name, format!("must be at least {} characters", min));
        return None;
    }
    if len > max {
        errors.push(name, format!("must be at most {} characters", max));
        return None;
    }
    Some(value.to_string())
}

// ============================================================================
// Contact messages
// ============================================================================

/// Lifecycle of a contact message as tracked by the site owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Replied,
}

impl MessageStatus {
    pub const ALL: [MessageStatus; 3] = [Self::Unread, Self::Read, Self::Replied];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unread => "unread",
            MessageStatus::Read => "read",
            MessageStatus::Replied => "replied",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status. Must be one of: unread, read, replied")]
pub struct InvalidStatus(pub String);

impl FromStr for MessageStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// Validated contact-form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl NewContactMessage {
    /// Validates raw form fields, reporting every violation at once.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = bounded_text(fields, "name", NAME_LEN, &mut errors);
        let email = string_field(fields, "email", &mut errors).and_then(|email| {
            if is_valid_email(email) {
                Some(email.to_string())
            } else {
                errors.push("email", "value is not a valid email address");
                None
            }
        });
        let subject = bounded_text(fields, "subject", SUBJECT_LEN, &mut errors);
        let message = bounded_text(fields, "message", MESSAGE_LEN, &mut errors);

        match (name, email, subject, message) {
            (Some(name), Some(email), Some(subject), Some(message)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    email,
                    subject,
                    message,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Contact message document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

impl ContactMessage {
    /// Builds a fresh unread message. `timestamp` is truncated to the stored
    /// precision so the returned record matches what was persisted.
    pub fn new(input: NewContactMessage, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            subject: input.subject,
            message: input.message,
            timestamp: timestamp.trunc_subsecs(6),
            status: MessageStatus::default(),
        }
    }
}

// ============================================================================
// Portfolio content
// ============================================================================

/// Project document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub detailed_description: Option<String>,
    pub technologies: Vec<String>,
    pub category: String,
    pub status: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub team_size: Option<u32>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub challenges: Option<Vec<String>>,
    #[serde(default)]
    pub solutions: Option<Vec<String>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Work experience document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub role: String,
    pub period: String,
    pub location: String,
    pub achievements: Vec<String>,
    #[serde(default)]
    pub detailed_responsibilities: Option<Vec<String>>,
    #[serde(default)]
    pub technologies_used: Option<Vec<String>>,
    #[serde(default)]
    pub team_leadership: bool,
    #[serde(default)]
    pub key_projects: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Expert,
    Advanced,
    Intermediate,
}

/// Technical expertise document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalExpertise {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub years_experience: Option<u32>,
}

/// Portfolio statistics response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_projects: u64,
    pub total_experience_entries: u64,
    pub total_expertise_areas: u64,
    pub project_categories: Vec<String>,
    pub years_experience: u32,
    pub google_projects: String,
    pub specialization: String,
}

// ============================================================================
// Timestamp encoding
// ============================================================================

/// Fixed-width UTC RFC 3339 with microseconds, so the stored string sorts
/// chronologically. Any RFC 3339 offset is accepted on read.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
