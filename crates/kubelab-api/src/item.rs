//! Item model and request payloads
//!
//! Payloads reject unknown fields, so `id`, `createdAt` and `updatedAt` can never
//! be supplied by a client.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

/// Maximum title length in characters
pub const TITLE_MAX_CHARS: u64 = 255;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_CHARS: u64 = 1000;

/// Item priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority (default)
    #[default]
    Medium,
    /// High priority
    High,
}

/// A persisted todo item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Server-generated identifier, immutable
    pub id: String,
    /// Title, 1-255 characters
    pub title: String,
    /// Optional description, at most 1000 characters
    #[serde(default)]
    pub description: Option<String>,
    /// Completion flag
    pub completed: bool,
    /// Priority
    pub priority: Priority,
    /// Optional due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Creation time, immutable
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build a new item from a create payload
    pub fn new(id: String, input: CreateItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            completed: input.completed,
            priority: input.priority,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay the fields present in `patch`, refreshing `updated_at`.
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply(&mut self, patch: UpdateItem, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        self.updated_at = now;
    }
}

/// Payload for `POST /api/items`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateItem {
    #[validate(length(
        min = 1,
        max = 255,
        message = "title must be between 1 and 255 characters"
    ))]
    pub title: String,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Payload for `PUT /api/items/{id}`; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_not_empty"))]
pub struct UpdateItem {
    #[validate(length(
        min = 1,
        max = 255,
        message = "title must be between 1 and 255 characters"
    ))]
    #[serde(default)]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: Option<bool>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateItem {
    /// Whether the payload carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

fn validate_not_empty(update: &UpdateItem) -> Result<(), ValidationError> {
    if update.is_empty() {
        return Err(ValidationError::new("empty_update")
            .with_message("update must contain at least one field".into()));
    }
    Ok(())
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_due_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("dueDate '{}' is not an ISO 8601 date", raw)))
}

fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
