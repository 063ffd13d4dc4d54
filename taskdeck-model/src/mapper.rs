//! Translation between remote table records and domain entities.
//!
//! The backend stores rows as JSON objects with snake_case, nullable
//! fields. This module is the only place that knows both shapes: it
//! renames fields (`task_type` ↔ [`TaskKind`]), substitutes documented
//! defaults for absent optional fields, and coerces `null` collections to
//! empty ones. Translation is pure and stateless; malformed records fail
//! with a [`MappingError`] rather than being silently coerced.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::contact::{Contact, ContactDraft, ContactPatch};
use crate::entity::EntityId;
use crate::task::{Assignee, Priority, Status, Subtask, Task, TaskDraft, TaskKind, TaskPatch};

/// Errors produced when a remote record cannot be translated.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The record deserialized to something other than an object of the
    /// expected shape.
    #[error("malformed remote record: {0}")]
    Shape(String),

    /// A required field was absent or null.
    #[error("remote record missing required field `{0}`")]
    MissingField(&'static str),

    /// The status string is not one of the four board columns.
    #[error("unrecognized task status `{0}`")]
    UnknownStatus(String),

    /// A timestamp failed to parse as RFC 3339.
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),

    /// A date failed to parse as `YYYY-MM-DD`.
    #[error("invalid date `{0}`")]
    InvalidDate(String),
}

// ---------------------------------------------------------------------------
// Remote record shapes (snake_case, everything nullable)
// ---------------------------------------------------------------------------

/// Raw `tasks` row as the backend returns it.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TaskRecord {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    task_type: Option<String>,
    priority: Option<String>,
    assignees: Option<Vec<Assignee>>,
    subtasks: Option<Vec<Subtask>>,
    created_at: Option<String>,
    due_date: Option<String>,
    position: Option<i64>,
}

/// Raw `contacts` row as the backend returns it.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ContactRecord {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, MappingError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MappingError::InvalidTimestamp(raw.to_string()))
}

fn parse_due_date(raw: &str) -> Result<NaiveDate, MappingError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| MappingError::InvalidDate(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Translates a raw `tasks` row into a [`Task`].
///
/// Absent collections become empty vecs; an absent `task_type` falls back
/// to [`TaskKind::TechnicalTask`] and an absent `priority` to
/// [`Priority::Medium`]. Missing id/title/status/created_at, an
/// unrecognized status, or unparseable timestamps are hard errors.
///
/// # Errors
///
/// Returns [`MappingError`] when the record is malformed.
pub fn task_from_record(record: &Value) -> Result<Task, MappingError> {
    let record = TaskRecord::deserialize(record).map_err(|e| MappingError::Shape(e.to_string()))?;

    let id = record
        .id
        .filter(|id| !id.is_empty())
        .ok_or(MappingError::MissingField("id"))?;
    let title = record.title.ok_or(MappingError::MissingField("title"))?;
    let status_raw = record.status.ok_or(MappingError::MissingField("status"))?;
    let status =
        Status::from_wire(&status_raw).ok_or(MappingError::UnknownStatus(status_raw))?;
    let created_raw = record
        .created_at
        .ok_or(MappingError::MissingField("created_at"))?;

    Ok(Task {
        id: EntityId::new(id),
        title,
        description: record.description,
        status,
        kind: TaskKind::from_wire_or_default(record.task_type.as_deref()),
        priority: Priority::from_wire_or_default(record.priority.as_deref()),
        assignees: record.assignees.unwrap_or_default(),
        subtasks: record.subtasks.unwrap_or_default(),
        created_at: parse_created_at(&created_raw)?,
        due_date: record.due_date.as_deref().map(parse_due_date).transpose()?,
        position: record.position,
    })
}

/// Translates a [`TaskDraft`] into a full insert row.
///
/// Server-assigned columns (`id`, `created_at`, `position`) are omitted;
/// absent optional fields are omitted rather than written as `null`.
#[must_use]
pub fn task_draft_to_record(draft: &TaskDraft) -> Value {
    let mut row = Map::new();
    row.insert("title".into(), Value::String(draft.title.clone()));
    if let Some(description) = &draft.description {
        row.insert("description".into(), Value::String(description.clone()));
    }
    row.insert("status".into(), Value::String(draft.status.as_wire().into()));
    row.insert(
        "task_type".into(),
        Value::String(draft.kind.as_wire().into()),
    );
    row.insert(
        "priority".into(),
        Value::String(draft.priority.as_wire().into()),
    );
    row.insert("assignees".into(), collection_value(&draft.assignees));
    row.insert("subtasks".into(), collection_value(&draft.subtasks));
    if let Some(due) = draft.due_date {
        row.insert("due_date".into(), Value::String(due.to_string()));
    }
    Value::Object(row)
}

/// Translates a [`TaskPatch`] into a partial row.
///
/// Only fields present in the patch appear; a cleared due date maps to
/// JSON `null` so the backend drops the stored value.
#[must_use]
pub fn task_patch_to_record(patch: &TaskPatch) -> Map<String, Value> {
    let mut row = Map::new();
    if let Some(title) = &patch.title {
        row.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(description) = &patch.description {
        row.insert("description".into(), Value::String(description.clone()));
    }
    if let Some(status) = patch.status {
        row.insert("status".into(), Value::String(status.as_wire().into()));
    }
    if let Some(kind) = patch.kind {
        row.insert("task_type".into(), Value::String(kind.as_wire().into()));
    }
    if let Some(priority) = patch.priority {
        row.insert("priority".into(), Value::String(priority.as_wire().into()));
    }
    if let Some(assignees) = &patch.assignees {
        row.insert("assignees".into(), collection_value(assignees));
    }
    if let Some(subtasks) = &patch.subtasks {
        row.insert("subtasks".into(), collection_value(subtasks));
    }
    match patch.due_date {
        Some(Some(due)) => {
            row.insert("due_date".into(), Value::String(due.to_string()));
        }
        Some(None) => {
            row.insert("due_date".into(), Value::Null);
        }
        None => {}
    }
    if let Some(position) = patch.position {
        row.insert("position".into(), Value::Number(position.into()));
    }
    row
}

/// Serializes a nested collection, falling back to an empty array if the
/// elements somehow fail to serialize (they are plain data and cannot).
fn collection_value<T: Serialize>(items: &[T]) -> Value {
    serde_json::to_value(items).unwrap_or_else(|_| Value::Array(Vec::new()))
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// Translates a raw `contacts` row into a [`Contact`].
///
/// An absent phone becomes the empty string (the backend stores phone as
/// nullable); missing id/name/email are hard errors.
///
/// # Errors
///
/// Returns [`MappingError`] when the record is malformed.
pub fn contact_from_record(record: &Value) -> Result<Contact, MappingError> {
    let record =
        ContactRecord::deserialize(record).map_err(|e| MappingError::Shape(e.to_string()))?;

    let id = record
        .id
        .filter(|id| !id.is_empty())
        .ok_or(MappingError::MissingField("id"))?;
    Ok(Contact {
        id: EntityId::new(id),
        name: record.name.ok_or(MappingError::MissingField("name"))?,
        email: record.email.ok_or(MappingError::MissingField("email"))?,
        phone: record.phone.unwrap_or_default(),
    })
}

/// Translates a [`ContactDraft`] into a full insert row.
#[must_use]
pub fn contact_draft_to_record(draft: &ContactDraft) -> Value {
    let mut row = Map::new();
    row.insert("name".into(), Value::String(draft.name.clone()));
    row.insert("email".into(), Value::String(draft.email.clone()));
    row.insert("phone".into(), Value::String(draft.phone.clone()));
    Value::Object(row)
}

/// Translates a [`ContactPatch`] into a partial row with only the fields
/// present in the patch.
#[must_use]
pub fn contact_patch_to_record(patch: &ContactPatch) -> Map<String, Value> {
    let mut row = Map::new();
    if let Some(name) = &patch.name {
        row.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(email) = &patch.email {
        row.insert("email".into(), Value::String(email.clone()));
    }
    if let Some(phone) = &patch.phone {
        row.insert("phone".into(), Value::String(phone.clone()));
    }
    row
}
