//! Task domain types: board status, kind, priority, drafts and patches.
//!
//! A [`Task`] is an immutable-id board card. Clients describe new tasks
//! with a [`TaskDraft`] (the backend assigns id, creation timestamp and
//! sort position) and edit existing ones with an all-optional
//! [`TaskPatch`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Direction, Entity, EntityId, OrderKey, ValidationError};
use crate::mapper::{self, MappingError};

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Board column a task currently sits in.
///
/// Moving a task between columns is the only way its status changes; any
/// column is reachable from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Waiting on review or feedback.
    AwaitFeedback,
    /// Finished.
    Done,
}

impl Status {
    /// All four board columns in display order.
    pub const ALL: [Self; 4] = [
        Self::Todo,
        Self::InProgress,
        Self::AwaitFeedback,
        Self::Done,
    ];

    /// The string this status is stored as remotely.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::AwaitFeedback => "awaitFeedback",
            Self::Done => "done",
        }
    }

    /// Parse the remote representation. Unknown strings are rejected:
    /// a status outside the four columns is malformed data, not a value
    /// to coerce.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "inProgress" => Some(Self::InProgress),
            "awaitFeedback" => Some(Self::AwaitFeedback),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// User-facing feature work.
    UserStory,
    /// Internal or technical work.
    TechnicalTask,
}

impl TaskKind {
    /// The string this kind is stored as remotely.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::UserStory => "User Story",
            Self::TechnicalTask => "Technical Task",
        }
    }

    /// Parse the remote representation. Unknown or absent kinds fall back
    /// to [`TaskKind::TechnicalTask`].
    #[must_use]
    pub fn from_wire_or_default(s: Option<&str>) -> Self {
        match s {
            Some("User Story") => Self::UserStory,
            _ => Self::TechnicalTask,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    /// Needs attention first.
    High,
    /// Default urgency.
    Medium,
    /// Can wait.
    Low,
}

impl Priority {
    /// The string this priority is stored as remotely.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Parse the remote representation. Unknown or absent priorities fall
    /// back to [`Priority::Medium`].
    #[must_use]
    pub fn from_wire_or_default(s: Option<&str>) -> Self {
        match s {
            Some("high") => Self::High,
            Some("low") => Self::Low,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A person a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    /// Contact or user id.
    pub id: String,
    /// Short initials shown on the card avatar.
    pub initials: String,
    /// Full display name, when known.
    pub name: Option<String>,
}

/// A checklist item within a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Id unique within the owning task.
    pub id: String,
    /// Checklist text.
    pub title: String,
    /// Whether the item is checked off.
    pub done: bool,
}

/// A board card tracked by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Server-assigned id, immutable after creation.
    pub id: EntityId,
    /// Required, non-empty title.
    pub title: String,
    /// Optional body text.
    pub description: Option<String>,
    /// Board column.
    pub status: Status,
    /// Kind of work.
    pub kind: TaskKind,
    /// Urgency.
    pub priority: Priority,
    /// Ordered assignee list, possibly empty.
    pub assignees: Vec<Assignee>,
    /// Ordered checklist, possibly empty; subtask ids unique per task.
    pub subtasks: Vec<Subtask>,
    /// Server creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
    /// Optional deadline; validated to be today or later on write.
    pub due_date: Option<NaiveDate>,
    /// Optional sort key; tasks without one sort last.
    pub position: Option<i64>,
}

/// Client-supplied fields of a new task.
///
/// The backend assigns `id`, `created_at` and `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Required, non-empty title.
    pub title: String,
    /// Optional body text.
    pub description: Option<String>,
    /// Column the task starts in.
    pub status: Status,
    /// Kind of work.
    pub kind: TaskKind,
    /// Urgency.
    pub priority: Priority,
    /// Initial assignees.
    pub assignees: Vec<Assignee>,
    /// Initial checklist.
    pub subtasks: Vec<Subtask>,
    /// Optional deadline, today or later.
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    /// A draft with only a title set, everything else defaulted.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: Status::Todo,
            kind: TaskKind::TechnicalTask,
            priority: Priority::Medium,
            assignees: Vec::new(),
            subtasks: Vec::new(),
            due_date: None,
        }
    }
}

/// Partial update to a task. Absent fields are left untouched.
///
/// `due_date` is doubly optional: `Some(None)` clears the deadline
/// remotely (maps to JSON `null`), `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New board column.
    pub status: Option<Status>,
    /// New kind.
    pub kind: Option<TaskKind>,
    /// New priority.
    pub priority: Option<Priority>,
    /// Replacement assignee list.
    pub assignees: Option<Vec<Assignee>>,
    /// Replacement checklist.
    pub subtasks: Option<Vec<Subtask>>,
    /// Deadline change: `Some(Some(d))` sets, `Some(None)` clears.
    pub due_date: Option<Option<NaiveDate>>,
    /// New sort key.
    pub position: Option<i64>,
}

impl TaskPatch {
    /// A patch that only moves the task to another column.
    #[must_use]
    pub fn status_only(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Checks that subtask ids are unique within one task.
fn check_subtask_ids(subtasks: &[Subtask]) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::with_capacity(subtasks.len());
    for sub in subtasks {
        if !seen.insert(sub.id.as_str()) {
            return Err(ValidationError::DuplicateSubtaskId(sub.id.clone()));
        }
    }
    Ok(())
}

/// Checks a title for emptiness and length.
fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

/// Checks that a deadline is today or later.
fn check_due_date(due: NaiveDate) -> Result<(), ValidationError> {
    if due < Utc::now().date_naive() {
        return Err(ValidationError::DueDatePast(due));
    }
    Ok(())
}

impl Entity for Task {
    type Draft = TaskDraft;
    type Patch = TaskPatch;

    const TABLE: &'static str = "tasks";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn order() -> &'static [OrderKey] {
        // Board order: explicit position first, newest-created breaking ties.
        &[
            OrderKey {
                column: "position",
                direction: Direction::Ascending,
                nulls_last: true,
            },
            OrderKey {
                column: "created_at",
                direction: Direction::Descending,
                nulls_last: true,
            },
        ]
    }

    fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignees) = &patch.assignees {
            self.assignees = assignees.clone();
        }
        if let Some(subtasks) = &patch.subtasks {
            self.subtasks = subtasks.clone();
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(position) = patch.position {
            self.position = Some(position);
        }
    }

    fn validate_draft(draft: &TaskDraft) -> Result<(), ValidationError> {
        check_title(&draft.title)?;
        if let Some(due) = draft.due_date {
            check_due_date(due)?;
        }
        check_subtask_ids(&draft.subtasks)
    }

    fn validate_patch(patch: &TaskPatch) -> Result<(), ValidationError> {
        if let Some(title) = &patch.title {
            check_title(title)?;
        }
        if let Some(Some(due)) = patch.due_date {
            check_due_date(due)?;
        }
        if let Some(subtasks) = &patch.subtasks {
            check_subtask_ids(subtasks)?;
        }
        Ok(())
    }

    fn from_record(record: &serde_json::Value) -> Result<Self, MappingError> {
        mapper::task_from_record(record)
    }

    fn draft_to_record(draft: &TaskDraft) -> serde_json::Value {
        mapper::task_draft_to_record(draft)
    }

    fn patch_to_record(patch: &TaskPatch) -> serde_json::Map<String, serde_json::Value> {
        mapper::task_patch_to_record(patch)
    }
}
