//! Common entity machinery shared by tasks and contacts.
//!
//! Defines the [`EntityId`] newtype, the [`Entity`] trait that lets the
//! cache and store stay generic over the concrete entity kind, and the
//! sort order a collection is fetched with.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapper::MappingError;

/// Unique identifier for an entity within its collection.
///
/// Ids are assigned by the authoritative backend, never locally. The
/// wrapper is deliberately opaque: the backend may hand out UUIDs or any
/// other non-empty string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an entity identifier from a string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort direction for one ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// One column of a collection's fetch ordering.
///
/// A `select` orders by each key in turn; rows with a missing value for a
/// key sort after all present values when `nulls_last` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    /// Remote column name (snake_case).
    pub column: &'static str,
    /// Sort direction.
    pub direction: Direction,
    /// Whether missing values sort after present ones.
    pub nulls_last: bool,
}

/// Errors produced when validating a draft or patch before it is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {max} characters)")]
    TitleTooLong {
        /// Maximum allowed length in characters.
        max: usize,
    },
    /// Due date lies in the past.
    #[error("due date {0} is in the past")]
    DueDatePast(chrono::NaiveDate),
    /// Two subtasks share the same id.
    #[error("duplicate subtask id: {0}")]
    DuplicateSubtaskId(String),
    /// Contact name must contain at least two words.
    #[error("contact name must contain at least two words")]
    NameTooShort,
    /// Contact name must not contain digits.
    #[error("contact name must not contain digits")]
    NameHasDigits,
    /// Email address is not structurally valid.
    #[error("invalid email address: {0}")]
    EmailInvalid(String),
    /// Phone number must be digits with an optional leading `+`.
    #[error("invalid phone number: {0}")]
    PhoneInvalid(String),
}

/// A record kind the store can cache and synchronize with the backend.
///
/// Implemented by [`Task`](crate::Task) and [`Contact`](crate::Contact).
/// The associated `Draft` carries the client-supplied fields of a new
/// entity (no id, no server timestamp); the associated `Patch` is an
/// all-optional partial update.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Client-supplied fields for a new entity.
    type Draft: Send + Sync;
    /// Partial field update.
    type Patch: Clone + Send + Sync;

    /// Remote table this entity collection lives in.
    const TABLE: &'static str;

    /// The entity's unique, server-assigned id.
    fn id(&self) -> &EntityId;

    /// Ordering the collection is fetched with.
    fn order() -> &'static [OrderKey];

    /// Merge a partial update into this entity in place.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Validate a draft before insertion.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a required field is missing or a
    /// field violates its documented constraint.
    fn validate_draft(draft: &Self::Draft) -> Result<(), ValidationError>;

    /// Validate a patch before it is applied and sent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a patched field violates its
    /// documented constraint.
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

    /// Translate an authoritative remote record into the domain shape.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when the record is malformed.
    fn from_record(record: &serde_json::Value) -> Result<Self, MappingError>;

    /// Translate a draft into a full insert row.
    fn draft_to_record(draft: &Self::Draft) -> serde_json::Value;

    /// Translate a patch into a partial row containing only present fields.
    fn patch_to_record(patch: &Self::Patch) -> serde_json::Map<String, serde_json::Value>;
}
