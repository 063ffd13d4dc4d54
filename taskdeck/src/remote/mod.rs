//! Remote store client contract.
//!
//! The authoritative backend (tables + identity) is an external
//! collaborator; this module defines the seam the store talks through.
//! Concrete implementations include:
//! - [`memory::MemoryBackend`] — in-process reference backend for tests
//!   and local development
//!
//! Rows cross the seam as JSON objects; the entity mapper on the model
//! side owns both shapes.

pub mod memory;

use std::future::Future;

use serde_json::{Map, Value};

use taskdeck_model::{EntityId, OrderKey};

/// Errors surfaced by the remote backend.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The backend rejected the request.
    #[error("backend rejected the request: {0}")]
    Rejected(String),

    /// The named table does not exist.
    #[error("no such table `{0}`")]
    UnknownTable(String),

    /// Sign-in failed or the session expired.
    #[error("invalid credentials")]
    InvalidCredentials,
}

/// An authenticated identity as reported by the session provider.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSession {
    /// Backend-assigned user id.
    pub user_id: String,
    /// Email the user signed in with.
    pub email: String,
    /// Free-form profile metadata.
    pub metadata: Map<String, Value>,
}

/// Authoritative table storage, keyed by record id.
///
/// Each call is independent; the store relies on per-id sequencing, not
/// on the backend, to resolve overlapping operations.
pub trait RemoteTable: Send + Sync {
    /// Fetch all rows of a table in the given order.
    fn select(
        &self,
        table: &str,
        order: &[OrderKey],
    ) -> impl Future<Output = Result<Vec<Value>, RemoteError>> + Send;

    /// Insert a row; the backend assigns the id and server columns and
    /// echoes the stored row.
    fn insert(
        &self,
        table: &str,
        row: Value,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Merge a partial row into the record with the given id and echo
    /// the updated row.
    fn update(
        &self,
        table: &str,
        id: &EntityId,
        patch: Map<String, Value>,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Delete the record with the given id. `Ok(false)` means the table
    /// held no such row.
    fn delete(
        &self,
        table: &str,
        id: &EntityId,
    ) -> impl Future<Output = Result<bool, RemoteError>> + Send;
}

/// Identity provider with session persistence.
pub trait SessionProvider: Send + Sync {
    /// The currently signed-in identity, if any.
    fn current_user(&self) -> Option<UserSession>;

    /// Register a new account and open a session for it.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserSession, RemoteError>> + Send;

    /// Open a session for an existing account.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserSession, RemoteError>> + Send;

    /// Close the current session, if any.
    fn sign_out(&self) -> impl Future<Output = ()> + Send;
}
