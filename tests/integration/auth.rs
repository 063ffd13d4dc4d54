//! Integration tests for the session gate: every mutating store
//! operation requires a signed-in identity, and the session provider
//! round-trips sign-up / sign-in / sign-out.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;

use taskdeck::config::StoreConfig;
use taskdeck::remote::memory::MemoryBackend;
use taskdeck::remote::{RemoteError, SessionProvider};
use taskdeck::store::{Store, StoreError, TaskStore};
use taskdeck_model::{EntityId, Status, TaskDraft, TaskPatch};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn make_store(backend: &Arc<MemoryBackend>) -> TaskStore<MemoryBackend, MemoryBackend> {
    Store::new(
        Arc::clone(backend),
        Arc::clone(backend),
        StoreConfig::default(),
    )
    .0
}

// ---------------------------------------------------------------------------
// Session provider
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_up_opens_a_session() {
    let backend = MemoryBackend::new();
    assert!(backend.current_user().is_none());

    let session = backend.sign_up("ada@example.com", "pw").await.unwrap();
    assert_eq!(session.email, "ada@example.com");
    assert_eq!(
        backend.current_user().map(|s| s.user_id),
        Some(session.user_id)
    );
}

#[tokio::test]
async fn sign_up_rejects_a_taken_email() {
    let backend = MemoryBackend::new();
    backend.sign_up("ada@example.com", "pw").await.unwrap();

    let err = backend.sign_up("ada@example.com", "other").await.unwrap_err();
    assert!(matches!(err, RemoteError::Rejected(_)));
}

#[tokio::test]
async fn sign_in_checks_the_password() {
    let backend = MemoryBackend::new();
    backend.sign_up("ada@example.com", "pw").await.unwrap();
    backend.sign_out().await;

    let err = backend.sign_in("ada@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, RemoteError::InvalidCredentials));
    assert!(backend.current_user().is_none());

    backend.sign_in("ada@example.com", "pw").await.unwrap();
    assert!(backend.current_user().is_some());
}

#[tokio::test]
async fn sign_out_clears_the_session() {
    let backend = MemoryBackend::new();
    backend.sign_up("ada@example.com", "pw").await.unwrap();

    backend.sign_out().await;
    assert!(backend.current_user().is_none());
}

// ---------------------------------------------------------------------------
// Store gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_without_identity_sends_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let store = make_store(&backend);

    let err = store.create(&TaskDraft::titled("No session")).await.unwrap_err();
    assert!(matches!(err, StoreError::AuthRequired));
    assert_eq!(backend.row_count("tasks"), 0);
}

#[tokio::test]
async fn update_and_delete_require_identity() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed("tasks", json!({"id": "1", "title": "Card", "status": "todo"}))
        .unwrap();
    // Reads are not gated
    let store = make_store(&backend);
    store.load().await.unwrap();
    assert_eq!(store.entities().len(), 1);

    let id = EntityId::new("1");
    let update = store.update(&id, TaskPatch::status_only(Status::Done)).await;
    assert!(matches!(update, Err(StoreError::AuthRequired)));
    assert_eq!(store.entities()[0].status, Status::Todo);

    let delete = store.delete(&id).await;
    assert!(matches!(delete, Err(StoreError::AuthRequired)));
    assert_eq!(backend.row_count("tasks"), 1);
}

#[tokio::test]
async fn operations_work_after_signing_back_in() {
    let backend = Arc::new(MemoryBackend::new());
    backend.sign_up("ada@example.com", "pw").await.unwrap();
    let store = make_store(&backend);

    store.create(&TaskDraft::titled("Mine")).await.unwrap();
    backend.sign_out().await;
    assert!(matches!(
        store.create(&TaskDraft::titled("Blocked")).await,
        Err(StoreError::AuthRequired)
    ));

    backend.sign_in("ada@example.com", "pw").await.unwrap();
    store.create(&TaskDraft::titled("Back again")).await.unwrap();
    assert_eq!(backend.row_count("tasks"), 2);
}
