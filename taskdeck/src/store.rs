//! Store orchestration: load, create, update, delete with optimistic
//! cache mutation and remote reconciliation.
//!
//! The store is the only component that calls the remote backend or
//! mutates the cache. It is constructed explicitly once per collection
//! at application start and passed by reference to consumers; there is
//! no ambient singleton.
//!
//! The update pipeline:
//! 1. take a per-id sequence number (stale-response guard)
//! 2. snapshot the pre-patch entity
//! 3. apply the patch to the cache synchronously (zero-latency UI)
//! 4. issue the remote update
//! 5. on success, reconcile the cache with the server echo; on failure,
//!    restore the snapshot
//!
//! A resolution whose sequence number is no longer the latest issued for
//! its id is discarded, making last-issued-wins the effective semantics
//! for overlapping operations on one entity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskdeck_model::{
    Contact, Entity, EntityId, MappingError, Status, Task, TaskPatch, ValidationError,
};

use crate::cache::{CacheEvent, ReactiveCache};
use crate::config::StoreConfig;
use crate::query::{self, Board};
use crate::remote::{RemoteError, RemoteTable, SessionProvider};

/// Errors surfaced to the view layer. Raw transport errors never leak
/// upward unconverted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A mutating operation was attempted without a signed-in identity.
    #[error("sign in required")]
    AuthRequired,

    /// Fetching the collection failed; the cache keeps its last-good state.
    #[error("load failed: {0}")]
    Load(#[source] RemoteError),

    /// The backend rejected a new entity; the cache is unchanged.
    #[error("create failed: {0}")]
    Create(#[source] RemoteError),

    /// The backend rejected an update; the optimistic patch was rolled back.
    #[error("update failed: {0}")]
    Update(#[source] RemoteError),

    /// The backend could not delete the entity; the cache is unchanged.
    #[error("delete failed: {0}")]
    Delete(#[source] RemoteError),

    /// A remote record could not be translated to the domain shape.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// A draft or patch failed field validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The targeted id is not in the cache; nothing was sent.
    #[error("no entity with id {0}")]
    NotFound(EntityId),
}

/// Orchestrates one entity collection against the remote backend.
pub struct Store<E: Entity, R: RemoteTable, S: SessionProvider> {
    remote: Arc<R>,
    session: Arc<S>,
    cache: ReactiveCache<E>,
    /// Latest issued operation sequence number per entity id.
    ops: Mutex<HashMap<EntityId, u64>>,
    config: StoreConfig,
}

/// Store over the `tasks` collection.
pub type TaskStore<R, S> = Store<Task, R, S>;
/// Store over the `contacts` collection.
pub type ContactStore<R, S> = Store<Contact, R, S>;

impl<E: Entity, R: RemoteTable, S: SessionProvider> Store<E, R, S> {
    /// Creates a store with an empty cache, returning the cache event
    /// receiver the view layer should consume.
    #[must_use]
    pub fn new(remote: Arc<R>, session: Arc<S>, config: StoreConfig) -> (Self, mpsc::Receiver<CacheEvent>) {
        let (cache, events) = ReactiveCache::new(config.event_buffer);
        let store = Self {
            remote,
            session,
            cache,
            ops: Mutex::new(HashMap::new()),
            config,
        };
        (store, events)
    }

    /// The cache this store owns. Read-only use; mutations route through
    /// store operations.
    pub fn cache(&self) -> &ReactiveCache<E> {
        &self.cache
    }

    /// Current snapshot of the collection in fetch order.
    #[must_use]
    pub fn entities(&self) -> Arc<[E]> {
        self.cache.all()
    }

    /// Fetches the full collection, maps it, and replaces the cache.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Load`] on transport failure and
    /// [`StoreError::Mapping`] on a malformed record. In both cases the
    /// cache keeps its last-good contents.
    pub async fn load(&self) -> Result<(), StoreError> {
        let rows = self
            .remote
            .select(E::TABLE, E::order())
            .await
            .map_err(StoreError::Load)?;
        let mut entities = Vec::with_capacity(rows.len());
        for row in &rows {
            entities.push(E::from_record(row)?);
        }
        tracing::debug!(table = E::TABLE, count = entities.len(), "collection loaded");
        // Sequence counters for ids the collection no longer holds are
        // dead weight; an in-flight op on such an id resolves as stale.
        self.ops
            .lock()
            .retain(|id, _| entities.iter().any(|e| e.id() == id));
        self.cache.set(entities);
        Ok(())
    }

    /// Validates and inserts a new entity, then reloads to absorb the
    /// server-assigned id, timestamp and position. There is no
    /// speculative local insert: the id is server-assigned, and a
    /// phantom id would churn through the cache on reload.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AuthRequired`] without issuing a remote
    /// call if no identity is signed in, [`StoreError::Validation`] on a
    /// bad draft, and [`StoreError::Create`] if the backend rejects the
    /// row; the cache is unchanged in every failure case.
    pub async fn create(&self, draft: &E::Draft) -> Result<(), StoreError> {
        if self.session.current_user().is_none() {
            return Err(StoreError::AuthRequired);
        }
        E::validate_draft(draft)?;
        let row = E::draft_to_record(draft);
        self.remote
            .insert(E::TABLE, row)
            .await
            .map_err(StoreError::Create)?;
        if self.config.load_on_create {
            self.load().await?;
        }
        Ok(())
    }

    /// Applies a patch optimistically, then reconciles with the backend.
    ///
    /// The cache reflects the patch before any network I/O; a subsequent
    /// synchronous read observes the new value. On remote success the
    /// server's echoed record overwrites the optimistic entry (it is
    /// authoritative; server-computed fields may differ from the patch).
    /// On remote failure the pre-patch snapshot is restored exactly.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AuthRequired`], [`StoreError::Validation`],
    /// [`StoreError::NotFound`] (id not cached, nothing sent), or
    /// [`StoreError::Update`] after rollback.
    pub async fn update(&self, id: &EntityId, patch: E::Patch) -> Result<(), StoreError> {
        if self.session.current_user().is_none() {
            return Err(StoreError::AuthRequired);
        }
        E::validate_patch(&patch)?;
        let Some(snapshot) = self.cache.get(id) else {
            tracing::debug!(%id, table = E::TABLE, "update targets an id the cache does not hold");
            return Err(StoreError::NotFound(id.clone()));
        };
        let seq = self.begin_op(id);

        // Optimistic, synchronous: the view sees the change immediately.
        if self.cache.update(id, &patch).is_err() {
            return Err(StoreError::NotFound(id.clone()));
        }

        let row = E::patch_to_record(&patch);
        match self.remote.update(E::TABLE, id, row).await {
            Ok(echo) => {
                if !self.is_latest(id, seq) {
                    tracing::debug!(%id, seq, "discarding stale update echo");
                    return Ok(());
                }
                match E::from_record(&echo) {
                    Ok(authoritative) => {
                        if let Err(err) = self.cache.reconcile(id, authoritative) {
                            tracing::debug!(%id, error = %err, "echo reconcile skipped");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            %id,
                            error = %err,
                            "server echo unmappable, keeping optimistic state"
                        );
                    }
                }
                Ok(())
            }
            Err(err) => {
                if self.is_latest(id, seq) {
                    tracing::warn!(
                        %id,
                        table = E::TABLE,
                        error = %err,
                        "remote update failed, rolling back optimistic patch"
                    );
                    if let Err(restore_err) = self.cache.restore(id, snapshot) {
                        tracing::debug!(%id, error = %restore_err, "rollback skipped");
                    }
                } else {
                    tracing::debug!(%id, seq, "stale update failure, newer op owns the entry");
                }
                Err(StoreError::Update(err))
            }
        }
    }

    /// Deletes an entity remotely, then reloads on success.
    ///
    /// There is no optimistic removal: undoing a disappearance is more
    /// disruptive than an update rollback. Returns `Ok(false)` when the
    /// backend held no such row; the cache is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AuthRequired`] or [`StoreError::Delete`];
    /// the cache is unchanged on failure.
    pub async fn delete(&self, id: &EntityId) -> Result<bool, StoreError> {
        if self.session.current_user().is_none() {
            return Err(StoreError::AuthRequired);
        }
        let deleted = self
            .remote
            .delete(E::TABLE, id)
            .await
            .map_err(StoreError::Delete)?;
        if deleted {
            self.load().await?;
        } else {
            tracing::debug!(%id, table = E::TABLE, "delete targeted a row the backend does not hold");
        }
        Ok(deleted)
    }

    fn begin_op(&self, id: &EntityId) -> u64 {
        let mut ops = self.ops.lock();
        let counter = ops.entry(id.clone()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn is_latest(&self, id: &EntityId, seq: u64) -> bool {
        self.ops.lock().get(id).copied() == Some(seq)
    }
}

impl<R: RemoteTable, S: SessionProvider> TaskStore<R, S> {
    /// Moves a task to another board column (drag-and-drop intent).
    /// Any column is reachable from any other.
    ///
    /// # Errors
    ///
    /// Same contract as [`update`](Store::update).
    pub async fn set_status(&self, id: &EntityId, status: Status) -> Result<(), StoreError> {
        self.update(id, TaskPatch::status_only(status)).await
    }

    /// Tasks matching the query, using the configured minimum query
    /// length (shorter queries return the full set).
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Task> {
        query::filter_by_text(&self.entities(), query, self.config.min_query_len)
    }

    /// The cached collection partitioned into the four board columns.
    #[must_use]
    pub fn board(&self) -> Board {
        query::group_by_status(&self.entities())
    }
}
