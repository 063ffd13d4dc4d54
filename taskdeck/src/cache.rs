//! Observable in-memory mirror of one remote collection.
//!
//! [`ReactiveCache`] holds the last known authoritative state of a
//! collection, applies mutations synchronously, and pushes a
//! [`CacheEvent`] to its subscriber channel on every change. Reads go
//! through [`all`](ReactiveCache::all), which hands out a lazily rebuilt
//! snapshot: two consecutive reads with no intervening mutation return
//! the same allocation.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use taskdeck_model::{Entity, EntityId};

/// Errors raised by cache mutations. Non-fatal: callers log and continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// No cached entity carries the given id.
    #[error("no cached entity with id {0}")]
    NotFound(EntityId),
}

/// Change notification pushed to the view layer on every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The whole collection was replaced (a load completed).
    Replaced,
    /// One entity changed in place.
    Updated(EntityId),
    /// One entity was removed.
    Removed(EntityId),
}

struct Inner<E> {
    /// Current collection in store-provided order.
    entities: Vec<E>,
    /// Cached read snapshot; cleared by every mutation.
    snapshot: Option<Arc<[E]>>,
}

/// Observable ordered collection of entities.
///
/// Owned exclusively by a store; the view layer reads snapshots and
/// consumes events but never mutates the cache directly.
pub struct ReactiveCache<E: Entity> {
    inner: RwLock<Inner<E>>,
    event_tx: mpsc::Sender<CacheEvent>,
}

impl<E: Entity> ReactiveCache<E> {
    /// Creates an empty cache and the event receiver the view layer
    /// should consume. Events are delivered synchronously at mutation
    /// time; if the subscriber falls more than `event_buffer` events
    /// behind, further events are dropped with a warning.
    #[must_use]
    pub fn new(event_buffer: usize) -> (Self, mpsc::Receiver<CacheEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        let cache = Self {
            inner: RwLock::new(Inner {
                entities: Vec::new(),
                snapshot: None,
            }),
            event_tx,
        };
        (cache, event_rx)
    }

    /// Replaces the whole collection, preserving the given order.
    pub fn set(&self, entities: Vec<E>) {
        {
            let mut inner = self.inner.write();
            inner.entities = entities;
            inner.snapshot = None;
        }
        self.emit(CacheEvent::Replaced);
    }

    /// Merges a patch into the entity with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if the id is absent; the
    /// collection is left untouched.
    pub fn update(&self, id: &EntityId, patch: &E::Patch) -> Result<(), CacheError> {
        {
            let mut inner = self.inner.write();
            let entity = inner
                .entities
                .iter_mut()
                .find(|e| e.id() == id)
                .ok_or_else(|| CacheError::NotFound(id.clone()))?;
            entity.apply_patch(patch);
            inner.snapshot = None;
        }
        self.emit(CacheEvent::Updated(id.clone()));
        Ok(())
    }

    /// Puts back a pre-patch snapshot of an entity (optimistic rollback).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if the id is no longer cached —
    /// a concurrent reload may have removed the row, in which case the
    /// reloaded state is already authoritative.
    pub fn restore(&self, id: &EntityId, entity: E) -> Result<(), CacheError> {
        self.replace(id, entity)
    }

    /// Overwrites an entry with the authoritative server echo.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if the id is no longer cached.
    pub fn reconcile(&self, id: &EntityId, entity: E) -> Result<(), CacheError> {
        self.replace(id, entity)
    }

    fn replace(&self, id: &EntityId, entity: E) -> Result<(), CacheError> {
        {
            let mut inner = self.inner.write();
            let slot = inner
                .entities
                .iter_mut()
                .find(|e| e.id() == id)
                .ok_or_else(|| CacheError::NotFound(id.clone()))?;
            *slot = entity;
            inner.snapshot = None;
        }
        self.emit(CacheEvent::Updated(id.clone()));
        Ok(())
    }

    /// Removes the entity with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] if the id is absent.
    pub fn remove(&self, id: &EntityId) -> Result<(), CacheError> {
        {
            let mut inner = self.inner.write();
            let index = inner
                .entities
                .iter()
                .position(|e| e.id() == id)
                .ok_or_else(|| CacheError::NotFound(id.clone()))?;
            inner.entities.remove(index);
            inner.snapshot = None;
        }
        self.emit(CacheEvent::Removed(id.clone()));
        Ok(())
    }

    /// Current read snapshot in collection order.
    ///
    /// Recomputed lazily and cached until the next mutation, so repeated
    /// reads without intervening writes return the same `Arc`.
    #[must_use]
    pub fn all(&self) -> Arc<[E]> {
        if let Some(snapshot) = self.inner.read().snapshot.clone() {
            return snapshot;
        }
        let mut inner = self.inner.write();
        // Re-check: another reader may have filled it between the locks.
        if let Some(snapshot) = inner.snapshot.clone() {
            return snapshot;
        }
        let snapshot: Arc<[E]> = inner.entities.iter().cloned().collect();
        inner.snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// A copy of one entity, if cached.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<E> {
        self.inner.read().entities.iter().find(|e| e.id() == id).cloned()
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entities.len()
    }

    /// Whether the cache holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entities.is_empty()
    }

    /// Synchronous, lossy event delivery (subscriber may lag).
    fn emit(&self, event: CacheEvent) {
        if let Err(err) = self.event_tx.try_send(event) {
            tracing::warn!(error = %err, "cache event dropped, subscriber lagging");
        }
    }
}
