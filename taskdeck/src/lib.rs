//! Taskdeck — reactive task-board and contact store.
//!
//! A local cache of remote table rows that is mutated eagerly for UI
//! responsiveness and reconciled against authoritative server responses,
//! with snapshot rollback on failure. The view layer subscribes to cache
//! events and routes every mutation through a [`store::Store`].

pub mod cache;
pub mod config;
pub mod query;
pub mod remote;
pub mod store;

pub use taskdeck_model as model;
