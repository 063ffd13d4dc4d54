//! Domain model shared between the taskdeck store and its consumers.

pub mod contact;
pub mod entity;
pub mod mapper;
pub mod task;

pub use contact::{Contact, ContactDraft, ContactPatch};
pub use entity::{Direction, Entity, EntityId, OrderKey, ValidationError};
pub use mapper::MappingError;
pub use task::{Assignee, Priority, Status, Subtask, Task, TaskDraft, TaskKind, TaskPatch};
