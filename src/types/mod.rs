//! Core types for the task service.

pub mod identity;
pub mod task;

pub use identity::{ClaimedIdentity, Identity};
pub use task::{
    InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate, UpdateAck,
    ID_FIELD, OWNER_FIELD,
};
