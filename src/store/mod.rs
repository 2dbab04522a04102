//! Task storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use crate::types::{InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate, UpdateAck};

/// Trait for task document stores.
///
/// Ownership is the `userEmail` field of each document. Access checks
/// happen before a handler reaches the store; writes additionally filter on
/// the owner so a record is only ever changed by the identity that owns it.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// All records whose owner equals `user_email`, in store-native order.
    async fn find_by_owner(&self, user_email: &str) -> Result<Vec<TaskRecord>, Self::Error>;

    /// Insert a document under a freshly generated identifier.
    async fn insert(&self, document: TaskDocument) -> Result<InsertAck, Self::Error>;

    /// Replace the fields present in `update` on the record `id` owned by
    /// `owner`.
    ///
    /// Never inserts: an unknown `id`, or a record owned by anyone else,
    /// reports zero matched.
    async fn update_fields(
        &self,
        id: &TaskId,
        owner: &str,
        update: &TaskUpdate,
    ) -> Result<UpdateAck, Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool;
}

pub use memory::InMemoryTaskStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresError, PostgresTaskStore};
