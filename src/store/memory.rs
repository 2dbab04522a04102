//! In-memory task store for testing and local development.

use std::convert::Infallible;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::types::{InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate, UpdateAck};
use super::TaskStore;

/// In-memory task store.
///
/// Records are kept in insertion order, which is the order `find_by_owner`
/// returns them in.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    records: RwLock<Vec<TaskRecord>>,
}

impl InMemoryTaskStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Fetch a record by ID.
    pub fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.records.read().iter().find(|r| r.id() == *id).cloned()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    type Error = Infallible;

    async fn find_by_owner(&self, user_email: &str) -> Result<Vec<TaskRecord>, Self::Error> {
        Ok(self.records
            .read()
            .iter()
            .filter(|r| r.owner() == Some(user_email))
            .cloned()
            .collect())
    }

    async fn insert(&self, document: TaskDocument) -> Result<InsertAck, Self::Error> {
        let id = TaskId::generate();
        self.records.write().push(TaskRecord::new(id, document));
        Ok(InsertAck::new(id))
    }

    async fn update_fields(
        &self,
        id: &TaskId,
        owner: &str,
        update: &TaskUpdate,
    ) -> Result<UpdateAck, Self::Error> {
        let mut records = self.records.write();
        let ack = match records
            .iter_mut()
            .find(|r| r.id() == *id && r.owner() == Some(owner))
        {
            Some(record) => UpdateAck::new(1, u64::from(record.apply(update))),
            None => UpdateAck::new(0, 0),
        };
        Ok(ack)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
