//! In-memory store, useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tessera_core::error::MemoryError;
use tessera_core::memory::{MemoryRecord, MemoryStore};
use tokio::sync::RwLock;

/// An in-memory store that keeps records in a Vec ordered by creation time.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.read().await.len())
    }

    async fn get(&self, created_after: i64) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;
        let start = records.partition_point(|r| r.created_at <= created_after);
        Ok(records[start..].to_vec())
    }

    async fn create(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.created_at == record.created_at && r.author_id == record.author_id)
        {
            return Err(MemoryError::Storage(format!(
                "record ({}, {}) already exists",
                record.created_at, record.author_id
            )));
        }
        let at = records.partition_point(|r| r.created_at <= record.created_at);
        records.insert(at, record.clone());
        Ok(record)
    }

    async fn delete(&self, created_at: i64, author_id: i64) -> Result<bool, MemoryError> {
        let mut records = self.records.write().await;
        let len_before = records.len();
        records.retain(|r| !(r.created_at == created_at && r.author_id == author_id));
        Ok(records.len() < len_before)
    }
}
