//! No-op store that disables memory entirely.

use async_trait::async_trait;
use tessera_core::error::MemoryError;
use tessera_core::memory::{MemoryRecord, MemoryStore};

/// A no-op memory store that stores nothing.
pub struct NoopStore;

#[async_trait]
impl MemoryStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(0)
    }

    async fn get(&self, _created_after: i64) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn create(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError> {
        Ok(record)
    }

    async fn delete(&self, _created_at: i64, _author_id: i64) -> Result<bool, MemoryError> {
        Ok(false)
    }
}
