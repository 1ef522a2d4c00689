//! Memory trait for persisted conversational turns with embeddings.
//!
//! A [`MemoryRecord`] is one timestamped turn plus the encoded
//! embedding of its text. Records are immutable once created. The
//! [`MemoryStore`] trait is the narrow async CRUD interface the rest of
//! Tessera talks to; ranking never touches storage directly.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::similarity;

/// Unix second at which snowflake timestamps start counting.
pub const SNOWFLAKE_EPOCH: i64 = 1_621_123_998;

/// Snowflake ticks are 10µs.
const MICROS_PER_TICK: i64 = 10;

static LAST_SNOWFLAKE: AtomicI64 = AtomicI64::new(i64::MIN);

/// Convert a point in time into snowflake ticks.
pub fn to_snowflake(at: DateTime<Utc>) -> i64 {
    (at.timestamp_micros() - SNOWFLAKE_EPOCH * 1_000_000) / MICROS_PER_TICK
}

/// Convert snowflake ticks back into a point in time.
///
/// `None` when the ticks fall outside the representable range.
pub fn from_snowflake(ticks: i64) -> Option<DateTime<Utc>> {
    let micros = ticks
        .checked_mul(MICROS_PER_TICK)?
        .checked_add(SNOWFLAKE_EPOCH * 1_000_000)?;
    DateTime::from_timestamp_micros(micros)
}

/// Issue a creation timestamp for a new record.
///
/// Strictly increasing within the process, even when the clock stalls
/// or two records are created within the same tick.
pub fn snowflake() -> i64 {
    let candidate = to_snowflake(Utc::now());
    let mut last = LAST_SNOWFLAKE.load(Ordering::Relaxed);
    loop {
        let next = candidate.max(last.saturating_add(1));
        match LAST_SNOWFLAKE.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// A single remembered turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Snowflake creation timestamp
    pub created_at: i64,

    /// Identifier of whoever said it
    pub author_id: i64,

    /// Display name of the author
    pub author: String,

    /// The message text
    pub text: String,

    /// Name of the model that produced `encoding`
    pub encoding_model: String,

    /// Embedding vector in its portable text form
    pub encoding: String,
}

/// Fields supplied by the caller when adding a memory; the store
/// stamps the creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMemory {
    pub author_id: i64,
    pub author: String,
    pub text: String,
    pub encoding_model: String,
    pub encoding: String,
}

impl NewMemory {
    pub fn into_record(self, created_at: i64) -> MemoryRecord {
        MemoryRecord {
            created_at,
            author_id: self.author_id,
            author: self.author,
            text: self.text,
            encoding_model: self.encoding_model,
            encoding: self.encoding,
        }
    }
}

/// Returns true if `a` and `b` are the same text or more similar than `ratio`.
pub fn is_duplicate(a: &str, b: &str, ratio: f64) -> bool {
    a == b || similarity::ratio(a, b) > ratio
}

/// The core MemoryStore trait.
///
/// Implementations: in-memory (for testing), none (no-op).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The store name (e.g., "in_memory", "none").
    fn name(&self) -> &str;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize, MemoryError>;

    /// Records created strictly after `created_after`, oldest first.
    async fn get(&self, created_after: i64) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Store a fully formed record.
    async fn create(&self, record: MemoryRecord) -> Result<MemoryRecord, MemoryError>;

    /// Delete the record with this `(created_at, author_id)` key.
    async fn delete(&self, created_at: i64, author_id: i64) -> Result<bool, MemoryError>;

    /// Stamp a new record with a snowflake timestamp and store it.
    async fn add(&self, memory: NewMemory) -> Result<MemoryRecord, MemoryError> {
        self.create(memory.into_record(snowflake())).await
    }

    /// Every record, optionally dropping later near-duplicates of earlier ones.
    ///
    /// With `ratio = None` only exact text matches count as duplicates.
    async fn filter(
        &self,
        exclude_duplicates: bool,
        ratio: Option<f64>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.get(i64::MIN).await?;
        if !exclude_duplicates {
            return Ok(records);
        }

        let threshold = ratio.unwrap_or(f64::INFINITY);
        let mut kept: Vec<MemoryRecord> = Vec::with_capacity(records.len());
        for record in records {
            if !kept.iter().any(|k| is_duplicate(&k.text, &record.text, threshold)) {
                kept.push(record);
            }
        }
        Ok(kept)
    }

    /// Whether any stored record duplicates `text`.
    async fn check_duplicates(&self, text: &str, ratio: f64) -> Result<bool, MemoryError> {
        let records = self.get(i64::MIN).await?;
        Ok(records.iter().any(|r| is_duplicate(&r.text, text, ratio)))
    }
}
