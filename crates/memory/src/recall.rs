//! Memory context: folds relevant past turns into prompt text.
//!
//! The most recent turns are already part of the live transcript, so
//! they are held out; the rest of the history is ranked against the
//! current turn and the best matches are rendered oldest first as
//! `"{author}: {text}\n"` lines.

use rand::Rng;
use tessera_config::MemoryConfig;
use tessera_core::error::{MemoryError, VectorError};
use tessera_core::memory::{MemoryRecord, MemoryStore};

use crate::vector::{RankConfig, rank_with_rng};

/// Knobs for [`build_context`].
#[derive(Debug, Clone)]
pub struct RecallConfig {
    /// Most recent records excluded from ranking. `None` ranks everything.
    pub short_term: Option<usize>,
    /// Number of records rendered.
    pub long_term: usize,
    pub cutoff_recent: usize,
    pub max_samples: usize,
    pub scale: f32,
    pub epsilon: f32,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for RecallConfig {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            short_term: Some(config.short_term),
            long_term: config.long_term,
            cutoff_recent: config.cutoff_recent,
            max_samples: config.max_samples,
            scale: config.distance_scale,
            epsilon: config.distance_epsilon,
        }
    }
}

impl RecallConfig {
    fn rank_config(&self) -> RankConfig {
        RankConfig {
            top_k: self.long_term,
            cutoff_recent: self.cutoff_recent,
            max_samples: self.max_samples,
            scale: self.scale,
            epsilon: self.epsilon,
        }
    }
}

/// Render the memories in `history` (oldest first) most relevant to `reference`.
pub fn build_context(
    reference: &MemoryRecord,
    history: &[MemoryRecord],
    config: &RecallConfig,
) -> Result<String, VectorError> {
    build_context_with_rng(reference, history, config, &mut rand::thread_rng())
}

pub fn build_context_with_rng<R>(
    reference: &MemoryRecord,
    history: &[MemoryRecord],
    config: &RecallConfig,
    rng: &mut R,
) -> Result<String, VectorError>
where
    R: Rng + ?Sized,
{
    let eligible = match config.short_term {
        Some(held_out) => &history[..history.len().saturating_sub(held_out)],
        None => history,
    };

    let mut selected = rank_with_rng(reference, eligible, &config.rank_config(), rng)?;
    selected.sort_by_key(|r| r.record.created_at);

    tracing::debug!(
        history = history.len(),
        eligible = eligible.len(),
        selected = selected.len(),
        "Built memory context"
    );

    Ok(selected
        .iter()
        .map(|r| {
            let text = r.record.text.strip_prefix(' ').unwrap_or(&r.record.text);
            format!("{}: {}\n", r.record.author, text)
        })
        .collect())
}

/// Fetch the whole history from `store` and build the memory context for `reference`.
///
/// The reference itself is left out of the history if the store holds it.
pub async fn recall(
    store: &dyn MemoryStore,
    reference: &MemoryRecord,
    config: &RecallConfig,
) -> Result<String, MemoryError> {
    let mut history = store.get(i64::MIN).await?;
    history.retain(|r| !is_same_record(r, reference));
    Ok(build_context(reference, &history, config)?)
}

fn is_same_record(a: &MemoryRecord, b: &MemoryRecord) -> bool {
    a.created_at == b.created_at && a.author_id == b.author_id
}
