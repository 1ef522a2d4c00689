//! Embedding distance and relevance ranking.
//!
//! The distance is a smoothed L1-style dissimilarity:
//! `sum_i sqrt(|b_i - a_i| / scale + epsilon)`. It is symmetric but it
//! is neither cosine nor Euclidean distance, so scores are only
//! comparable against the same reference.

use rand::Rng;
use rand::seq::SliceRandom;
use tessera_config::MemoryConfig;
use tessera_core::error::VectorError;
use tessera_core::memory::MemoryRecord;

use crate::encoding::decode_vector;

/// Knobs for [`rank`].
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Maximum number of results.
    pub top_k: usize,
    /// Most recent candidates that are always considered.
    pub cutoff_recent: usize,
    /// Older candidates sampled when the pool is large.
    pub max_samples: usize,
    pub scale: f32,
    pub epsilon: f32,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_k: 256,
            cutoff_recent: 64,
            max_samples: 256,
            scale: 1000.0,
            epsilon: 1e-6,
        }
    }
}

impl From<&MemoryConfig> for RankConfig {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            top_k: config.long_term,
            cutoff_recent: config.cutoff_recent,
            max_samples: config.max_samples,
            scale: config.distance_scale,
            epsilon: config.distance_epsilon,
        }
    }
}

/// A candidate together with its distance to the reference.
#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a> {
    pub record: &'a MemoryRecord,
    pub distance: f32,
}

/// Distance between two embeddings of equal dimension.
pub fn distance(a: &[f32], b: &[f32], scale: f32, epsilon: f32) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a
        .iter()
        .zip(b)
        .map(|(x, y)| ((y - x).abs() / scale + epsilon).sqrt())
        .sum())
}

/// Rank `candidates` (oldest first) by distance to `reference`.
///
/// Uses the thread-local RNG for sampling; see [`rank_with_rng`].
pub fn rank<'a>(
    reference: &MemoryRecord,
    candidates: &'a [MemoryRecord],
    config: &RankConfig,
) -> Result<Vec<Ranked<'a>>, VectorError> {
    rank_with_rng(reference, candidates, config, &mut rand::thread_rng())
}

/// Rank `candidates` (oldest first) by distance to `reference`.
///
/// When the pool is larger than `cutoff_recent + max_samples`, only the
/// most recent `cutoff_recent` records plus `max_samples` records drawn
/// uniformly from the older remainder are scored. Results are sorted by
/// non-decreasing distance (ties keep history order) and truncated to
/// `top_k`. Any undecodable or mismatched embedding fails the ranking.
pub fn rank_with_rng<'a, R>(
    reference: &MemoryRecord,
    candidates: &'a [MemoryRecord],
    config: &RankConfig,
    rng: &mut R,
) -> Result<Vec<Ranked<'a>>, VectorError>
where
    R: Rng + ?Sized,
{
    let pool: Vec<usize> = if candidates.len() > config.cutoff_recent + config.max_samples {
        let split = candidates.len() - config.cutoff_recent;
        let older: Vec<usize> = (0..split).collect();
        let mut pool: Vec<usize> = older
            .choose_multiple(rng, config.max_samples)
            .copied()
            .collect();
        pool.extend(split..candidates.len());
        tracing::debug!(
            total = candidates.len(),
            sampled = config.max_samples,
            recent = config.cutoff_recent,
            "Sampled memory pool"
        );
        pool
    } else {
        (0..candidates.len()).collect()
    };

    let target = decode_vector(&reference.encoding)?;
    let mut scored: Vec<(f32, usize)> = Vec::with_capacity(pool.len());
    for idx in pool {
        let embedding = decode_vector(&candidates[idx].encoding)?;
        scored.push((distance(&target, &embedding, config.scale, config.epsilon)?, idx));
    }

    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    scored.truncate(config.top_k);

    Ok(scored
        .into_iter()
        .map(|(distance, idx)| Ranked {
            record: &candidates[idx],
            distance,
        })
        .collect())
}
