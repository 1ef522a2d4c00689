//! Budgeted composition of active entries into one context string.
//!
//! One pass walks the active entries in composition order with a
//! running token budget. Each entry reserves its tokens, is trimmed to
//! what is left, and has its lines spliced into the output at its
//! insertion position. The budget may end up negative; whether that is
//! an error depends on the [`BudgetMode`].

use std::ops::Deref;
use std::sync::Arc;

use tessera_config::ContextConfig;
use tessera_core::context::BudgetMode;
use tessera_core::error::ComposeError;
use tessera_core::tokenizer::Tokenizer;

use super::activation;
use super::entry::ContextEntry;

// ── Entry set ─────────────────────────────────────────────────────────────

/// The entries registered with a composer, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySet {
    entries: Vec<ContextEntry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry and return its index.
    pub fn add(&mut self, entry: ContextEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Remove the entry at `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Option<ContextEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&ContextEntry> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ContextEntry> {
        self.entries.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContextEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Register `entry` until the returned guard is dropped.
    pub fn push_scoped(&mut self, entry: ContextEntry) -> ScopedEntry<'_> {
        self.entries.push(entry);
        ScopedEntry { set: self }
    }
}

impl FromIterator<ContextEntry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = ContextEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<ContextEntry> for EntrySet {
    fn extend<I: IntoIterator<Item = ContextEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a ContextEntry;
    type IntoIter = std::slice::Iter<'a, ContextEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// An [`EntrySet`] with one extra entry registered at the end.
///
/// The entry is removed again when the guard goes out of scope, on every
/// exit path.
pub struct ScopedEntry<'a> {
    set: &'a mut EntrySet,
}

impl Deref for ScopedEntry<'_> {
    type Target = EntrySet;

    fn deref(&self) -> &EntrySet {
        self.set
    }
}

impl Drop for ScopedEntry<'_> {
    fn drop(&mut self) {
        self.set.entries.pop();
    }
}

// ── Composer ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ComposerConfig {
    /// Starting budget of each pass.
    pub budget: i64,
    /// Cascade depth cap.
    pub max_cascade_depth: usize,
    pub budget_mode: BudgetMode,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            budget: 1024,
            max_cascade_depth: 3,
            budget_mode: BudgetMode::Permissive,
        }
    }
}

impl From<&ContextConfig> for ComposerConfig {
    fn from(config: &ContextConfig) -> Self {
        Self {
            budget: config.token_budget,
            max_cascade_depth: config.max_cascade_depth,
            budget_mode: config.budget_mode,
        }
    }
}

/// Composes an [`EntrySet`] into a context string.
pub struct ContextComposer {
    tokenizer: Arc<dyn Tokenizer>,
    config: ComposerConfig,
}

impl ContextComposer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, config: ComposerConfig) -> Self {
        Self { tokenizer, config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Compose the active entries of `entries`.
    ///
    /// Deterministic: the same entry set always yields the same text.
    pub fn compose(&self, entries: &EntrySet) -> Result<String, ComposeError> {
        let tokenizer = self.tokenizer.as_ref();
        let active = activation::resolve(entries.as_slice(), self.config.max_cascade_depth);

        let mut budget = self.config.budget;
        let mut lines: Vec<String> = Vec::new();

        for idx in active {
            let entry = &entries.as_slice()[idx];

            let full = to_i64(tokenizer.count(entry.text())?);
            let reservation = if entry.reserved_tokens > 0 {
                to_i64(entry.reserved_tokens)
            } else if entry.insertion_position != 0 {
                full
            } else {
                0
            };
            let reserved = full.min(reservation);
            budget -= reserved;

            let text = entry.get_text(tokenizer, budget + reserved, entry.token_budget)?;
            let used = to_i64(tokenizer.count(&text)?);
            budget -= used - reserved;

            tracing::debug!(entry = idx, reserved, used, budget, "Composed entry");
            if budget < 0 {
                match self.config.budget_mode {
                    BudgetMode::Strict => {
                        tracing::warn!(entry = idx, overrun = -budget, "Budget overrun");
                        return Err(ComposeError::BudgetOverrun {
                            entry: idx,
                            overrun: -budget,
                        });
                    }
                    BudgetMode::Permissive => {
                        tracing::debug!(entry = idx, overrun = -budget, "Budget overrun tolerated");
                    }
                }
            }

            let at = splice_index(entry.insertion_position, lines.len());
            lines.splice(at..at, text.lines().map(str::to_owned));
        }

        Ok(lines.join("\n"))
    }

    /// Compose with `input` registered for this pass only.
    pub fn compose_with(
        &self,
        entries: &mut EntrySet,
        input: ContextEntry,
    ) -> Result<String, ComposeError> {
        let scoped = entries.push_scoped(input);
        self.compose(&scoped)
    }
}

/// Where lines inserted at `position` land in an output of `len` lines.
///
/// Negative positions count from the end (`-1` appends) and clamp to the
/// start; non-negative positions clamp to the end.
pub fn splice_index(position: i64, len: usize) -> usize {
    if position < 0 {
        let from_end = to_i64(len) + position + 1;
        usize::try_from(from_end).unwrap_or(0)
    } else {
        usize::try_from(position).map_or(len, |p| p.min(len))
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
