//! Context composition as a conversation preprocessor.

use std::sync::Arc;

use tessera_config::{ContextConfig, InputEntryConfig};
use tessera_core::error::Result;
use tessera_core::processor::{Preprocessor, Turn};
use tessera_core::tokenizer::Tokenizer;

use super::composer::{ComposerConfig, ContextComposer, EntrySet};
use super::entry::ContextEntry;

/// Rewrites the conversation into a composed context.
///
/// The conversation text becomes the input entry of a single pass over
/// the registered entries; the entry set is left as it was afterwards.
pub struct ContextPreprocessor {
    entries: EntrySet,
    composer: ContextComposer,
    input: InputEntryConfig,
}

impl ContextPreprocessor {
    pub fn new(composer: ContextComposer, input: InputEntryConfig) -> Self {
        Self {
            entries: EntrySet::new(),
            composer,
            input,
        }
    }

    pub fn from_config(tokenizer: Arc<dyn Tokenizer>, config: &ContextConfig) -> Self {
        Self::new(
            ContextComposer::new(tokenizer, ComposerConfig::from(config)),
            config.input_entry.clone(),
        )
    }

    pub fn with_entries(mut self, entries: EntrySet) -> Self {
        self.entries = entries;
        self
    }

    pub fn add_entry(&mut self, entry: ContextEntry) -> usize {
        self.entries.add(entry)
    }

    pub fn entries(&self) -> &EntrySet {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut EntrySet {
        &mut self.entries
    }

    /// Compose `context` with the registered entries.
    pub fn context(&mut self, context: &str) -> Result<String> {
        let input = ContextEntry::input(context, &self.input);
        Ok(self.composer.compose_with(&mut self.entries, input)?)
    }
}

impl Preprocessor for ContextPreprocessor {
    fn process(&mut self, context: &str, turn: &Turn<'_>) -> Result<String> {
        tracing::debug!(
            is_respond = turn.is_respond,
            name = turn.name,
            entries = self.entries.len(),
            "Composing context"
        );
        self.context(context)
    }
}
