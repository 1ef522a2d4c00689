//! The Tessera engine.
//!
//! Everything that turns registered snippets and a live transcript into
//! a prompt, and a prompt into a reply:
//!
//! 1. **Activate** forced entries and the entries they cascade into
//! 2. **Compose** them under a token budget, trimming and splicing lines
//! 3. **Generate** through the configured [`ModelProvider`]
//! 4. **Postprocess** the reply and append it to the transcript
//!
//! [`ModelProvider`]: tessera_core::provider::ModelProvider

pub mod chatbot;
pub mod context;
pub mod postprocess;

pub use chatbot::ChatBot;
pub use context::{
    ComposerConfig, ContextComposer, ContextEntry, ContextEntryBuilder, ContextPreprocessor,
    EntrySet, EntryTemplate, ScopedEntry,
};
pub use postprocess::NewlinePruner;
