//! Context composition engine.
//!
//! Turns a set of [`ContextEntry`] snippets into one prompt that fits a
//! token budget.
//!
//! | Stage | Module | What it does |
//! |-------|--------|--------------|
//! | Activation | [`activation`] | Forced roots plus keyword cascades, ordered by `insertion_order` |
//! | Trimming | [`trim`], [`sentence`] | Token, sentence, or line granularity from either end |
//! | Composition | [`composer`] | Reservation, trimming, and line splicing under a running budget |
//! | Preprocessing | [`preprocessor`] | Wraps caller input as a forced entry for one pass |

pub mod activation;
pub mod composer;
pub mod entry;
pub mod preprocessor;
pub mod sentence;
pub mod trim;

pub use activation::{cascade_lookup, key_lookup, resolve};
pub use composer::{ComposerConfig, ContextComposer, EntrySet, ScopedEntry, splice_index};
pub use entry::{ContextEntry, ContextEntryBuilder, EntryTemplate, target_length};
pub use preprocessor::ContextPreprocessor;
pub use sentence::split_sentences;
