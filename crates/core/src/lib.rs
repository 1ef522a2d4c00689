//! # Tessera Core
//!
//! Domain types, traits, and error definitions for the Tessera prompt
//! composer. This crate has **no engine logic**; it defines the
//! interfaces the context engine, the memory ranker, and the
//! conversational loop are written against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here: the [`Tokenizer`], the
//! [`MemoryStore`], the [`ModelProvider`], and the pre/postprocessing
//! hooks. Implementations live in their respective crates (or in the
//! embedding application), which keeps the engine free of I/O.

pub mod context;
pub mod error;
pub mod memory;
pub mod processor;
pub mod provider;
pub mod similarity;
pub mod tokenizer;

// Re-export key types at crate root for ergonomics
pub use context::{BudgetMode, InsertionType, TrimDirection, TrimType};
pub use error::{
    ComposeError, Error, MemoryError, ProviderError, Result, TokenizerError, VectorError,
};
pub use memory::{MemoryRecord, MemoryStore, NewMemory};
pub use processor::{Postprocessor, Preprocessor, Turn};
pub use provider::{GenArgs, GenerationRequest, ModelProvider, SampleArgs};
pub use tokenizer::{Tokenizer, WordTokenizer};

#[cfg(feature = "hf")]
pub use tokenizer::HfTokenizer;
