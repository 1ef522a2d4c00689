//! Memory subsystem for Tessera.
//!
//! Encodes embeddings into a storage-portable string, ranks remembered
//! turns by embedding distance, and renders the most relevant ones as a
//! transcript excerpt for the prompt.

pub mod encoding;
pub mod in_memory;
pub mod noop;
pub mod recall;
pub mod vector;

pub use encoding::{decode_vector, encode_vector};
pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
pub use recall::{RecallConfig, build_context, build_context_with_rng, recall};
pub use vector::{RankConfig, Ranked, distance, rank, rank_with_rng};
