//! Error types for the Tessera domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Tessera operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Tokenizer errors ---
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    // --- Composition errors ---
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),

    // --- Vector codec / distance errors ---
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("Failed to load tokenizer: {0}")]
    Load(String),

    #[error("Failed to encode text: {0}")]
    Encode(String),

    #[error("Failed to decode tokens: {0}")]
    Decode(String),

    #[error("Unknown token id: {0}")]
    UnknownToken(u32),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ComposeError {
    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("Entry #{entry} overran the token budget by {overrun} tokens")]
    BudgetOverrun { entry: usize, overrun: i64 },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("Malformed vector encoding: {0}")]
    Decode(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid memory encoding: {0}")]
    Encoding(#[from] VectorError),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}
