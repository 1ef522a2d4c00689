//! Tokenizer trait, the adapter between text and token ids.
//!
//! Every budget in Tessera is measured in tokens produced by a
//! [`Tokenizer`]. The engine never interprets token ids; it only
//! encodes, decodes, and counts.
//!
//! Implementations: [`WordTokenizer`] (self-contained, lossless),
//! `HfTokenizer` (HuggingFace `tokenizer.json`, behind the `hf` feature).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::TokenizerError;

/// Converts text to token ids and back.
///
/// `decode(encode(text))` must reproduce `text` for ordinary input.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    /// Decode token ids back into text.
    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError>;

    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }
}

#[derive(Default)]
struct Vocabulary {
    ids: HashMap<String, u32>,
    pieces: Vec<String>,
}

/// A GPT-2 style pre-tokenizer with an interning vocabulary.
///
/// Text is cut into pieces: a lone `\n`, or a word together with the
/// whitespace in front of it (`" world."`), or trailing whitespace.
/// Each distinct piece gets a stable id the first time it is seen.
///
/// The vocabulary is never pruned, so memory grows with every distinct
/// piece the tokenizer has seen. Ids are only meaningful to the instance
/// that issued them. Long-running processes that count against a real
/// model should use `HfTokenizer` (feature `hf`).
#[derive(Default)]
pub struct WordTokenizer {
    vocab: RwLock<Vocabulary>,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pieces seen so far.
    pub fn vocab_size(&self) -> usize {
        self.vocab.read().map(|v| v.pieces.len()).unwrap_or(0)
    }

    fn pieces(text: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c == '\n' {
                out.push(&text[start..start + 1]);
                continue;
            }

            let mut end = start + c.len_utf8();
            let mut in_word = !c.is_whitespace();
            while let Some(&(i, next)) = chars.peek() {
                if next == '\n' || (next.is_whitespace() && in_word) {
                    break;
                }
                if !next.is_whitespace() {
                    in_word = true;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            out.push(&text[start..end]);
        }

        out
    }
}

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let pieces = Self::pieces(text);
        let mut tokens = Vec::with_capacity(pieces.len());
        let mut missing = Vec::new();

        {
            let vocab = self
                .vocab
                .read()
                .map_err(|_| TokenizerError::Encode("vocabulary lock poisoned".into()))?;
            for (idx, piece) in pieces.iter().enumerate() {
                match vocab.ids.get(*piece) {
                    Some(id) => tokens.push(*id),
                    None => {
                        tokens.push(0);
                        missing.push(idx);
                    }
                }
            }
        }

        if !missing.is_empty() {
            let mut vocab = self
                .vocab
                .write()
                .map_err(|_| TokenizerError::Encode("vocabulary lock poisoned".into()))?;
            for idx in missing {
                let piece = pieces[idx];
                let id = match vocab.ids.get(piece) {
                    Some(id) => *id,
                    None => {
                        let id = u32::try_from(vocab.pieces.len()).map_err(|_| {
                            TokenizerError::Encode("vocabulary exhausted".into())
                        })?;
                        vocab.pieces.push(piece.to_string());
                        vocab.ids.insert(piece.to_string(), id);
                        id
                    }
                };
                tokens[idx] = id;
            }
        }

        Ok(tokens)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
        let vocab = self
            .vocab
            .read()
            .map_err(|_| TokenizerError::Decode("vocabulary lock poisoned".into()))?;
        let mut text = String::new();
        for &id in tokens {
            let piece = vocab
                .pieces
                .get(id as usize)
                .ok_or(TokenizerError::UnknownToken(id))?;
            text.push_str(piece);
        }
        Ok(text)
    }
}

#[cfg(feature = "hf")]
pub use hf::HfTokenizer;

#[cfg(feature = "hf")]
mod hf {
    use std::path::Path;

    use super::Tokenizer;
    use crate::error::TokenizerError;

    /// Adapter over a HuggingFace `tokenizer.json`.
    pub struct HfTokenizer {
        inner: tokenizers::Tokenizer,
    }

    impl HfTokenizer {
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenizerError> {
            let path = path.as_ref();
            let inner = tokenizers::Tokenizer::from_file(path)
                .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
            tracing::info!("Loaded tokenizer from {}", path.display());
            Ok(Self { inner })
        }
    }

    impl Tokenizer for HfTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
            self.inner
                .encode(text, false)
                .map(|encoding| encoding.get_ids().to_vec())
                .map_err(|e| TokenizerError::Encode(e.to_string()))
        }

        fn decode(&self, tokens: &[u32]) -> Result<String, TokenizerError> {
            self.inner
                .decode(tokens, false)
                .map_err(|e| TokenizerError::Decode(e.to_string()))
        }
    }
}
