//! Token-stream trimming at three granularities.
//!
//! Each strategy shrinks a token sequence towards a limit while keeping
//! one end intact: [`TrimDirection::Top`] sacrifices the start and keeps
//! the tail, [`TrimDirection::Bottom`] sacrifices the end and keeps the
//! head. Line and sentence trimming never cut a unit in half; when that
//! cannot reach the limit, [`trim`] falls back to raw tokens.

use tessera_core::context::{TrimDirection, TrimType};
use tessera_core::error::TokenizerError;
use tessera_core::tokenizer::Tokenizer;

use super::sentence::split_sentences;

/// Trim `tokens` to at most `max(target, 0)` tokens using `trim_type`.
///
/// A no-op when `direction` is [`TrimDirection::None`] or the sequence
/// already fits.
pub fn trim(
    tokenizer: &dyn Tokenizer,
    tokens: &[u32],
    trim_type: TrimType,
    direction: TrimDirection,
    target: i64,
) -> Result<Vec<u32>, TokenizerError> {
    let limit = usize::try_from(target).unwrap_or(0);
    if direction == TrimDirection::None || tokens.len() <= limit {
        return Ok(tokens.to_vec());
    }

    let trimmed = match trim_type {
        TrimType::Token => return Ok(trim_tokens(tokens, direction, limit)),
        TrimType::Newline => trim_lines(tokenizer, tokens, direction, limit)?,
        TrimType::Sentence => trim_sentences(tokenizer, tokens, direction, limit)?,
    };

    if trimmed.len() > limit || (trimmed.is_empty() && limit > 0) {
        tracing::debug!(
            ?trim_type,
            ?direction,
            limit,
            kept = trimmed.len(),
            "No whole unit fits; trimming raw tokens"
        );
        return Ok(trim_tokens(tokens, direction, limit));
    }

    Ok(trimmed)
}

/// Keep the last (`Top`) or first (`Bottom`) `limit` tokens.
pub fn trim_tokens(tokens: &[u32], direction: TrimDirection, limit: usize) -> Vec<u32> {
    if tokens.len() <= limit {
        return tokens.to_vec();
    }
    match direction {
        TrimDirection::Top => tokens[tokens.len() - limit..].to_vec(),
        TrimDirection::Bottom => tokens[..limit].to_vec(),
        TrimDirection::None => tokens.to_vec(),
    }
}

/// Keep whole lines from the retained end while they fit in `limit`.
///
/// Kept lines are re-joined with the newline on the trimmed side, so a
/// tail keeps `"\nline"` pieces and a head keeps `"line\n"` pieces.
pub fn trim_lines(
    tokenizer: &dyn Tokenizer,
    tokens: &[u32],
    direction: TrimDirection,
    limit: usize,
) -> Result<Vec<u32>, TokenizerError> {
    if direction == TrimDirection::None || tokens.len() <= limit {
        return Ok(tokens.to_vec());
    }

    let text = tokenizer.decode(tokens)?;
    let mut lines: Vec<&str> = text.split('\n').collect();
    if direction == TrimDirection::Top {
        lines.reverse();
    }

    let mut kept: Vec<Vec<u32>> = Vec::new();
    let mut used = 0;
    for line in lines {
        let piece = match direction {
            TrimDirection::Top => tokenizer.encode(&format!("\n{line}"))?,
            _ => tokenizer.encode(&format!("{line}\n"))?,
        };
        if used + piece.len() > limit {
            break;
        }
        used += piece.len();
        kept.push(piece);
    }

    if direction == TrimDirection::Top {
        kept.reverse();
    }
    Ok(kept.concat())
}

/// Keep whole sentences from the retained end while the kept text stays
/// under `limit` tokens.
///
/// The kept text is re-measured after each sentence. A head keeps the
/// `\n` directly after its last sentence; a tail starts at its first
/// sentence. Returns `tokens` unchanged if every sentence fits.
pub fn trim_sentences(
    tokenizer: &dyn Tokenizer,
    tokens: &[u32],
    direction: TrimDirection,
    limit: usize,
) -> Result<Vec<u32>, TokenizerError> {
    if direction == TrimDirection::None || tokens.len() <= limit {
        return Ok(tokens.to_vec());
    }

    let text = tokenizer.decode(tokens)?;
    let spans = split_sentences(&text);

    match direction {
        TrimDirection::Top => {
            let mut kept_from = text.len();
            for span in spans.iter().rev() {
                if tokenizer.count(&text[span.start..])? >= limit {
                    return tokenizer.encode(&text[kept_from..]);
                }
                kept_from = span.start;
            }
        }
        _ => {
            let mut kept_to = 0;
            for span in &spans {
                let mut end = span.end;
                if text[end..].starts_with('\n') {
                    end += 1;
                }
                if tokenizer.count(&text[..end])? >= limit {
                    return tokenizer.encode(&text[..kept_to]);
                }
                kept_to = end;
            }
        }
    }

    Ok(tokens.to_vec())
}
