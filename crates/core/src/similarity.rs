//! Text similarity for duplicate detection.
//!
//! A char-level diff of the two texts; the ratio is
//! `2 * matches / (len(a) + len(b))`.

use similar::TextDiff;

/// Similarity of two strings in `[0.0, 1.0]`, measured over chars.
///
/// Two empty strings are identical (`1.0`).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}
