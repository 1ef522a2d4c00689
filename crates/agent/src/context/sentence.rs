//! Sentence boundary detection.
//!
//! A boundary is a single whitespace character that directly follows
//! `.`, `?` or `!`. Two abbreviation shapes suppress the boundary:
//! dotted initialisms such as `e.g.` or `U.S.` (`\w.\w` followed by the
//! punctuation), and a capital plus a lowercase letter before the dot
//! such as `Mr.` or `Dr.`. The whitespace itself belongs to neither
//! neighbouring sentence.

use std::ops::Range;

/// Byte ranges of the sentences in `text`, in order.
///
/// Always returns at least one (possibly empty) range; consecutive
/// ranges are separated by exactly one whitespace character.
pub fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start = 0;

    for (k, &(pos, c)) in chars.iter().enumerate() {
        if c.is_whitespace() && is_boundary(&chars, k) {
            spans.push(start..pos);
            start = pos + c.len_utf8();
        }
    }
    spans.push(start..text.len());

    spans
}

fn is_boundary(chars: &[(usize, char)], k: usize) -> bool {
    if k == 0 || !matches!(chars[k - 1].1, '.' | '?' | '!') {
        return false;
    }

    if k >= 4 {
        let (a, dot, b) = (chars[k - 4].1, chars[k - 3].1, chars[k - 2].1);
        if is_word(a) && dot == '.' && is_word(b) {
            return false;
        }
    }

    if k >= 3 {
        let (upper, lower, dot) = (chars[k - 3].1, chars[k - 2].1, chars[k - 1].1);
        if upper.is_uppercase() && lower.is_lowercase() && dot == '.' {
            return false;
        }
    }

    true
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(text: &str) -> Vec<&str> {
        split_sentences(text)
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        assert_eq!(
            sentences("It rained. Did it? Yes!"),
            vec!["It rained.", "Did it?", "Yes!"]
        );
    }

    #[test]
    fn newline_is_a_separator_too() {
        assert_eq!(sentences("One.\nTwo."), vec!["One.", "Two."]);
    }

    #[test]
    fn title_abbreviations_do_not_split() {
        assert_eq!(
            sentences("Mr. Smith arrived. He sat."),
            vec!["Mr. Smith arrived.", "He sat."]
        );
    }

    #[test]
    fn dotted_initialisms_do_not_split() {
        assert_eq!(
            sentences("Use e.g. tea. The U.S. economy grew."),
            vec!["Use e.g. tea.", "The U.S. economy grew."]
        );
    }

    #[test]
    fn extra_whitespace_stays_with_next_sentence() {
        assert_eq!(sentences("A.  B."), vec!["A.", " B."]);
    }

    #[test]
    fn no_punctuation_is_one_sentence() {
        assert_eq!(sentences("just words\nand more"), vec!["just words\nand more"]);
    }

    #[test]
    fn empty_text_is_one_empty_sentence() {
        assert_eq!(split_sentences(""), vec![0..0]);
    }

    #[test]
    fn trailing_separator_leaves_empty_tail() {
        assert_eq!(sentences("Done.\n"), vec!["Done.", ""]);
    }
}
