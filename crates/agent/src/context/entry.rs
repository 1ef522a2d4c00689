//! Context entries: the snippets a context is composed from.

use serde::{Deserialize, Serialize};
use tessera_config::InputEntryConfig;
use tessera_core::context::{InsertionType, TrimDirection, TrimType};
use tessera_core::error::TokenizerError;
use tessera_core::tokenizer::Tokenizer;

use super::trim;

/// A decorated snippet with activation, ordering, and budget metadata.
///
/// The text (prefix and suffix included) and the keys are fixed at
/// construction; everything else can be adjusted between passes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    text: String,
    keys: Vec<String>,
    lowered_text: String,
    lowered_keys: Vec<String>,
    /// Ceiling this entry may consume when it has room to spare.
    pub token_budget: usize,
    /// Tokens set aside before trimming; `0` reserves the full length
    /// for entries not inserted at position `0`.
    pub reserved_tokens: usize,
    /// Larger values are composed first.
    pub insertion_order: i64,
    /// Splice index into the output lines; negative counts from the end.
    pub insertion_position: i64,
    pub trim_direction: TrimDirection,
    pub trim_type: TrimType,
    pub insertion_type: InsertionType,
    pub forced_activation: bool,
    pub cascading_activation: bool,
}

impl ContextEntry {
    pub fn builder(text: impl Into<String>) -> ContextEntryBuilder {
        ContextEntryBuilder::new(text)
    }

    /// The synthetic entry wrapping caller input for one composition.
    pub fn input(text: &str, config: &InputEntryConfig) -> Self {
        Self::builder(text)
            .prefix(config.prefix.clone())
            .suffix(config.suffix.clone())
            .reserved_tokens(config.reserved_tokens)
            .token_budget(config.token_budget)
            .insertion_order(config.insertion_order)
            .insertion_position(config.insertion_position)
            .trim_direction(config.trim_direction)
            .trim_type(config.trim_type)
            .insertion_type(InsertionType::Newline)
            .forced(true)
            .cascading(true)
            .build()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Whether any non-empty key of `other` occurs in this entry's text,
    /// ignoring case.
    pub fn mentions(&self, other: &ContextEntry) -> bool {
        other
            .lowered_keys
            .iter()
            .filter(|key| !key.is_empty())
            .any(|key| self.lowered_text.contains(key.as_str()))
    }

    /// Trim the entry for a pass with `max_length` tokens left.
    ///
    /// The entry keeps its full text while the remaining budget covers
    /// it, is capped at `token_budget` when there is room to spare, and
    /// otherwise shrinks to exactly `max_length`.
    pub fn trim(
        &self,
        tokenizer: &dyn Tokenizer,
        max_length: i64,
        token_budget: usize,
    ) -> Result<Vec<u32>, TokenizerError> {
        let tokens = tokenizer.encode(&self.text)?;
        let target = target_length(tokens.len(), max_length, token_budget);
        trim::trim(
            tokenizer,
            &tokens,
            self.trim_type,
            self.trim_direction,
            target,
        )
    }

    /// [`trim`](Self::trim), decoded back to text.
    pub fn get_text(
        &self,
        tokenizer: &dyn Tokenizer,
        max_length: i64,
        token_budget: usize,
    ) -> Result<String, TokenizerError> {
        tokenizer.decode(&self.trim(tokenizer, max_length, token_budget)?)
    }
}

/// Trim target for an entry of `num_tokens` given `max_length` remaining.
pub fn target_length(num_tokens: usize, max_length: i64, token_budget: usize) -> i64 {
    let num_tokens = i64::try_from(num_tokens).unwrap_or(i64::MAX);
    let token_budget = i64::try_from(token_budget).unwrap_or(i64::MAX);
    let projected = max_length.saturating_sub(num_tokens);

    if projected > token_budget {
        token_budget
    } else if projected >= 0 {
        num_tokens
    } else {
        max_length
    }
}

/// Builder for [`ContextEntry`].
#[derive(Debug, Clone)]
pub struct ContextEntryBuilder {
    text: String,
    keys: Vec<String>,
    prefix: String,
    suffix: String,
    token_budget: usize,
    reserved_tokens: usize,
    insertion_order: i64,
    insertion_position: i64,
    trim_direction: TrimDirection,
    trim_type: TrimType,
    insertion_type: InsertionType,
    forced_activation: bool,
    cascading_activation: bool,
}

impl ContextEntryBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keys: Vec::new(),
            prefix: String::new(),
            suffix: "\n".into(),
            token_budget: 2048,
            reserved_tokens: 0,
            insertion_order: 100,
            insertion_position: -1,
            trim_direction: TrimDirection::Bottom,
            trim_type: TrimType::Sentence,
            insertion_type: InsertionType::Sentence,
            forced_activation: false,
            cascading_activation: false,
        }
    }

    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn token_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn reserved_tokens(mut self, reserved_tokens: usize) -> Self {
        self.reserved_tokens = reserved_tokens;
        self
    }

    pub fn insertion_order(mut self, insertion_order: i64) -> Self {
        self.insertion_order = insertion_order;
        self
    }

    pub fn insertion_position(mut self, insertion_position: i64) -> Self {
        self.insertion_position = insertion_position;
        self
    }

    pub fn trim_direction(mut self, trim_direction: TrimDirection) -> Self {
        self.trim_direction = trim_direction;
        self
    }

    pub fn trim_type(mut self, trim_type: TrimType) -> Self {
        self.trim_type = trim_type;
        self
    }

    pub fn insertion_type(mut self, insertion_type: InsertionType) -> Self {
        self.insertion_type = insertion_type;
        self
    }

    pub fn forced(mut self, forced: bool) -> Self {
        self.forced_activation = forced;
        self
    }

    pub fn cascading(mut self, cascading: bool) -> Self {
        self.cascading_activation = cascading;
        self
    }

    pub fn build(self) -> ContextEntry {
        let text = format!("{}{}{}", self.prefix, self.text, self.suffix);
        let lowered_keys = self.keys.iter().map(|k| k.to_lowercase()).collect();
        ContextEntry {
            lowered_text: text.to_lowercase(),
            text,
            lowered_keys,
            keys: self.keys,
            token_budget: self.token_budget,
            reserved_tokens: self.reserved_tokens,
            insertion_order: self.insertion_order,
            insertion_position: self.insertion_position,
            trim_direction: self.trim_direction,
            trim_type: self.trim_type,
            insertion_type: self.insertion_type,
            forced_activation: self.forced_activation,
            cascading_activation: self.cascading_activation,
        }
    }
}

/// Serialized form of an entry, as written in entry files.
///
/// ```toml
/// [[entry]]
/// text = "Patchouli is a librarian."
/// keys = ["patchouli", "library"]
/// insertion_order = 200
/// forced_activation = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryTemplate {
    pub text: String,
    pub keys: Vec<String>,
    pub prefix: String,
    pub suffix: String,
    pub token_budget: usize,
    pub reserved_tokens: usize,
    pub insertion_order: i64,
    pub insertion_position: i64,
    pub trim_direction: TrimDirection,
    pub trim_type: TrimType,
    pub insertion_type: InsertionType,
    pub forced_activation: bool,
    pub cascading_activation: bool,
}

impl Default for EntryTemplate {
    fn default() -> Self {
        Self {
            text: String::new(),
            keys: Vec::new(),
            prefix: String::new(),
            suffix: "\n".into(),
            token_budget: 2048,
            reserved_tokens: 0,
            insertion_order: 100,
            insertion_position: -1,
            trim_direction: TrimDirection::Bottom,
            trim_type: TrimType::Sentence,
            insertion_type: InsertionType::Sentence,
            forced_activation: false,
            cascading_activation: false,
        }
    }
}

impl From<EntryTemplate> for ContextEntry {
    fn from(t: EntryTemplate) -> Self {
        ContextEntry::builder(t.text)
            .keys(t.keys)
            .prefix(t.prefix)
            .suffix(t.suffix)
            .token_budget(t.token_budget)
            .reserved_tokens(t.reserved_tokens)
            .insertion_order(t.insertion_order)
            .insertion_position(t.insertion_position)
            .trim_direction(t.trim_direction)
            .trim_type(t.trim_type)
            .insertion_type(t.insertion_type)
            .forced(t.forced_activation)
            .cascading(t.cascading_activation)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::tokenizer::WordTokenizer;

    #[test]
    fn builder_defaults() {
        let entry = ContextEntry::builder("hello").build();
        assert_eq!(entry.text(), "hello\n");
        assert!(entry.keys().is_empty());
        assert_eq!(entry.token_budget, 2048);
        assert_eq!(entry.reserved_tokens, 0);
        assert_eq!(entry.insertion_order, 100);
        assert_eq!(entry.insertion_position, -1);
        assert_eq!(entry.trim_direction, TrimDirection::Bottom);
        assert_eq!(entry.trim_type, TrimType::Sentence);
        assert!(!entry.forced_activation);
        assert!(!entry.cascading_activation);
    }

    #[test]
    fn prefix_and_suffix_wrap_text() {
        let entry = ContextEntry::builder("body")
            .prefix("[ ")
            .suffix(" ]")
            .build();
        assert_eq!(entry.text(), "[ body ]");
    }

    #[test]
    fn mentions_is_case_insensitive_and_skips_empty_keys() {
        let a = ContextEntry::builder("We met PATCHOULI today").build();
        let b = ContextEntry::builder("x").keys(["patchouli"]).build();
        let empty = ContextEntry::builder("y").keys([""]).build();
        assert!(a.mentions(&b));
        assert!(!b.mentions(&a));
        assert!(!a.mentions(&empty));
    }

    #[test]
    fn target_length_cases() {
        // Plenty of room: capped by the entry budget.
        assert_eq!(target_length(10, 1000, 50), 50);
        // Fits, but not with budget to spare: keep everything.
        assert_eq!(target_length(10, 40, 50), 10);
        assert_eq!(target_length(10, 10, 50), 10);
        // Does not fit: shrink to what is left.
        assert_eq!(target_length(10, 6, 50), 6);
        assert_eq!(target_length(10, -3, 50), -3);
    }

    #[test]
    fn get_text_keeps_text_that_fits() {
        let tok = WordTokenizer::new();
        let entry = ContextEntry::builder("Hello world").build();
        assert_eq!(entry.get_text(&tok, 1024, 2048).unwrap(), "Hello world\n");
    }

    #[test]
    fn get_text_trims_to_remaining_budget() {
        let tok = WordTokenizer::new();
        let entry = ContextEntry::builder("One two. Three four. Five six.")
            .suffix("")
            .build();
        assert_eq!(entry.get_text(&tok, 5, 2048).unwrap(), "One two. Three four.");
    }

    #[test]
    fn get_text_honours_entry_ceiling() {
        let tok = WordTokenizer::new();
        let entry = ContextEntry::builder("a b c d e f")
            .suffix("")
            .trim_type(TrimType::Token)
            .build();
        assert_eq!(entry.get_text(&tok, 1000, 2).unwrap(), "a b");
    }

    #[test]
    fn input_entry_follows_config() {
        let config = InputEntryConfig::default();
        let entry = ContextEntry::input("hi there", &config);
        assert_eq!(entry.text(), "hi there\n");
        assert!(entry.forced_activation);
        assert!(entry.cascading_activation);
        assert_eq!(entry.reserved_tokens, 512);
        assert_eq!(entry.insertion_order, 0);
        assert_eq!(entry.insertion_position, -1);
        assert_eq!(entry.trim_direction, TrimDirection::Top);
    }

    #[test]
    fn template_parses_from_toml_with_defaults() {
        #[derive(Deserialize)]
        struct File {
            entry: Vec<EntryTemplate>,
        }

        let file: File = toml::from_str(
            r#"
            [[entry]]
            text = "Patchouli is a librarian."
            keys = ["patchouli"]
            forced_activation = true
            trim_type = "newline"

            [[entry]]
            text = "The library is vast."
            insertion_position = 0
            "#,
        )
        .unwrap();

        let entries: Vec<ContextEntry> = file.entry.into_iter().map(Into::into).collect();
        assert_eq!(entries[0].text(), "Patchouli is a librarian.\n");
        assert_eq!(entries[0].keys(), ["patchouli".to_string()]);
        assert!(entries[0].forced_activation);
        assert_eq!(entries[0].trim_type, TrimType::Newline);
        assert_eq!(entries[1].insertion_position, 0);
        assert_eq!(entries[1].insertion_order, 100);
    }
}
