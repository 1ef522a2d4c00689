//! `tessera compose`: Compose a context from an entry file and input text.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tessera_agent::{ContextEntry, ContextPreprocessor, EntrySet, EntryTemplate};
use tessera_config::AppConfig;
use tessera_core::context::BudgetMode;
use tessera_core::tokenizer::{Tokenizer, WordTokenizer};

pub struct ComposeArgs {
    pub entries: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub budget: Option<i64>,
    pub strict: bool,
    pub tokenizer: Option<PathBuf>,
    pub text: Vec<String>,
}

/// An entry file: a list of `[[entry]]` tables.
#[derive(Debug, Default, Deserialize)]
struct EntryFile {
    #[serde(default)]
    entry: Vec<EntryTemplate>,
}

pub fn run(args: ComposeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;
    if let Some(budget) = args.budget {
        config.context.token_budget = budget;
    }
    if args.strict {
        config.context.budget_mode = BudgetMode::Strict;
    }
    config.validate()?;

    let entries = match &args.entries {
        Some(path) => load_entries(path)?,
        None => EntrySet::new(),
    };
    let text = read_input(&args)?;
    let tokenizer = load_tokenizer(args.tokenizer.as_deref())?;

    let composed = compose(&config, tokenizer, entries, &text)?;
    println!("{composed}");
    Ok(())
}

/// Compose `text` with `entries` under `config`.
pub fn compose(
    config: &AppConfig,
    tokenizer: Arc<dyn Tokenizer>,
    entries: EntrySet,
    text: &str,
) -> anyhow::Result<String> {
    tracing::info!(
        entries = entries.len(),
        budget = config.context.token_budget,
        mode = ?config.context.budget_mode,
        "Composing context"
    );
    let mut preprocessor =
        ContextPreprocessor::from_config(tokenizer, &config.context).with_entries(entries);
    Ok(preprocessor.context(text)?)
}

pub fn load_entries(path: &Path) -> anyhow::Result<EntrySet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entry file {}", path.display()))?;
    parse_entries(&content).with_context(|| format!("Invalid entry file {}", path.display()))
}

pub fn parse_entries(content: &str) -> anyhow::Result<EntrySet> {
    let file: EntryFile = toml::from_str(content)?;
    Ok(file.entry.into_iter().map(ContextEntry::from).collect())
}

fn read_input(args: &ComposeArgs) -> anyhow::Result<String> {
    if let Some(path) = &args.input {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display()));
    }
    if !args.text.is_empty() {
        return Ok(args.text.join(" "));
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read input from stdin")?;
    Ok(buf.trim_end_matches('\n').to_string())
}

fn load_tokenizer(path: Option<&Path>) -> anyhow::Result<Arc<dyn Tokenizer>> {
    let tokenizer: Arc<dyn Tokenizer> = match path {
        None => Arc::new(WordTokenizer::new()),
        #[cfg(feature = "hf")]
        Some(path) => Arc::new(tessera_core::tokenizer::HfTokenizer::from_file(path)?),
        #[cfg(not(feature = "hf"))]
        Some(path) => anyhow::bail!(
            "Cannot load {}: tessera was built without the `hf` feature",
            path.display()
        ),
    };
    Ok(tokenizer)
}
