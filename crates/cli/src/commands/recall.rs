//! `tessera recall`: Render the remembered turns most relevant to a turn.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tessera_config::{AppConfig, MemoryConfig};
use tessera_core::memory::{MemoryRecord, MemoryStore};
use tessera_memory::{InMemoryStore, RecallConfig, build_context};

pub struct RecallArgs {
    pub history: PathBuf,
    pub reference: Option<i64>,
    pub short_term: Option<usize>,
    pub long_term: Option<usize>,
    pub dedupe: bool,
}

pub async fn run(args: RecallArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let store = InMemoryStore::new();
    for record in load_history(&args.history)? {
        store.create(record).await?;
    }
    tracing::info!(records = store.count().await?, "Loaded history");

    let rendered = render(&store, &config.memory, &args).await?;
    print!("{rendered}");
    Ok(())
}

pub fn load_history(path: &Path) -> anyhow::Result<Vec<MemoryRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid history file {}", path.display()))
}

/// Memory context for the reference turn, built from the turns before it.
pub async fn render(
    store: &dyn MemoryStore,
    memory: &MemoryConfig,
    args: &RecallArgs,
) -> anyhow::Result<String> {
    let records = if args.dedupe {
        store.filter(true, Some(memory.duplicate_ratio)).await?
    } else {
        store.get(i64::MIN).await?
    };

    let reference = match args.reference {
        Some(at) => store
            .get(at.saturating_sub(1))
            .await?
            .into_iter()
            .find(|r| r.created_at == at)
            .with_context(|| format!("No record created at {at}"))?,
        None => store
            .get(i64::MIN)
            .await?
            .pop()
            .context("History is empty")?,
    };

    let history: Vec<MemoryRecord> = records
        .into_iter()
        .filter(|r| r.created_at < reference.created_at)
        .collect();

    let mut config = RecallConfig::from(memory);
    if let Some(short_term) = args.short_term {
        config.short_term = Some(short_term);
    }
    if let Some(long_term) = args.long_term {
        config.long_term = long_term;
    }

    Ok(build_context(&reference, &history, &config)?)
}
