//! Tessera CLI, the main entry point.
//!
//! Commands:
//! - `compose` Compose a context from an entry file and input text
//! - `recall`  Render the memories most relevant to a turn
//! - `config`  Show, locate, or validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tessera",
    about = "Tessera: budgeted prompt composition",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a context from entries and input text
    Compose {
        /// TOML file of [[entry]] tables
        #[arg(short, long)]
        entries: Option<PathBuf>,

        /// Read the input text from a file instead of the arguments or stdin
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Override the token budget
        #[arg(short, long)]
        budget: Option<i64>,

        /// Fail instead of overrunning the budget
        #[arg(long)]
        strict: bool,

        /// HuggingFace tokenizer.json to count tokens with
        #[arg(long)]
        tokenizer: Option<PathBuf>,

        /// Input text; read from stdin when absent
        text: Vec<String>,
    },

    /// Render the remembered turns most relevant to a reference turn
    Recall {
        /// JSON array of memory records
        history: PathBuf,

        /// `created_at` of the reference record (defaults to the latest)
        #[arg(short, long)]
        reference: Option<i64>,

        /// Override how many recent records are held out
        #[arg(long)]
        short_term: Option<usize>,

        /// Override how many records are rendered
        #[arg(long)]
        long_term: Option<usize>,

        /// Drop near-duplicate records before ranking
        #[arg(long)]
        dedupe: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Print the built-in defaults instead
        #[arg(long)]
        defaults: bool,
    },
    /// Print the configuration file path
    Path,
    /// Validate the configuration file
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compose {
            entries,
            input,
            budget,
            strict,
            tokenizer,
            text,
        } => {
            let args = commands::compose::ComposeArgs {
                entries,
                input,
                budget,
                strict,
                tokenizer,
                text,
            };
            commands::compose::run(args)?
        }
        Commands::Recall {
            history,
            reference,
            short_term,
            long_term,
            dedupe,
        } => {
            let args = commands::recall::RecallArgs {
                history,
                reference,
                short_term,
                long_term,
                dedupe,
            };
            commands::recall::run(args).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { defaults } => commands::config_cmd::show(defaults)?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Validate => commands::config_cmd::validate()?,
        },
    }

    Ok(())
}
