//! End-to-end tests for the Tessera engine.
//!
//! These exercise the full turn: lore entries and the transcript are
//! composed into a prompt, the provider is consulted, and the reply is
//! cleaned up and recorded.

use std::sync::{Arc, Mutex};

use tessera_agent::{
    ChatBot, ComposerConfig, ContextComposer, ContextEntry, ContextPreprocessor, EntrySet,
    EntryTemplate, NewlinePruner,
};
use tessera_config::{AppConfig, ContextConfig};
use tessera_core::context::{BudgetMode, TrimDirection, TrimType};
use tessera_core::error::{ComposeError, Error, ProviderError};
use tessera_core::provider::{GenerationRequest, ModelProvider};
use tessera_core::tokenizer::{Tokenizer, WordTokenizer};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A provider that returns scripted outputs in sequence and records prompts.
struct ScriptedProvider {
    outputs: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(outputs: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_request(&self) -> GenerationRequest {
        GenerationRequest {
            model: "scripted-1".into(),
            ..Default::default()
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let output = self.outputs.get(prompts.len()).cloned().ok_or_else(|| {
            ProviderError::GenerationFailed(format!("script exhausted at call {}", prompts.len()))
        })?;
        prompts.push(request.prompt);
        Ok(output)
    }
}

fn tokenizer() -> Arc<dyn Tokenizer> {
    Arc::new(WordTokenizer::new())
}

fn lore() -> EntrySet {
    let templates: Vec<EntryTemplate> = vec![
        EntryTemplate {
            text: "[ Patchouli: librarian of the Voile library ]".into(),
            keys: vec!["patchouli".into()],
            insertion_order: 200,
            ..Default::default()
        },
        EntryTemplate {
            text: "[ Voile: a library inside the mansion ]".into(),
            keys: vec!["voile".into()],
            insertion_order: 150,
            ..Default::default()
        },
        EntryTemplate {
            text: "[ Style: replies are short ]".into(),
            forced_activation: true,
            insertion_order: 300,
            insertion_position: 0,
            ..Default::default()
        },
    ];
    templates.into_iter().map(ContextEntry::from).collect()
}

// ── Composition ──────────────────────────────────────────────────────────

#[test]
fn hello_world_composes_exactly() {
    let composer = ContextComposer::new(tokenizer(), ComposerConfig::default());
    let entries: EntrySet = [ContextEntry::builder("Hello world").forced(true).build()]
        .into_iter()
        .collect();
    assert_eq!(composer.compose(&entries).unwrap(), "Hello world");
}

#[test]
fn three_appended_entries_keep_their_order() {
    let composer = ContextComposer::new(tokenizer(), ComposerConfig::default());
    let entries: EntrySet = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|text| ContextEntry::builder(text).forced(true).build())
        .collect();
    assert_eq!(composer.compose(&entries).unwrap(), "alpha\nbeta\ngamma");
}

#[test]
fn cascades_pull_lore_in_through_mentions() {
    let composer = ContextComposer::new(tokenizer(), ComposerConfig::default());
    let mut entries = lore();
    let input = ContextEntry::input("haru: is Patchouli in?", &ContextConfig::default().input_entry);

    let out = composer.compose_with(&mut entries, input).unwrap();
    assert_eq!(
        out,
        "[ Style: replies are short ]\n\
         [ Patchouli: librarian of the Voile library ]\n\
         [ Voile: a library inside the mansion ]\n\
         haru: is Patchouli in?"
    );
    assert_eq!(entries.len(), 3);
}

#[test]
fn zero_depth_stops_after_direct_mentions() {
    let composer = ContextComposer::new(
        tokenizer(),
        ComposerConfig {
            max_cascade_depth: 0,
            ..ComposerConfig::default()
        },
    );
    let mut entries = lore();
    let input = ContextEntry::input("haru: is Patchouli in?", &ContextConfig::default().input_entry);

    let out = composer.compose_with(&mut entries, input).unwrap();
    assert!(out.contains("Patchouli: librarian"));
    assert!(!out.contains("Voile: a library"));
}

#[test]
fn zero_depth_config_is_accepted_end_to_end() {
    let mut app = AppConfig::default();
    app.context.max_cascade_depth = 0;
    app.validate().unwrap();

    let mut pre = ContextPreprocessor::from_config(tokenizer(), &app.context).with_entries(lore());
    let out = pre.context("haru: is Patchouli in?").unwrap();
    assert!(out.contains("Patchouli: librarian"));
    assert!(!out.contains("Voile: a library"));
}

#[test]
fn tight_budget_keeps_the_latest_conversation() {
    // Lore takes 25 tokens, leaving 6 for a 12-token transcript.
    let mut config = ContextConfig::default();
    config.token_budget = 31;
    let mut pre = ContextPreprocessor::from_config(tokenizer(), &config).with_entries(lore());

    let transcript = "haru: good morning.\nhina: morning.\nharu: where is Patchouli?";
    let out = pre.context(transcript).unwrap();

    assert!(out.starts_with("[ Style: replies are short ]"));
    assert!(out.ends_with("haru: where is Patchouli?"));
    assert!(!out.contains("good morning"));
}

#[test]
fn strict_budget_mode_fails_loudly() {
    let composer = ContextComposer::new(
        tokenizer(),
        ComposerConfig {
            budget: 3,
            budget_mode: BudgetMode::Strict,
            ..ComposerConfig::default()
        },
    );
    let entries: EntrySet = [ContextEntry::builder("one two three four five")
        .forced(true)
        .trim_direction(TrimDirection::None)
        .trim_type(TrimType::Token)
        .build()]
    .into_iter()
    .collect();

    assert!(matches!(
        composer.compose(&entries),
        Err(ComposeError::BudgetOverrun { entry: 0, .. })
    ));
}

#[test]
fn composer_config_follows_app_config() {
    let mut app = AppConfig::default();
    app.context.token_budget = 64;
    app.context.budget_mode = BudgetMode::Strict;
    let config = ComposerConfig::from(&app.context);
    assert_eq!(config.budget, 64);
    assert_eq!(config.max_cascade_depth, 3);
    assert_eq!(config.budget_mode, BudgetMode::Strict);
}

// ── Conversation loop ────────────────────────────────────────────────────

#[tokio::test]
async fn full_turn_composes_generates_and_records() {
    let provider = ScriptedProvider::new(&[" Patchouli:", " It is in the Voile library.\n\n"]);
    let pre = ContextPreprocessor::from_config(tokenizer(), &ContextConfig::default())
        .with_entries(lore());
    let mut bot = ChatBot::new("Patchouli", provider.clone())
        .with_preprocessor(pre)
        .with_postprocessor(NewlinePruner);

    let reply = bot
        .conditional_response("haru: Patchouli, where is the book?")
        .await
        .unwrap();
    assert_eq!(reply.as_deref(), Some(" It is in the Voile library."));

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("[ Patchouli: librarian of the Voile library ]"));
    assert!(prompts[0].ends_with("haru: Patchouli, where is the book?"));
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn silent_turn_generates_once() {
    let provider = ScriptedProvider::new(&[" haru:"]);
    let mut bot = ChatBot::new("Patchouli", provider.clone());

    assert_eq!(bot.conditional_response("haru: hmm").await.unwrap(), None);
    assert_eq!(provider.prompts().len(), 1);
    assert_eq!(bot.chain(), ["haru: hmm"]);
}

#[tokio::test]
async fn responses_extend_the_transcript() {
    let provider = ScriptedProvider::new(&[" hi\n", " fine\n"]);
    let mut bot = ChatBot::new("Patchouli", provider.clone()).with_postprocessor(NewlinePruner);

    bot.respond("haru: hello", true).await.unwrap();
    bot.respond("haru: how are you?", true).await.unwrap();

    assert_eq!(
        bot.chain(),
        [
            "haru: hello",
            "Patchouli: hi",
            "haru: how are you?",
            "Patchouli: fine"
        ]
    );
    assert_eq!(
        provider.prompts()[1],
        "haru: hello\nPatchouli: hi\nharu: how are you?"
    );
}

#[tokio::test]
async fn provider_failures_surface_as_errors() {
    let provider = ScriptedProvider::new(&[]);
    let mut bot = ChatBot::new("Patchouli", provider);
    let err = bot.respond("haru: hello", true).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::GenerationFailed(_))));
}
