//! ModelProvider trait, the abstraction over text-generation backends.
//!
//! A provider turns a prompt into a continuation. Two conversational
//! capabilities are layered on top of raw generation: deciding whether
//! a named speaker should talk next, and producing that speaker's reply.
//! Both have default implementations expressed through [`ModelProvider::generate`],
//! so a backend only has to implement generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Sampling parameters. Unset fields are left to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_a: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tfs: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_p_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_p_slope: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bad_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logit_biases: Vec<LogitBias>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phrase_biases: Vec<PhraseBias>,
}

/// Length and stopping parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenArgs {
    pub max_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eos_token_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_of: Option<u32>,
}

impl Default for GenArgs {
    fn default() -> Self {
        Self {
            max_length: 100,
            max_time: None,
            min_length: None,
            eos_token_id: None,
            logprobs: None,
            best_of: None,
        }
    }
}

/// Bias applied to a single token id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogitBias {
    pub id: u32,
    pub bias: f32,
}

/// Bias applied to whole phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseBias {
    pub sequences: Vec<String>,
    pub bias: f32,
    pub ensure_sequence_finish: bool,
    pub generate_once: bool,
}

/// A complete generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Optional soft prompt identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub softprompt: Option<String>,

    #[serde(default)]
    pub sample: SampleArgs,

    #[serde(default)]
    pub gen_args: GenArgs,
}

impl GenerationRequest {
    /// The short, low-temperature probe used to ask whether `name`
    /// speaks next: the output is biased toward `name` and stops early.
    pub fn should_respond_probe(&self, context: &str, name: &str) -> Self {
        let mut probe = self.clone();
        probe.prompt = context.to_string();
        probe.gen_args.max_length = 10;
        probe.gen_args.eos_token_id = Some(25);
        probe.gen_args.best_of = None;
        probe.sample.temp = Some(0.25);
        probe.sample.rep_p = None;
        probe.sample.rep_p_range = None;
        probe.sample.rep_p_slope = None;
        probe.sample.phrase_biases = vec![PhraseBias {
            sequences: vec![name.to_string()],
            bias: 1.5,
            ensure_sequence_finish: true,
            generate_once: true,
        }];
        probe
    }
}

/// The core ModelProvider trait.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The provider name, for logs.
    fn name(&self) -> &str;

    /// The request every conversational call starts from.
    fn default_request(&self) -> GenerationRequest;

    /// Generate a continuation of `request.prompt`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError>;

    /// Whether `name` is predicted to speak next after `context`.
    async fn should_respond(&self, context: &str, name: &str) -> Result<bool, ProviderError> {
        let probe = self.default_request().should_respond_probe(context, name);
        let output = self.generate(probe).await?;
        Ok(output.contains(name))
    }

    /// Produce the next reply after `context`.
    async fn respond(&self, context: &str) -> Result<String, ProviderError> {
        let mut request = self.default_request();
        request.prompt = context.to_string();
        self.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        output: String,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl ModelProvider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn default_request(&self) -> GenerationRequest {
            GenerationRequest {
                model: "test-model".into(),
                ..Default::default()
            }
        }

        async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.output.clone())
        }
    }

    fn recorder(output: &str) -> Recorder {
        Recorder {
            output: output.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn should_respond_looks_for_name() {
        let provider = recorder(" Patchouli:");
        assert!(provider.should_respond("haru: hi", "Patchouli").await.unwrap());
        assert!(!provider.should_respond("haru: hi", "Marisa").await.unwrap());

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].gen_args.max_length, 10);
        assert_eq!(seen[0].sample.temp, Some(0.25));
        assert_eq!(seen[0].sample.phrase_biases[0].sequences, vec!["Patchouli"]);
    }

    #[tokio::test]
    async fn respond_uses_context_as_prompt() {
        let provider = recorder("hello");
        assert_eq!(provider.respond("haru: hi\n").await.unwrap(), "hello");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].prompt, "haru: hi\n");
        assert_eq!(seen[0].model, "test-model");
    }

    #[test]
    fn request_serialization_skips_unset() {
        let json = serde_json::to_string(&GenerationRequest::default()).unwrap();
        assert!(!json.contains("softprompt"));
        assert!(!json.contains("top_p"));
        assert!(json.contains("\"max_length\":100"));
    }
}
