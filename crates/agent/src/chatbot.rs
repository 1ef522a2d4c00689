//! The conversational loop.
//!
//! A [`ChatBot`] keeps a rolling transcript (the chain), runs it through
//! its preprocessors, and asks the model provider whether to speak and
//! what to say. Postprocessors clean the reply before it joins the
//! transcript.

use std::sync::Arc;

use tessera_core::error::Result;
use tessera_core::processor::{Postprocessor, Preprocessor, Turn};
use tessera_core::provider::ModelProvider;
use tracing::{debug, info};

pub struct ChatBot {
    /// The name the bot speaks as
    name: String,

    /// Backend used for every generation
    provider: Arc<dyn ModelProvider>,

    /// Applied in order to the transcript before each provider call
    preprocessors: Vec<Box<dyn Preprocessor>>,

    /// Applied in order to every reply
    postprocessors: Vec<Box<dyn Postprocessor>>,

    /// Transcript lines, oldest first
    chain: Vec<String>,
}

impl ChatBot {
    pub fn new(name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
            preprocessors: Vec::new(),
            postprocessors: Vec::new(),
            chain: Vec::new(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    pub fn with_postprocessor(mut self, postprocessor: impl Postprocessor + 'static) -> Self {
        self.postprocessors.push(Box::new(postprocessor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    pub fn clear_chain(&mut self) {
        self.chain.clear();
    }

    /// Whether the bot should speak after `text`.
    ///
    /// With `push_chain`, `text` is appended to the transcript first.
    pub async fn should_respond(&mut self, text: &str, push_chain: bool) -> Result<bool> {
        let context = self.prepare(text, push_chain, false)?;
        let decision = self.provider.should_respond(&context, &self.name).await?;
        debug!(provider = self.provider.name(), decision, "Should-respond probe");
        Ok(decision)
    }

    /// Produce the bot's reply to `text`.
    ///
    /// With `push_chain`, both `text` and the reply (as `"{name}:{reply}"`)
    /// are appended to the transcript.
    pub async fn respond(&mut self, text: &str, push_chain: bool) -> Result<String> {
        let context = self.prepare(text, push_chain, true)?;
        let mut response = self.provider.respond(&context).await?;
        for postprocessor in &self.postprocessors {
            response = postprocessor.process(&response);
        }

        if push_chain {
            self.chain.push(format!("{}:{}", self.name, response));
        }
        info!(
            name = %self.name,
            chars = response.len(),
            chain = self.chain.len(),
            "Responded"
        );
        Ok(response)
    }

    /// Record `text`, then reply only if the provider says the bot should.
    pub async fn conditional_response(&mut self, text: &str) -> Result<Option<String>> {
        if self.should_respond(text, true).await? {
            Ok(Some(self.respond(text, false).await?))
        } else {
            Ok(None)
        }
    }

    fn prepare(&mut self, text: &str, push_chain: bool, is_respond: bool) -> Result<String> {
        if push_chain {
            self.chain.push(text.to_string());
        }
        let mut context = if self.chain.is_empty() {
            text.to_string()
        } else {
            self.chain.join("\n")
        };

        let turn = Turn {
            is_respond,
            name: &self.name,
        };
        for preprocessor in &mut self.preprocessors {
            context = preprocessor.process(&context, &turn)?;
        }
        Ok(context)
    }
}
