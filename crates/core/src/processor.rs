//! Pre- and postprocessing hooks around a provider call.
//!
//! Preprocessors rewrite the conversation context before it reaches the
//! model (this is where context composition plugs in); postprocessors
//! clean up the model output before it is returned.

use crate::error::Result;

/// What kind of turn the context is being prepared for.
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    /// `true` when producing a reply, `false` for a should-respond probe.
    pub is_respond: bool,
    /// The speaker the turn is for.
    pub name: &'a str,
}

pub trait Preprocessor: Send {
    fn process(&mut self, context: &str, turn: &Turn<'_>) -> Result<String>;
}

pub trait Postprocessor: Send + Sync {
    fn process(&self, output: &str) -> String;
}
