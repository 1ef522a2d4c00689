//! Output cleanup applied after a provider call.

use tessera_core::processor::Postprocessor;

/// Strips trailing newlines from model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlinePruner;

impl Postprocessor for NewlinePruner {
    fn process(&self, output: &str) -> String {
        output.trim_end_matches('\n').to_string()
    }
}
