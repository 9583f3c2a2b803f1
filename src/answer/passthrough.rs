use super::Answerer;

/// Prefix marking passthrough output as retrieved material, not a synthesized answer
pub const CONTEXT_PREFIX: &str = "Retrieved context (no answer was generated):";

/// Answerer that skips generation and hands back the retrieved context
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextPassthrough;

impl Answerer for ContextPassthrough {
    fn answer(&self, _question: &str, context: &str) -> String {
        format!("{}\n{}", CONTEXT_PREFIX, context)
    }

    fn name(&self) -> &str {
        "context-passthrough"
    }
}
