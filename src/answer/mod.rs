//! Answer synthesis from retrieved context
//!
//! Answerers never fail: a generation backend that errors out produces
//! [`ANSWER_FAILURE`] instead.
mod chat;
mod passthrough;

pub use chat::{ApiStyle, ChatAnswerer, DEFAULT_CHAT_MODEL, DEFAULT_SYSTEM_PROMPT};
pub use passthrough::{ContextPassthrough, CONTEXT_PREFIX};

use crate::config::LlmConfig;
use crate::error::Result;
use std::time::Duration;
use thiserror::Error;

/// Returned whenever the generation backend fails, whatever the cause
pub const ANSWER_FAILURE: &str = "Sorry, I couldn't answer the question.";

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Produces an answer to `question` grounded in `context`
pub trait Answerer {
    fn answer(&self, question: &str, context: &str) -> String;

    /// Short label for logs
    fn name(&self) -> &str;
}

/// Build the answerer selected by configuration
///
/// A disabled LLM, or `offline`, selects [`ContextPassthrough`]. Otherwise the
/// credential is resolved now and a missing one is an error.
pub fn build_answerer(config: &LlmConfig, offline: bool) -> Result<Box<dyn Answerer>> {
    if offline || !config.enabled {
        return Ok(Box::new(ContextPassthrough));
    }

    let style = match config.style.as_str() {
        "completion" => ApiStyle::Completion,
        _ => ApiStyle::Chat,
    };

    // Local ollama servers accept any bearer token
    let answerer = if config.provider == "ollama" {
        ChatAnswerer::new(
            String::new(),
            &config.api_base,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?
    } else {
        ChatAnswerer::from_env(
            &config.api_key_env,
            &config.api_base,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?
    };

    Ok(Box::new(
        answerer
            .with_style(style)
            .with_temperature(config.temperature)
            .with_system_prompt(&config.system_prompt),
    ))
}
