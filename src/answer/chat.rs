/// OpenAI-compatible generation backend (OpenAI, Groq, Ollama)
use super::{AnswerError, Answerer, ANSWER_FAILURE};
use crate::error::{GovragError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default generation model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
/// Default system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "Use the provided context to answer.";
/// Completion budget per answer
const MAX_TOKENS: usize = 512;

/// Which request shape the backend expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStyle {
    /// `/chat/completions` with role-tagged messages
    Chat,
    /// `/completions` with a single prompt string
    Completion,
}

/// Request payload for the chat completion API
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

/// Role-tagged message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request payload for the single-prompt completion API
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Answerer backed by a remote completion service
pub struct ChatAnswerer {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    style: ApiStyle,
    temperature: f32,
    system_prompt: String,
}

impl ChatAnswerer {
    /// Create an answerer whose credential is read from `api_key_env`.
    ///
    /// Fails with [`GovragError::MissingCredential`] before any request is made
    /// if the variable is unset or empty.
    pub fn from_env(api_key_env: &str, api_base: &str, model: &str, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GovragError::MissingCredential {
                var: api_key_env.to_string(),
            })?;

        Self::new(api_key, api_base, model, timeout)
    }

    /// Create an answerer with an explicit credential (empty sends no auth header)
    pub fn new(api_key: String, api_base: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GovragError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            style: ApiStyle::Chat,
            temperature: 0.2,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        })
    }

    #[must_use]
    pub fn with_style(mut self, style: ApiStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = system_prompt.to_string();
        self
    }

    /// Ask the backend, surfacing every failure
    pub fn generate(&self, question: &str, context: &str) -> std::result::Result<String, AnswerError> {
        let user_prompt = user_prompt(question, context);

        match self.style {
            ApiStyle::Chat => {
                let request = ChatRequest {
                    model: &self.model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: &self.system_prompt,
                        },
                        ChatMessage {
                            role: "user",
                            content: &user_prompt,
                        },
                    ],
                    temperature: self.temperature,
                    max_tokens: MAX_TOKENS,
                };
                let body = self.post("chat/completions", &request)?;
                parse_chat(&body)
            }
            ApiStyle::Completion => {
                let prompt = format!("{}\n\n{}\n\nAnswer:", self.system_prompt, user_prompt);
                let request = CompletionRequest {
                    model: &self.model,
                    prompt: &prompt,
                    temperature: self.temperature,
                    max_tokens: MAX_TOKENS,
                };
                let body = self.post("completions", &request)?;
                parse_completion(&body)
            }
        }
    }

    fn post<T: Serialize>(&self, path: &str, request: &T) -> std::result::Result<String, AnswerError> {
        let url = format!("{}/{}", self.api_base, path);
        debug!("POST {} (model {})", url, self.model);

        let mut builder = self.client.post(&url).json(request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .map_err(|e| AnswerError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AnswerError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(AnswerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

impl Answerer for ChatAnswerer {
    fn answer(&self, question: &str, context: &str) -> String {
        match self.generate(question, context) {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM error: {}", e);
                ANSWER_FAILURE.to_string()
            }
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn user_prompt(question: &str, context: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", context, question)
}

fn parse_chat(body: &str) -> std::result::Result<String, AnswerError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AnswerError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AnswerError::MalformedResponse("no choices returned".to_string()))
}

fn parse_completion(body: &str) -> std::result::Result<String, AnswerError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| AnswerError::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text.trim().to_string())
        .ok_or_else(|| AnswerError::MalformedResponse("no choices returned".to_string()))
}
