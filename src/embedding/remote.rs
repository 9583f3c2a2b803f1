/// OpenAI-compatible remote embedding provider
use super::{EmbeddingError, EmbeddingProvider};
use crate::error::{GovragError, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default remote embedding model
pub const DEFAULT_REMOTE_MODEL: &str = "text-embedding-ada-002";

/// Request payload for the `/embeddings` endpoint
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

/// Remote embedding provider speaking the OpenAI `/embeddings` protocol
pub struct RemoteEmbeddingProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl RemoteEmbeddingProvider {
    /// Create a provider whose credential is read from `api_key_env`.
    ///
    /// Fails with [`GovragError::MissingCredential`] before any request is made
    /// if the variable is unset or empty.
    pub fn from_env(
        api_key_env: &str,
        api_base: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GovragError::MissingCredential {
                var: api_key_env.to_string(),
            })?;

        Self::new(api_key, api_base, model, timeout)
    }

    /// Create a provider with an explicit credential
    pub fn new(api_key: String, api_base: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GovragError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/embeddings", api_base.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| EmbeddingError::GenerationError(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::GenerationError(format!(
                "API error {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        parse_embeddings(&body)
    }

    fn nominal_dimension(&self) -> usize {
        remote_model_dimension(&self.model).unwrap_or(DEFAULT_REMOTE_DIMENSION)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Fallback size for models missing from the table
const DEFAULT_REMOTE_DIMENSION: usize = 1536;

/// Documented output size of the known hosted embedding models
pub fn remote_model_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-large" => Some(3072),
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

/// Extract vectors from an `/embeddings` response body.
///
/// Entries are ordered by their `index` field when every entry carries one.
/// An entry whose `embedding` is missing or not an array of numbers becomes an
/// empty vector so the caller can substitute it in place.
pub(crate) fn parse_embeddings(body: &Value) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| EmbeddingError::MalformedResponse("missing `data` array".to_string()))?;

    let mut entries: Vec<&Value> = data.iter().collect();
    if entries
        .iter()
        .all(|entry| entry.get("index").and_then(Value::as_u64).is_some())
    {
        entries.sort_by_key(|entry| entry.get("index").and_then(Value::as_u64));
    }

    Ok(entries.into_iter().map(parse_vector).collect())
}

fn parse_vector(entry: &Value) -> Vec<f32> {
    let Some(values) = entry.get("embedding").and_then(Value::as_array) else {
        return Vec::new();
    };

    values
        .iter()
        .map(|v| v.as_f64().map(|x| x as f32))
        .collect::<Option<Vec<f32>>>()
        .unwrap_or_default()
}
