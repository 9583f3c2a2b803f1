/// Embedding backends
///
/// - `EmbeddingProvider` trait over backends
/// - `FastEmbedProvider` for local embedding (all-MiniLM-L6-v2, 384-dim)
/// - `RemoteEmbeddingProvider` for OpenAI-compatible HTTP APIs
/// - `Embedder`, the never-failing front end the pipeline talks to
mod embedder;
mod provider;
mod remote;

pub use embedder::{Embedder, DEFAULT_BATCH_SIZE};
pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use remote::{remote_model_dimension, RemoteEmbeddingProvider, DEFAULT_REMOTE_MODEL};

use crate::config::EmbeddingConfig;
use crate::error::{GovragError, Result};
use std::time::Duration;

/// Build the embedder selected by configuration
///
/// Remote backends fail here with `MissingCredential` when their key is absent.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Embedder> {
    let provider: Box<dyn EmbeddingProvider> = match config.backend.as_str() {
        "local" => Box::new(
            FastEmbedProvider::new(&config.model).map_err(|e| GovragError::Config(e.to_string()))?,
        ),
        "remote" => Box::new(RemoteEmbeddingProvider::from_env(
            &config.api_key_env,
            &config.api_base,
            &config.model,
            Duration::from_secs(config.timeout_secs),
        )?),
        other => {
            return Err(GovragError::InvalidConfigValue {
                path: "embedding.backend".to_string(),
                message: format!("Unknown backend '{}'", other),
            })
        }
    };

    let embedder = Embedder::new(provider).with_batch_size(config.batch_size);
    Ok(match config.dimension {
        Some(dimension) => embedder.with_dimension(dimension),
        None => embedder,
    })
}
