use crate::config::Config;
use crate::embedding::remote_model_dimension;
use crate::error::{GovragError, Result, ValidationError};

const EMBEDDING_BACKENDS: [&str; 2] = ["local", "remote"];
const LLM_PROVIDERS: [&str; 3] = ["openai", "groq", "ollama"];
const LLM_STYLES: [&str; 2] = ["chat", "completion"];
const INDEX_KINDS: [&str; 2] = ["flat", "hnsw"];
const MAX_TIMEOUT_SECS: u64 = 300;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    ///
    /// Credentials are not checked here; remote components check them when
    /// they are constructed.
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_embedding(config, &mut errors);
        Self::validate_llm(config, &mut errors);
        Self::validate_retrieval(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GovragError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_embedding(config: &Config, errors: &mut Vec<ValidationError>) {
        let embedding = &config.embedding;

        if !EMBEDDING_BACKENDS.contains(&embedding.backend.as_str()) {
            errors.push(ValidationError::new(
                "embedding.backend",
                format!(
                    "Backend must be one of {:?}, got '{}'",
                    EMBEDDING_BACKENDS, embedding.backend
                ),
            ));
        }

        if embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "Model name cannot be empty",
            ));
        }

        if embedding.dimension == Some(0) {
            errors.push(ValidationError::new(
                "embedding.dimension",
                "Dimension must be greater than 0 when set",
            ));
        }

        // A failed probe would otherwise fix an unknown model at a guessed size
        if embedding.backend == "remote"
            && embedding.dimension.is_none()
            && !embedding.model.is_empty()
            && remote_model_dimension(&embedding.model).is_none()
        {
            errors.push(ValidationError::new(
                "embedding.dimension",
                format!(
                    "Dimension must be set for remote model '{}', its size is not known",
                    embedding.model
                ),
            ));
        }

        if embedding.batch_size == 0 {
            errors.push(ValidationError::new(
                "embedding.batch_size",
                "Batch size must be greater than 0",
            ));
        }

        Self::validate_timeout("embedding.timeout_secs", embedding.timeout_secs, errors);
    }

    fn validate_llm(config: &Config, errors: &mut Vec<ValidationError>) {
        let llm = &config.llm;

        if !LLM_PROVIDERS.contains(&llm.provider.as_str()) {
            errors.push(ValidationError::new(
                "llm.provider",
                format!(
                    "Provider must be one of {:?}, got '{}'",
                    LLM_PROVIDERS, llm.provider
                ),
            ));
        }

        if !LLM_STYLES.contains(&llm.style.as_str()) {
            errors.push(ValidationError::new(
                "llm.style",
                format!("Style must be one of {:?}, got '{}'", LLM_STYLES, llm.style),
            ));
        }

        if llm.model.is_empty() {
            errors.push(ValidationError::new("llm.model", "Model name cannot be empty"));
        }

        let temp = llm.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "llm.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }

        Self::validate_timeout("llm.timeout_secs", llm.timeout_secs, errors);
    }

    fn validate_retrieval(config: &Config, errors: &mut Vec<ValidationError>) {
        let retrieval = &config.retrieval;

        if retrieval.top_k == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k",
                "top_k must be greater than 0",
            ));
        }

        if !INDEX_KINDS.contains(&retrieval.index.as_str()) {
            errors.push(ValidationError::new(
                "retrieval.index",
                format!(
                    "Index must be one of {:?}, got '{}'",
                    INDEX_KINDS, retrieval.index
                ),
            ));
        }

        // HNSW parameters only matter when that index is selected
        if retrieval.index == "hnsw" {
            for (path, value) in [
                ("retrieval.hnsw_m", retrieval.hnsw_m),
                ("retrieval.hnsw_ef_construction", retrieval.hnsw_ef_construction),
                ("retrieval.hnsw_ef_search", retrieval.hnsw_ef_search),
                ("retrieval.hnsw_max_elements", retrieval.hnsw_max_elements),
            ] {
                if value == 0 {
                    errors.push(ValidationError::new(path, "Must be greater than 0"));
                }
            }
        }
    }

    fn validate_timeout(path: &str, secs: u64, errors: &mut Vec<ValidationError>) {
        if secs == 0 || secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                path,
                format!(
                    "Timeout must be between 1 and {} seconds, got {}",
                    MAX_TIMEOUT_SECS, secs
                ),
            ));
        }
    }
}
