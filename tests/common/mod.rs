//! Deterministic embedding backends shared by the integration tests
#![allow(dead_code)]

use govrag::embedding::{EmbeddingError, EmbeddingProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Concept buckets: a text's vector counts the words it has in each bucket
const CONCEPTS: &[&[&str]] = &[
    &["food", "stamps", "calfresh", "groceries", "nutrition", "assistance"],
    &["unemployment", "edd", "jobs", "employment", "benefits"],
    &["vehicle", "dmv", "license", "registration", "driver"],
    &["tax", "taxes", "franchise", "refund"],
];

/// Bag-of-concepts embedder that places related strings close together
#[derive(Default)]
pub struct ConceptEmbedder {
    pub calls: Arc<AtomicUsize>,
}

impl ConceptEmbedder {
    pub fn counting() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; CONCEPTS.len()];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            for (i, bucket) in CONCEPTS.iter().enumerate() {
                if bucket.contains(&word) {
                    v[i] += 1.0;
                }
            }
        }
        v
    }
}

impl EmbeddingProvider for ConceptEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn nominal_dimension(&self) -> usize {
        CONCEPTS.len()
    }

    fn model_name(&self) -> &str {
        "concepts"
    }
}

/// Backend that rejects every request
pub struct FailingEmbedder {
    pub nominal: usize,
}

impl EmbeddingProvider for FailingEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::GenerationError("401 Unauthorized".to_string()))
    }

    fn nominal_dimension(&self) -> usize {
        self.nominal
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Backend that answers with one vector fewer than requested, of the wrong length
pub struct TruncatingEmbedder;

impl EmbeddingProvider for TruncatingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .skip(1)
            .enumerate()
            .map(|(i, _)| if i == 0 { vec![1.0; 7] } else { vec![1.0; 4] })
            .collect())
    }

    fn nominal_dimension(&self) -> usize {
        4
    }

    fn model_name(&self) -> &str {
        "truncating"
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
