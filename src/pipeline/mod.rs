//! Retrieval pipeline: embed, index, search, answer
//!
//! The pipeline is single-owner and synchronous. Mutation (`add_texts`) takes
//! `&mut self` and search takes `&self`, so the borrow checker serializes
//! ingestion against queries on the same instance.

use crate::answer::{build_answerer, Answerer};
use crate::config::Config;
use crate::embedding::{build_embedder, Embedder};
use crate::error::Result;
use crate::index::{build_index, FlatIndex, VectorStore};
use tracing::{debug, info, warn};

/// Returned by [`RetrievalPipeline::answer`] when nothing relevant is indexed
pub const NO_ANSWER: &str = "No relevant information found.";

/// Default number of records retrieved per question
pub const DEFAULT_TOP_K: usize = 3;

/// Owns an [`Embedder`], a [`VectorStore`] and an [`Answerer`]
pub struct RetrievalPipeline {
    embedder: Embedder,
    index: Box<dyn VectorStore>,
    answerer: Box<dyn Answerer>,
    top_k: usize,
}

impl RetrievalPipeline {
    /// Create a pipeline over an exact [`FlatIndex`]
    pub fn new(embedder: Embedder, answerer: Box<dyn Answerer>) -> Self {
        Self::with_index(embedder, Box::new(FlatIndex::new()), answerer)
    }

    /// Create a pipeline over a caller-supplied index, which should be empty
    pub fn with_index(
        embedder: Embedder,
        index: Box<dyn VectorStore>,
        answerer: Box<dyn Answerer>,
    ) -> Self {
        Self {
            embedder,
            index,
            answerer,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Build every component from configuration.
    ///
    /// Fails only on configuration problems such as a missing credential for
    /// a selected remote backend. No backend call is made here.
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let embedder = build_embedder(&config.embedding)?;
        let answerer = build_answerer(&config.llm, offline)?;
        let index = build_index(&config.retrieval);

        info!(
            "Pipeline ready: embedding model {}, {} index, answerer {}",
            embedder.model_name(),
            config.retrieval.index,
            answerer.name()
        );

        Ok(Self::with_index(embedder, index, answerer).with_top_k(config.retrieval.top_k))
    }

    /// Set the `top_k` used by [`answer`](Self::answer)
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Embed `texts` and append them to the index. Returns how many were added.
    ///
    /// Never fails: degraded embeddings are stored as zero vectors.
    pub fn add_texts(&mut self, texts: &[String]) -> usize {
        if texts.is_empty() {
            warn!("add_texts called with no texts, nothing to index");
            return 0;
        }

        let vectors = self.embedder.embed(texts);
        match self.index.add(vectors, texts.to_vec()) {
            Ok(added) => {
                debug!("Indexed {} texts ({} total)", added, self.index.len());
                added
            }
            Err(e) => {
                // Unreachable with a conforming embedder; the index is left untouched
                warn!("Failed to index {} texts: {}", texts.len(), e);
                0
            }
        }
    }

    /// Up to `top_k` indexed texts nearest to `question`, nearest first
    pub fn query(&self, question: &str, top_k: usize) -> Vec<String> {
        if self.index.is_empty() {
            warn!("Query against an empty index, returning no results");
            return Vec::new();
        }
        if top_k == 0 {
            return Vec::new();
        }

        let query_vector = self.embedder.embed_one(question);
        match self.index.search(&query_vector, top_k) {
            Ok(results) => results.into_iter().map(|r| r.text).collect(),
            Err(e) => {
                warn!("Search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Answer `question` from the configured `top_k` nearest texts
    pub fn answer(&self, question: &str) -> String {
        let results = self.query(question, self.top_k);
        if results.is_empty() {
            return NO_ANSWER.to_string();
        }

        let context = results.join("\n");
        self.answerer.answer(question, &context)
    }

    /// Number of indexed texts
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The embedder in use
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// The index in use
    pub fn index(&self) -> &dyn VectorStore {
        self.index.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::ContextPassthrough;
    use crate::embedding::{EmbeddingError, EmbeddingProvider};

    /// Embeds a text as the count of each lowercase letter
    struct LetterCounts;

    impl EmbeddingProvider for LetterCounts {
        fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; 26];
                    for c in t.chars().filter(char::is_ascii_lowercase) {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn nominal_dimension(&self) -> usize {
            26
        }

        fn model_name(&self) -> &str {
            "letter-counts"
        }
    }

    fn pipeline() -> RetrievalPipeline {
        RetrievalPipeline::new(
            Embedder::new(Box::new(LetterCounts)),
            Box::new(ContextPassthrough),
        )
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_texts_counts() {
        let mut pipeline = pipeline();
        assert_eq!(pipeline.add_texts(&strings(&["aaa", "bbb"])), 2);
        assert_eq!(pipeline.add_texts(&[]), 0);
        assert_eq!(pipeline.add_texts(&strings(&[""])), 1);
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.index().dimension(), Some(26));
    }

    #[test]
    fn test_query_nearest_first() {
        let mut pipeline = pipeline();
        pipeline.add_texts(&strings(&["aaaa", "bbbb", "aabb"]));

        assert_eq!(pipeline.query("aaa", 2), strings(&["aaaa", "aabb"]));
        assert!(pipeline.query("aaa", 0).is_empty());
        assert_eq!(pipeline.query("aaa", 10).len(), 3);
    }

    #[test]
    fn test_answer_joins_context_in_rank_order() {
        let mut pipeline = pipeline().with_top_k(2);
        pipeline.add_texts(&strings(&["bbbb", "aaaa", "aabb"]));

        let answer = pipeline.answer("aaa");
        assert!(answer.ends_with("aaaa\naabb"));
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = pipeline();
        assert!(pipeline.is_empty());
        assert!(pipeline.query("anything", 3).is_empty());
        assert_eq!(pipeline.answer("anything"), NO_ANSWER);
    }
}
