//! Vector indexes
//!
//! Entries are `(vector, text)` pairs addressed by insertion position. They are
//! only ever appended. `FlatIndex` is the exact reference implementation and
//! the default; `HnswIndex` trades exactness for sub-linear search.
mod flat;
mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

use crate::config::RetrievalConfig;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Vector/text count mismatch: {vectors} vectors for {texts} texts")]
    LengthMismatch { vectors: usize, texts: usize },

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Insert failed: {0}")]
    InsertError(String),
}

/// Search result with insertion position and squared Euclidean distance
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Insertion position of the entry
    pub position: usize,
    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,
    /// The stored text
    pub text: String,
}

/// Append-only store of `(vector, text)` pairs with k-nearest-neighbor search
pub trait VectorStore {
    /// Append pairs. Returns the number of entries added.
    ///
    /// An empty batch is a logged no-op. Vectors of the wrong length are
    /// stored as zero vectors instead.
    fn add(&mut self, vectors: Vec<Vec<f32>>, texts: Vec<String>) -> Result<usize, VectorIndexError>;

    /// Up to `k` entries nearest to `query`, nearest first, ties broken by
    /// insertion order.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError>;

    /// Text stored at `position`
    fn text(&self, position: usize) -> Option<&str>;

    /// Number of stored entries
    fn len(&self) -> usize;

    /// Vector dimension, once known
    fn dimension(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the index kind selected by configuration
pub fn build_index(config: &RetrievalConfig) -> Box<dyn VectorStore> {
    match config.index.as_str() {
        "hnsw" => Box::new(HnswIndex::new(
            config.hnsw_m,
            config.hnsw_ef_construction,
            config.hnsw_ef_search,
            config.hnsw_max_elements,
        )),
        _ => Box::new(FlatIndex::new()),
    }
}

/// Checks shared by every index before anything is written.
///
/// Fixes the dimension from the first vector when it is still unknown and
/// replaces any vector of the wrong length with zeros.
pub(crate) fn admit(
    dimension: &mut Option<usize>,
    vectors: Vec<Vec<f32>>,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, VectorIndexError> {
    if vectors.len() != texts.len() {
        return Err(VectorIndexError::LengthMismatch {
            vectors: vectors.len(),
            texts: texts.len(),
        });
    }

    let expected = match *dimension {
        Some(d) => d,
        None => {
            let first = vectors.first().map(Vec::len).unwrap_or(0);
            if first == 0 {
                return Err(VectorIndexError::InvalidDimension {
                    expected: 1,
                    actual: 0,
                });
            }
            *dimension = Some(first);
            first
        }
    };

    Ok(vectors
        .into_iter()
        .map(|v| {
            if v.len() == expected {
                v
            } else {
                warn!(
                    "{}; storing a zero vector",
                    VectorIndexError::InvalidDimension {
                        expected,
                        actual: v.len(),
                    }
                );
                vec![0.0; expected]
            }
        })
        .collect())
}

/// Order `(position, distance)` candidates nearest first, ties by position.
pub(crate) fn rank(mut candidates: Vec<(usize, f32)>, k: usize) -> Vec<(usize, f32)> {
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    candidates.truncate(k);
    candidates
}
