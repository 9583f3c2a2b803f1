/// HNSW vector index for approximate nearest-neighbor search
use super::{admit, rank, FlatIndex, SearchResult, VectorIndexError, VectorStore};
use hnsw_rs::prelude::*;
use tracing::debug;

/// Upper bound on HNSW layers supported by hnsw_rs
const MAX_LAYERS: usize = 16;

/// HNSW vector index wrapper
///
/// Approximate once the index outgrows `ef_search`: the graph is asked for
/// `ef_search` candidates (at least `k`), which are re-ranked by
/// (distance, position). While every entry fits in that candidate budget the
/// search is an exact scan instead, so ties resolve by insertion order.
/// Uses L2 distance so zero vectors from degraded embeddings stay searchable.
pub struct HnswIndex {
    index: Hnsw<'static, f32, DistL2>,
    /// Exact copy of every entry; owns the texts and serves small searches
    exact: FlatIndex,
    ef_search: usize,
}

impl HnswIndex {
    /// Create a new HNSW index
    ///
    /// # Arguments
    /// * `m` - HNSW M parameter (number of connections per layer)
    /// * `ef_construction` - construction breadth (higher = better recall, slower build)
    /// * `ef_search` - search breadth (higher = better recall, slower search)
    /// * `max_elements` - expected number of entries, used to size the layer count
    pub fn new(m: usize, ef_construction: usize, ef_search: usize, max_elements: usize) -> Self {
        let max_layer = MAX_LAYERS
            .min((max_elements.max(2) as f32).ln().trunc() as usize)
            .max(1);

        let index = Hnsw::<f32, DistL2>::new(m, max_elements, max_layer, ef_construction, DistL2 {});

        Self {
            index,
            exact: FlatIndex::new(),
            ef_search,
        }
    }
}

impl VectorStore for HnswIndex {
    fn add(&mut self, vectors: Vec<Vec<f32>>, texts: Vec<String>) -> Result<usize, VectorIndexError> {
        if vectors.is_empty() && texts.is_empty() {
            debug!("HnswIndex::add called with an empty batch, nothing to do");
            return Ok(0);
        }

        let mut dimension = self.exact.dimension();
        let vectors = admit(&mut dimension, vectors, &texts)?;

        let first = self.exact.len();
        let added = self.exact.add(vectors.clone(), texts)?;
        for (offset, data) in vectors.iter().enumerate() {
            self.index.insert((data, first + offset));
        }

        debug!("HnswIndex now holds {} entries", self.exact.len());
        Ok(added)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        let len = self.exact.len();
        if len == 0 || k == 0 {
            return Ok(Vec::new());
        }
        if len <= self.ef_search {
            return self.exact.search(query, k);
        }

        let dimension = self.exact.dimension().unwrap_or_default();
        if query.len() != dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: dimension,
                actual: query.len(),
            });
        }

        let breadth = len.min(self.ef_search.max(k));
        let candidates = self
            .index
            .search(query, breadth, breadth)
            .into_iter()
            .filter(|neighbour| neighbour.d_id < len)
            // DistL2 is the root of the sum of squares
            .map(|neighbour| (neighbour.d_id, neighbour.distance * neighbour.distance))
            .collect();

        Ok(rank(candidates, k)
            .into_iter()
            .filter_map(|(position, distance)| {
                self.exact.text(position).map(|text| SearchResult {
                    position,
                    distance,
                    text: text.to_string(),
                })
            })
            .collect())
    }

    fn text(&self, position: usize) -> Option<&str> {
        self.exact.text(position)
    }

    fn len(&self) -> usize {
        self.exact.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.exact.dimension()
    }
}
