/// Exact brute-force index over an ndarray matrix
use super::{admit, rank, SearchResult, VectorIndexError, VectorStore};
use ndarray::{Array2, ArrayView1, Axis};
use tracing::debug;

/// Exact nearest-neighbor index
///
/// Vectors live row-major in a single `Array2`; search is a linear scan over
/// squared Euclidean distance.
#[derive(Debug, Default)]
pub struct FlatIndex {
    /// One row per entry; `None` until the dimension is known
    vectors: Option<Array2<f32>>,
    texts: Vec<String>,
}

impl FlatIndex {
    /// Create an empty index whose dimension is taken from the first insert
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a fixed dimension
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            vectors: Some(Array2::zeros((0, dimension))),
            texts: Vec::new(),
        }
    }
}

impl VectorStore for FlatIndex {
    fn add(&mut self, vectors: Vec<Vec<f32>>, texts: Vec<String>) -> Result<usize, VectorIndexError> {
        if vectors.is_empty() && texts.is_empty() {
            debug!("FlatIndex::add called with an empty batch, nothing to do");
            return Ok(0);
        }

        let mut dimension = self.dimension();
        let vectors = admit(&mut dimension, vectors, &texts)?;
        let dimension = dimension.unwrap_or_default();

        let matrix = self
            .vectors
            .get_or_insert_with(|| Array2::zeros((0, dimension)));

        let added = texts.len();
        for (vector, text) in vectors.iter().zip(texts) {
            matrix
                .push_row(ArrayView1::from(vector.as_slice()))
                .map_err(|e| VectorIndexError::InsertError(e.to_string()))?;
            self.texts.push(text);
        }

        debug!("FlatIndex now holds {} entries", self.texts.len());
        Ok(added)
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        let Some(matrix) = self.vectors.as_ref().filter(|m| m.nrows() > 0) else {
            return Ok(Vec::new());
        };

        if query.len() != matrix.ncols() {
            return Err(VectorIndexError::InvalidDimension {
                expected: matrix.ncols(),
                actual: query.len(),
            });
        }

        let query = ArrayView1::from(query);
        let distances = (matrix - &query).mapv_into(|x| x * x).sum_axis(Axis(1));

        let candidates = distances.iter().copied().enumerate().collect();

        Ok(rank(candidates, k)
            .into_iter()
            .map(|(position, distance)| SearchResult {
                position,
                distance,
                text: self.texts[position].clone(),
            })
            .collect())
    }

    fn text(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.texts.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.vectors.as_ref().map(|m| m.ncols())
    }
}
