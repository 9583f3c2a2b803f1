//! Shape-safe embedding front end
use super::{EmbeddingError, EmbeddingProvider};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Text embedded once to discover the backend's output dimension
const DIMENSION_PROBE: &str = "dimension probe";

/// Default number of texts sent to the backend per request
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Wraps an [`EmbeddingProvider`] and guarantees its output contract:
/// one vector of exactly `D` floats per input, in input order, and never an
/// error. Backend failures become zero vectors plus a warning.
pub struct Embedder {
    provider: Box<dyn EmbeddingProvider>,
    dimension: OnceLock<usize>,
    batch_size: usize,
}

impl Embedder {
    /// Create an embedder that discovers `D` with a single probe call on first use
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            dimension: OnceLock::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Fix `D` up front so no probe call is made
    pub fn with_dimension(self, dimension: usize) -> Self {
        if dimension == 0 {
            warn!("Ignoring zero embedding dimension; it will be auto-detected");
        } else if let Err(ignored) = self.dimension.set(dimension) {
            warn!(
                "Embedding dimension already fixed at {}, ignoring {}",
                self.dimension.get().copied().unwrap_or_default(),
                ignored
            );
        }
        self
    }

    /// Set the number of texts per backend request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Dimension `D` shared by every vector this embedder returns.
    ///
    /// Resolved at most once; later calls never touch the backend.
    pub fn dimension(&self) -> usize {
        *self.dimension.get_or_init(|| self.probe_dimension())
    }

    fn probe_dimension(&self) -> usize {
        let nominal = self.provider.nominal_dimension();

        match self.provider.embed_batch(&[DIMENSION_PROBE.to_string()]) {
            Ok(vectors) => match vectors.first() {
                Some(v) if !v.is_empty() => {
                    info!(
                        "Detected embedding dimension {} for model {}",
                        v.len(),
                        self.provider.model_name()
                    );
                    v.len()
                }
                _ => {
                    warn!(
                        "Dimension probe returned no usable vector; fixing dimension at nominal {} for model {}. \
                         If the model produces another size every embedding will be zero-filled; \
                         set embedding.dimension to avoid this",
                        nominal,
                        self.provider.model_name()
                    );
                    nominal
                }
            },
            Err(e) => {
                warn!(
                    "Dimension probe failed ({}); fixing dimension at nominal {} for model {}. \
                     If the model produces another size every embedding will be zero-filled; \
                     set embedding.dimension to avoid this",
                    e,
                    nominal,
                    self.provider.model_name()
                );
                nominal
            }
        }
    }

    /// Embed `texts`, returning exactly `texts.len()` vectors of length `D`.
    pub fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            debug!("embed called with an empty batch");
            return Vec::new();
        }

        let dimension = self.dimension();
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            match self.provider.embed_batch(chunk) {
                Ok(raw) => vectors.extend(conform(raw, chunk.len(), dimension)),
                Err(e) => {
                    warn!(
                        "Embedding error for {} texts, substituting zero vectors: {}",
                        chunk.len(),
                        e
                    );
                    vectors.extend(std::iter::repeat_with(|| vec![0.0; dimension]).take(chunk.len()));
                }
            }
        }

        vectors
    }

    /// Embed a single text
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        self.embed(&[text.to_string()])
            .pop()
            .unwrap_or_else(|| vec![0.0; self.dimension()])
    }
}

/// Force a backend result into `expected` vectors of length `dimension`.
///
/// Invalid entries are replaced in place, missing ones appended, surplus ones
/// dropped.
fn conform(raw: Vec<Vec<f32>>, expected: usize, dimension: usize) -> Vec<Vec<f32>> {
    let returned = raw.len();
    let mut invalid = 0;

    let mut vectors: Vec<Vec<f32>> = raw
        .into_iter()
        .take(expected)
        .map(|v| {
            if v.len() == dimension && v.iter().all(|x| x.is_finite()) {
                v
            } else {
                if v.len() != dimension {
                    debug!(
                        "{}",
                        EmbeddingError::DimensionMismatch {
                            expected: dimension,
                            actual: v.len(),
                        }
                    );
                }
                invalid += 1;
                vec![0.0; dimension]
            }
        })
        .collect();

    if returned != expected {
        warn!(
            "{}",
            EmbeddingError::CountMismatch {
                expected,
                actual: returned,
            }
        );
    }

    let missing = expected - vectors.len();
    vectors.extend(std::iter::repeat_with(|| vec![0.0; dimension]).take(missing));

    if invalid + missing > 0 {
        warn!(
            "Warning: {} embeddings missing or invalid, padded with zero vectors",
            invalid + missing
        );
    }

    vectors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a canned result and counts calls
    struct Canned {
        output: Box<dyn Fn(&[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> + Send + Sync>,
        calls: Arc<AtomicUsize>,
        nominal: usize,
    }

    impl EmbeddingProvider for Canned {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.output)(texts)
        }

        fn nominal_dimension(&self) -> usize {
            self.nominal
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn canned<F>(f: F) -> (Embedder, Arc<AtomicUsize>)
    where
        F: Fn(&[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> + Send + Sync + 'static,
    {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Canned {
            output: Box::new(f),
            calls: calls.clone(),
            nominal: 8,
        };
        (Embedder::new(Box::new(provider)), calls)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_probe_runs_once() {
        let (embedder, calls) = canned(|t| Ok(vec![vec![1.0; 4]; t.len()]));

        assert_eq!(embedder.dimension(), 4);
        assert_eq!(embedder.dimension(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        embedder.embed(&texts(&["a"]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explicit_dimension_skips_probe() {
        let (embedder, calls) = canned(|t| Ok(vec![vec![1.0; 3]; t.len()]));
        let embedder = embedder.with_dimension(3);

        let out = embedder.embed(&texts(&["a", "b"]));
        assert_eq!(out.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_explicit_dimension_wins() {
        let (embedder, calls) = canned(|t| Ok(vec![vec![1.0; 3]; t.len()]));
        let embedder = embedder.with_dimension(3).with_dimension(7);

        assert_eq!(embedder.dimension(), 3);
        assert_eq!(embedder.embed(&texts(&["a"])), vec![vec![1.0; 3]]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_probe_uses_nominal_dimension() {
        let (embedder, _) = canned(|_| Err(EmbeddingError::GenerationError("down".into())));
        assert_eq!(embedder.dimension(), 8);
    }

    #[test]
    fn test_backend_failure_yields_zero_vectors() {
        let (embedder, _) = canned(|_| Err(EmbeddingError::GenerationError("down".into())));
        let embedder = embedder.with_dimension(5);

        let out = embedder.embed(&texts(&["a", "b", "c"]));
        assert_eq!(out, vec![vec![0.0; 5]; 3]);
    }

    #[test]
    fn test_invalid_entries_replaced_in_place() {
        let (embedder, _) = canned(|_| {
            Ok(vec![
                vec![1.0, 1.0],
                vec![9.0],
                vec![2.0, f32::NAN],
                vec![3.0, 3.0],
            ])
        });
        let embedder = embedder.with_dimension(2);

        let out = embedder.embed(&texts(&["a", "b", "c", "d"]));
        assert_eq!(
            out,
            vec![vec![1.0, 1.0], vec![0.0, 0.0], vec![0.0, 0.0], vec![3.0, 3.0]]
        );
    }

    #[test]
    fn test_short_result_is_padded() {
        let (embedder, _) = canned(|_| Ok(vec![vec![1.0, 2.0]]));
        let embedder = embedder.with_dimension(2);

        let out = embedder.embed(&texts(&["a", "b", "c"]));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], vec![1.0, 2.0]);
        assert_eq!(out[2], vec![0.0, 0.0]);
    }

    #[test]
    fn test_surplus_is_dropped() {
        let (embedder, _) = canned(|_| Ok(vec![vec![1.0]; 5]));
        let embedder = embedder.with_dimension(1);
        assert_eq!(embedder.embed(&texts(&["a", "b"])).len(), 2);
    }

    #[test]
    fn test_chunks_degrade_independently() {
        let (embedder, calls) = canned(|t| {
            if t.iter().any(|s| s == "bad") {
                Err(EmbeddingError::GenerationError("rejected".into()))
            } else {
                Ok(vec![vec![1.0, 1.0]; t.len()])
            }
        });
        let embedder = embedder.with_dimension(2).with_batch_size(2);

        let out = embedder.embed(&texts(&["a", "b", "bad", "c", "d"]));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], vec![1.0, 1.0]);
        assert_eq!(out[2], vec![0.0, 0.0]);
        assert_eq!(out[3], vec![0.0, 0.0]);
        assert_eq!(out[4], vec![1.0, 1.0]);
    }

    #[test]
    fn test_empty_batch_makes_no_calls() {
        let (embedder, calls) = canned(|t| Ok(vec![vec![1.0]; t.len()]));
        assert!(embedder.embed(&[]).is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
