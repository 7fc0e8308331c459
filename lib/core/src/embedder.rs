//! Text → vector boundary.
//!
//! The model behind [`Embedder`] is supplied by the caller. [`EmbedWorkers`]
//! wraps any embedder with the guarantees the engine relies on: one unit
//! vector per text in input order, a bounded wait, and an all-or-nothing
//! result.

use crate::{EmbeddingError, Error, Result, Vector};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Batch text embedder.
///
/// Implementations return one vector of length [`Embedder::dim`] per text,
/// in input order. Vectors need not be normalized.
pub trait Embedder: Send + Sync + 'static {
    fn dim(&self) -> usize;

    fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vector>, EmbeddingError>;
}

/// Runs embedder calls on worker threads with a bounded wait.
///
/// A worker whose caller timed out keeps running until the embedder
/// returns and holds its slot until then. At most `limit` workers exist at
/// once; further calls fail fast with [`EmbeddingError::Saturated`].
#[derive(Debug, Clone)]
pub struct EmbedWorkers {
    in_flight: Arc<AtomicUsize>,
    limit: usize,
}

/// Released when the worker thread ends, not when its caller gives up
struct Slot(Arc<AtomicUsize>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl EmbedWorkers {
    pub fn new(limit: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            limit: limit.max(1),
        }
    }

    /// Worker threads currently alive
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Option<Slot> {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.limit).then_some(n + 1))
            .ok()
            .map(|_| Slot(Arc::clone(&self.in_flight)))
    }

    /// Embed `texts`, waiting at most `timeout`.
    ///
    /// On success every vector has been checked for dimension and scaled to
    /// unit length; a text that embeds to a (near-)zero vector fails the
    /// whole batch with [`EmbeddingError::DegenerateText`].
    pub fn embed(&self, embedder: &Arc<dyn Embedder>, texts: Vec<String>, timeout: Duration) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let slot = self.acquire().ok_or_else(|| {
            warn!(limit = self.limit, "all embedder workers are busy");
            EmbeddingError::Saturated { limit: self.limit }
        })?;

        let expected = texts.len();
        let started = Instant::now();
        let (tx, rx) = mpsc::sync_channel(1);
        let worker = Arc::clone(embedder);

        std::thread::Builder::new()
            .name("jobmatch-embed".into())
            .spawn(move || {
                let outcome = worker.embed(&texts);
                drop(slot);
                // receiver is gone after a timeout
                let _ = tx.send(outcome);
            })?;

        let vectors = match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(texts = expected, ?timeout, "embedder timed out");
                return Err(EmbeddingError::Timeout(timeout).into());
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(EmbeddingError::Failed("embedder worker panicked".into()).into());
            }
        };

        let vectors = normalize_batch(vectors, expected, embedder.dim())?;
        debug!(texts = expected, elapsed_ms = started.elapsed().as_millis() as u64, "embedded batch");
        Ok(vectors)
    }
}

fn normalize_batch(vectors: Vec<Vector>, expected: usize, dim: usize) -> Result<Vec<Vector>> {
    if vectors.len() != expected {
        return Err(Error::Embedding(EmbeddingError::CountMismatch {
            expected,
            actual: vectors.len(),
        }));
    }

    vectors
        .into_iter()
        .enumerate()
        .map(|(position, mut v)| -> Result<Vector> {
            if v.dim() != dim {
                return Err(EmbeddingError::Dimension {
                    expected: dim,
                    actual: v.dim(),
                }
                .into());
            }
            if !v.normalize() {
                return Err(EmbeddingError::DegenerateText { position }.into());
            }
            Ok(v)
        })
        .collect()
}

/// Default embedding width
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Model-free embedder based on feature hashing.
///
/// Lower-cased character trigrams add 1.0 and whole words add 2.0 to the
/// bucket their hash selects. Texts sharing vocabulary land close together,
/// which is enough to run the service without an external model. Blank
/// text maps to the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket<T: Hash + ?Sized>(&self, token: &T) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vector {
        let mut data = vec![0.0f32; self.dim];
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return Vector::new(data);
        }

        let padded: Vec<char> = format!("  {normalized}  ").chars().collect();
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            data[self.bucket(trigram.as_str())] += 1.0;
        }
        for word in normalized.split_whitespace() {
            data[self.bucket(word)] += 2.0;
        }

        Vector::new(data)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vector>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
