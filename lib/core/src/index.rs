//! Inner-product index over job embeddings.
//!
//! Two backends implement [`VectorIndex`]:
//!
//! - [`FlatIndex`] scores rows in parallel chunks and keeps a bounded heap per
//!   chunk.
//! - [`BruteForceIndex`] scores every row sequentially and partial-sorts.
//!
//! Both score with the same dot-product kernel and rank by the same total
//! order (score descending, then row ascending), so they return identical
//! results for identical inputs.

use crate::simd::DotKernel;
use crate::{BruteForceIndex, Error, FlatIndex, Result, Vector};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

/// A single search result: catalog row and raw inner product
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub row: usize,
    pub score: f32,
}

/// Index contract shared by both backends.
pub trait VectorIndex: Send + Sync {
    /// Concrete backend (never [`IndexBackend::Auto`])
    fn backend(&self) -> IndexBackend;

    fn dim(&self) -> usize;

    /// Number of rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append rows in order. All vectors are checked before any is stored;
    /// on error the index is unchanged.
    fn add(&mut self, vectors: &[Vector]) -> Result<()>;

    /// Top `k` rows by inner product with `query`. `k` is clamped to
    /// [`VectorIndex::len`]; an empty index yields an empty result.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>>;

    /// Stored vector for a row
    fn row(&self, row: usize) -> Option<&[f32]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBackend {
    /// Decide from CPU capabilities at startup
    #[default]
    Auto,
    Flat,
    BruteForce,
}

impl IndexBackend {
    /// Turn `Auto` into a concrete backend for this machine.
    pub fn resolve(self) -> IndexBackend {
        match self {
            IndexBackend::Auto => {
                if DotKernel::detect().is_vectorized() || rayon::current_num_threads() > 1 {
                    IndexBackend::Flat
                } else {
                    IndexBackend::BruteForce
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for IndexBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexBackend::Auto => "auto",
            IndexBackend::Flat => "flat",
            IndexBackend::BruteForce => "brute_force",
        };
        f.write_str(name)
    }
}

impl FromStr for IndexBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(IndexBackend::Auto),
            "flat" | "accelerated" => Ok(IndexBackend::Flat),
            "brute_force" | "brute-force" | "bruteforce" => Ok(IndexBackend::BruteForce),
            other => Err(Error::InvalidConfig(format!("unknown index backend: {other}"))),
        }
    }
}

/// Build an empty index of the requested backend.
pub fn create_index(backend: IndexBackend, dim: usize) -> Result<Box<dyn VectorIndex>> {
    if dim == 0 {
        return Err(Error::InvalidConfig("index dimension must be positive".into()));
    }
    Ok(match backend.resolve() {
        IndexBackend::BruteForce => Box::new(BruteForceIndex::new(dim)),
        _ => Box::new(FlatIndex::new(dim)),
    })
}

/// Ranking key. `a > b` means `a` ranks ahead of `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RankKey {
    score: OrderedFloat<f32>,
    row: Reverse<usize>,
}

impl RankKey {
    #[inline]
    pub(crate) fn new(row: usize, score: f32) -> Self {
        Self {
            score: OrderedFloat(score),
            row: Reverse(row),
        }
    }

    #[inline]
    pub(crate) fn hit(self) -> SearchHit {
        SearchHit {
            row: self.row.0,
            score: self.score.0,
        }
    }
}

/// Sort best-first and convert
pub(crate) fn into_hits(mut keys: Vec<RankKey>, k: usize) -> Vec<SearchHit> {
    keys.sort_unstable_by(|a, b| b.cmp(a));
    keys.truncate(k);
    keys.into_iter().map(RankKey::hit).collect()
}

/// Row-major matrix of fixed-width rows
#[derive(Debug, Clone)]
pub(crate) struct RowMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl RowMatrix {
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    #[inline]
    pub(crate) fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub(crate) fn row(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }

    pub(crate) fn check_query(&self, query: &Vector) -> Result<()> {
        if query.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.dim(),
            });
        }
        Ok(())
    }

    pub(crate) fn append(&mut self, vectors: &[Vector]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.dim() != self.dim) {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: bad.dim(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v.as_slice());
        }
        Ok(())
    }
}
