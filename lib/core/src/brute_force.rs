use crate::index::{into_hits, RankKey, RowMatrix};
use crate::simd::dot_product_simd;
use crate::{IndexBackend, Result, SearchHit, Vector, VectorIndex};

/// Fallback index: one dense matrix, a full score pass and a partial sort.
/// Same ranking as [`crate::FlatIndex`], single-threaded.
pub struct BruteForceIndex {
    matrix: RowMatrix,
}

impl BruteForceIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            matrix: RowMatrix::new(dim),
        }
    }
}

impl VectorIndex for BruteForceIndex {
    fn backend(&self) -> IndexBackend {
        IndexBackend::BruteForce
    }

    fn dim(&self) -> usize {
        self.matrix.dim()
    }

    fn len(&self) -> usize {
        self.matrix.len()
    }

    fn add(&mut self, vectors: &[Vector]) -> Result<()> {
        self.matrix.append(vectors)
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        self.matrix.check_query(query)?;
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let q = query.as_slice();
        let mut scores: Vec<RankKey> = self
            .matrix
            .rows()
            .enumerate()
            .map(|(row, v)| RankKey::new(row, dot_product_simd(v, q)))
            .collect();

        if k < scores.len() {
            scores.select_nth_unstable_by(k - 1, |a, b| b.cmp(a));
            scores.truncate(k);
        }

        Ok(into_hits(scores, k))
    }

    fn row(&self, row: usize) -> Option<&[f32]> {
        self.matrix.row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brute_force_top_k() {
        let mut index = BruteForceIndex::new(2);
        index
            .add(&[
                Vector::new(vec![-1.0, 0.0]),
                Vector::new(vec![0.8, 0.6]),
                Vector::new(vec![1.0, 0.0]),
                Vector::new(vec![0.0, 1.0]),
            ])
            .unwrap();

        let hits = index.search(&Vector::new(vec![1.0, 0.0]), 3).unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(order, vec![2, 1, 3]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_k_larger_than_index_is_clamped() {
        let mut index = BruteForceIndex::new(2);
        index.add(&[Vector::new(vec![1.0, 0.0])]).unwrap();
        let hits = index.search(&Vector::new(vec![1.0, 0.0]), 50).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
