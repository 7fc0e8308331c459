use crate::index::{into_hits, RankKey, RowMatrix};
use crate::simd::dot_product_simd;
use crate::{IndexBackend, Result, SearchHit, Vector, VectorIndex};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Rows scored per rayon task
const CHUNK_ROWS: usize = 1024;

/// Exact inner-product index over contiguous storage.
///
/// Search splits the matrix into chunks of [`CHUNK_ROWS`], scores each chunk
/// on the rayon pool with the SIMD kernel and keeps only the `k` best rows
/// per chunk in a min-heap. The partial winners are merged and sorted.
pub struct FlatIndex {
    matrix: RowMatrix,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            matrix: RowMatrix::new(dim),
        }
    }

    fn top_k_in_chunk(chunk: &[f32], base_row: usize, dim: usize, query: &[f32], k: usize) -> Vec<RankKey> {
        let mut heap: BinaryHeap<Reverse<RankKey>> = BinaryHeap::with_capacity(k + 1);
        for (offset, row) in chunk.chunks_exact(dim).enumerate() {
            let key = RankKey::new(base_row + offset, dot_product_simd(row, query));
            if heap.len() < k {
                heap.push(Reverse(key));
            } else if heap.peek().is_some_and(|Reverse(worst)| key > *worst) {
                heap.pop();
                heap.push(Reverse(key));
            }
        }
        heap.into_iter().map(|Reverse(key)| key).collect()
    }
}

impl VectorIndex for FlatIndex {
    fn backend(&self) -> IndexBackend {
        IndexBackend::Flat
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

        let dim = self.matrix.dim();
        let q = query.as_slice();
        let candidates = self
            .matrix
            .data()
            .par_chunks(dim * CHUNK_ROWS)
            .enumerate()
            .map(|(chunk_idx, chunk)| Self::top_k_in_chunk(chunk, chunk_idx * CHUNK_ROWS, dim, q, k))
            .reduce(Vec::new, |mut acc, part| {
                acc.extend(part);
                acc
            });

        Ok(into_hits(candidates, k))
    }

    fn row(&self, row: usize) -> Option<&[f32]> {
        self.matrix.row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_search_orders_by_inner_product() {
        let mut index = FlatIndex::new(2);
        index
            .add(&[
                Vector::new(vec![0.0, 1.0]),
                Vector::new(vec![1.0, 0.0]),
                Vector::new(vec![0.6, 0.8]),
            ])
            .unwrap();

        let hits = index.search(&Vector::new(vec![1.0, 0.0]), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].row, 1);
        assert_eq!(hits[1].row, 2);
        assert!((hits[1].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_flat_search_spans_chunks() {
        let dim = 4;
        let mut index = FlatIndex::new(dim);
        let rows: Vec<Vector> = (0..CHUNK_ROWS * 2 + 17)
            .map(|i| Vector::new(vec![i as f32, 0.0, 0.0, 0.0]))
            .collect();
        index.add(&rows).unwrap();

        let hits = index.search(&Vector::new(vec![1.0, 0.0, 0.0, 0.0]), 3).unwrap();
        let last = rows.len() - 1;
        let order: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(order, vec![last, last - 1, last - 2]);
    }

    #[test]
    fn test_incremental_add_keeps_row_order() {
        let mut index = FlatIndex::new(2);
        index.add(&[Vector::new(vec![1.0, 0.0])]).unwrap();
        index.add(&[Vector::new(vec![0.0, 1.0])]).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.row(1), Some(&[0.0, 1.0][..]));
        assert_eq!(index.row(2), None);
    }
}
