use serde::{Deserialize, Serialize};

/// Dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Inner product; equals cosine similarity when both sides are unit length
    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        crate::simd::dot_product_simd(&self.data, &other.data)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        crate::simd::norm_simd(&self.data)
    }

    /// Scale to unit length. Returns `false` and leaves the vector untouched
    /// when its norm is at or below `f32::EPSILON`.
    #[inline]
    pub fn normalize(&mut self) -> bool {
        let norm = self.norm();
        if !norm.is_finite() || norm <= f32::EPSILON {
            return false;
        }
        let inv_norm = 1.0 / norm;
        for x in &mut self.data {
            *x *= inv_norm;
        }
        true
    }

    /// Little-endian `f32` bytes, the at-rest format of an embedding
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|x| x.to_le_bytes()).collect()
    }

    /// Inverse of [`Vector::to_le_bytes`]; `None` when the length is not a
    /// multiple of four.
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Some(Self { data })
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_of_unit_vectors() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.dot(&v2) - 1.0).abs() < 1e-6);

        let v3 = Vector::new(vec![0.0, 1.0]);
        assert!(v1.dot(&v3).abs() < 1e-6);
    }

    #[test]
    fn test_normalize() {
        let mut v = Vector::new(vec![3.0, 4.0]);
        assert!(v.normalize());
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_is_refused() {
        let mut v = Vector::new(vec![0.0, 0.0, 0.0]);
        assert!(!v.normalize());
        assert_eq!(v.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_le_bytes() {
        let v = Vector::new(vec![0.25, -1.5, 3.0]);
        let bytes = v.to_le_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(Vector::from_le_bytes(&bytes), Some(v));
        assert_eq!(Vector::from_le_bytes(&bytes[..5]), None);
    }
}
