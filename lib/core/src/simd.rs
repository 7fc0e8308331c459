// Dot-product kernels for inner-product search.
// The kernel is picked once per process so every index backend scores a row
// with exactly the same instruction sequence and therefore the same bits.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use std::sync::OnceLock;

// Below these lengths the scalar loop wins
#[cfg(target_arch = "x86_64")]
const MIN_DIM_AVX2: usize = 32;

#[cfg(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64"))]
const MIN_DIM_SIMD: usize = 16;

/// Instruction set used by [`dot_product_simd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotKernel {
    Avx2,
    Sse,
    Neon,
    Scalar,
}

impl DotKernel {
    /// Detect the best kernel for the running CPU (cached).
    pub fn detect() -> Self {
        static KERNEL: OnceLock<DotKernel> = OnceLock::new();
        *KERNEL.get_or_init(Self::select)
    }

    fn select() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
                return DotKernel::Avx2;
            }
        }

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            if is_x86_feature_detected!("sse") {
                return DotKernel::Sse;
            }
        }

        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return DotKernel::Neon;
            }
        }

        DotKernel::Scalar
    }

    pub fn is_vectorized(self) -> bool {
        self != DotKernel::Scalar
    }

    pub fn name(self) -> &'static str {
        match self {
            DotKernel::Avx2 => "avx2",
            DotKernel::Sse => "sse",
            DotKernel::Neon => "neon",
            DotKernel::Scalar => "scalar",
        }
    }
}

/// Inner product of two equal-length slices. Mismatched lengths score 0.
#[inline]
pub fn dot_product_simd(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    match DotKernel::detect() {
        #[cfg(target_arch = "x86_64")]
        DotKernel::Avx2 if a.len() >= MIN_DIM_AVX2 => unsafe { dot_avx2(a, b) },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        DotKernel::Avx2 | DotKernel::Sse if a.len() >= MIN_DIM_SIMD => unsafe { dot_sse(a, b) },
        #[cfg(target_arch = "aarch64")]
        DotKernel::Neon if a.len() >= MIN_DIM_SIMD => unsafe { dot_neon(a, b) },
        _ => dot_scalar(a, b),
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let (pa, pb) = (a.as_ptr(), b.as_ptr());
    let mut acc0 = _mm256_setzero_ps();
    let mut acc1 = _mm256_setzero_ps();
    let mut i = 0;

    while i + 16 <= n {
        acc0 = _mm256_fmadd_ps(_mm256_loadu_ps(pa.add(i)), _mm256_loadu_ps(pb.add(i)), acc0);
        acc1 = _mm256_fmadd_ps(
            _mm256_loadu_ps(pa.add(i + 8)),
            _mm256_loadu_ps(pb.add(i + 8)),
            acc1,
        );
        i += 16;
    }

    let acc = _mm256_add_ps(acc0, acc1);
    let mut lanes = _mm_add_ps(_mm256_extractf128_ps(acc, 1), _mm256_castps256_ps128(acc));
    lanes = _mm_hadd_ps(lanes, lanes);
    lanes = _mm_hadd_ps(lanes, lanes);

    let mut sum = _mm_cvtss_f32(lanes);
    for j in i..n {
        sum += a[j] * b[j];
    }
    sum
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse")]
unsafe fn dot_sse(a: &[f32], b: &[f32]) -> f32 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    let n = a.len();
    let (pa, pb) = (a.as_ptr(), b.as_ptr());
    let mut acc = _mm_setzero_ps();
    let mut i = 0;

    while i + 4 <= n {
        acc = _mm_add_ps(acc, _mm_mul_ps(_mm_loadu_ps(pa.add(i)), _mm_loadu_ps(pb.add(i))));
        i += 4;
    }

    let swapped = _mm_shuffle_ps(acc, acc, 0b10_11_00_01);
    acc = _mm_add_ps(acc, swapped);
    acc = _mm_add_ss(acc, _mm_movehl_ps(acc, acc));

    let mut sum = _mm_cvtss_f32(acc);
    for j in i..n {
        sum += a[j] * b[j];
    }
    sum
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn dot_neon(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len();
    let (pa, pb) = (a.as_ptr(), b.as_ptr());
    let mut acc0 = vdupq_n_f32(0.0);
    let mut acc1 = vdupq_n_f32(0.0);
    let mut i = 0;

    while i + 8 <= n {
        acc0 = vfmaq_f32(acc0, vld1q_f32(pa.add(i)), vld1q_f32(pb.add(i)));
        acc1 = vfmaq_f32(acc1, vld1q_f32(pa.add(i + 4)), vld1q_f32(pb.add(i + 4)));
        i += 8;
    }
    if i + 4 <= n {
        acc0 = vfmaq_f32(acc0, vld1q_f32(pa.add(i)), vld1q_f32(pb.add(i)));
        i += 4;
    }

    let mut sum = vaddvq_f32(vaddq_f32(acc0, acc1));
    for j in i..n {
        sum += a[j] * b[j];
    }
    sum
}

#[inline]
fn dot_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut even = 0.0f32;
    let mut odd = 0.0f32;

    let pairs_a = a.chunks_exact(2);
    let tail = pairs_a.remainder();
    for (x, y) in pairs_a.zip(b.chunks_exact(2)) {
        even += x[0] * y[0];
        odd += x[1] * y[1];
    }
    if let Some(last) = tail.first() {
        even += last * b[a.len() - 1];
    }

    even + odd
}

/// Euclidean length.
#[inline]
pub fn norm_simd(v: &[f32]) -> f32 {
    dot_product_simd(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_matches_reference_across_lengths() {
        for len in [0, 1, 3, 7, 16, 31, 33, 64, 384] {
            let a: Vec<f32> = (0..len).map(|i| (i as f32 * 0.37).sin()).collect();
            let b: Vec<f32> = (0..len).map(|i| (i as f32 * 0.11).cos()).collect();
            let got = dot_product_simd(&a, &b);
            let want = reference_dot(&a, &b);
            assert!((got - want).abs() < 1e-3, "len {len}: {got} vs {want}");
        }
    }

    #[test]
    fn test_mismatched_lengths_score_zero() {
        assert_eq!(dot_product_simd(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_norm() {
        assert!((norm_simd(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_kernel_detection_is_stable() {
        assert_eq!(DotKernel::detect(), DotKernel::detect());
    }
}
