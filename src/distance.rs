//! The injected distance function and its built-in implementations.
//!
//! Grounded on `similarity/src/distance.rs`: SIMD dispatch via `pulp`,
//! with a scalar tail loop for the remainder. The graph builder never
//! picks a metric itself — per §6 it takes any `DistanceFn`, so ordering
//! (smaller is nearer) is the one contract every implementation here
//! upholds, cosine and dot product included.

use pulp::{Arch, Simd, WithSimd};

/// A caller-supplied distance metric. Smaller values mean "nearer",
/// which the graph builder relies on for every comparison it makes.
pub trait DistanceFn: Send + Sync + Copy {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

struct SquaredSum<'a> {
    first: &'a [f32],
    second: &'a [f32],
}

impl WithSimd for SquaredSum<'_> {
    type Output = f32;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let (first_head, first_tail) = S::as_simd_f32s(self.first);
        let (second_head, second_tail) = S::as_simd_f32s(self.second);

        let mut sum_of_squares = simd.splat_f32s(0.0);
        for (&a, &b) in first_head.iter().zip(second_head) {
            let diff = simd.sub_f32s(a, b);
            sum_of_squares = simd.mul_add_f32s(diff, diff, sum_of_squares);
        }
        let mut total = simd.reduce_sum_f32s(sum_of_squares);
        total += first_tail
            .iter()
            .zip(second_tail)
            .map(|(&x, &y)| {
                let diff = x - y;
                diff * diff
            })
            .sum::<f32>();
        total
    }
}

/// `d(p, q) = Σ (p_i - q_i)²`. The metric `graph_builder` reaches for by
/// default: cheaper than [`Euclidean`] since ordering by squared distance
/// gives the same neighbor selection without the `sqrt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredEuclidean;

impl DistanceFn for SquaredEuclidean {
    #[tracing::instrument(skip_all)]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vectors must share a dimension");
        Arch::new().dispatch(SquaredSum {
            first: a,
            second: b,
        })
    }
}

/// `d(p, q) = sqrt(Σ (p_i - q_i)²)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceFn for Euclidean {
    #[tracing::instrument(skip_all)]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vectors must share a dimension");
        Arch::new()
            .dispatch(SquaredSum {
                first: a,
                second: b,
            })
            .sqrt()
    }
}

struct DotProductOp<'a> {
    first: &'a [f32],
    second: &'a [f32],
}

impl WithSimd for DotProductOp<'_> {
    type Output = f32;

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let (first_head, first_tail) = S::as_simd_f32s(self.first);
        let (second_head, second_tail) = S::as_simd_f32s(self.second);

        let mut sum = simd.splat_f32s(0.0);
        for (&a, &b) in first_head.iter().zip(second_head) {
            sum = simd.mul_add_f32s(a, b, sum);
        }
        let mut dot = simd.reduce_sum_f32s(sum);
        dot += first_tail
            .iter()
            .zip(second_tail)
            .map(|(&x, &y)| x * y)
            .sum::<f32>();
        dot
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    Arch::new().dispatch(DotProductOp {
        first: a,
        second: b,
    })
}

fn magnitude(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// `d(p, q) = 1 - cos(p, q)`, so that nearer vectors (more similar
/// direction) still sort first. Graph distances must be minimized, so
/// raw cosine *similarity* (which is maximized for near vectors) is
/// unusable here without the flip.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineDistance;

impl DistanceFn for CosineDistance {
    #[tracing::instrument(skip_all)]
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len(), "vectors must share a dimension");
        let denom = magnitude(a) * magnitude(b);
        if denom == 0.0 {
            return 1.0;
        }
        1.0 - (dot_product(a, b) / denom)
    }
}
