//! CPU matrix-multiply baselines.

use hetbench_opencl::{GemmShape, Scalar};
use rayon::prelude::*;

/// Sequential triple-loop `C = A·B` reference.
///
/// # Panics
///
/// Panics if the operand lengths do not match `shape`.
pub fn sequential_gemm<T: Scalar>(shape: GemmShape, a: &[T], b: &[T]) -> Vec<T> {
    assert_eq!(a.len(), shape.rows * shape.inner);
    assert_eq!(b.len(), shape.inner * shape.cols);

    let mut c = vec![T::default(); shape.rows * shape.cols];
    for i in 0..shape.rows {
        for j in 0..shape.cols {
            let mut acc = T::default();
            for t in 0..shape.inner {
                acc += a[i * shape.inner + t] * b[t * shape.cols + j];
            }
            c[i * shape.cols + j] = acc;
        }
    }
    c
}

/// Row-partitioned parallel `C = A·B` (Rayon).
///
/// # Panics
///
/// Panics if the operand lengths do not match `shape`.
pub fn parallel_gemm<T: Scalar>(shape: GemmShape, a: &[T], b: &[T]) -> Vec<T> {
    assert_eq!(a.len(), shape.rows * shape.inner);
    assert_eq!(b.len(), shape.inner * shape.cols);

    let mut c = vec![T::default(); shape.rows * shape.cols];
    c.par_chunks_mut(shape.cols).enumerate().for_each(|(i, row)| {
        for (j, out) in row.iter_mut().enumerate() {
            let mut acc = T::default();
            for t in 0..shape.inner {
                acc += a[i * shape.inner + t] * b[t * shape.cols + j];
            }
            *out = acc;
        }
    });
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sequential_matches_hand_computed_product() {
        // [1 2; 3 4] · [5 6; 7 8] = [19 22; 43 50]
        let shape = GemmShape { rows: 2, inner: 2, cols: 2 };
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let b = vec![5.0f64, 6.0, 7.0, 8.0];
        assert_eq!(sequential_gemm(shape, &a, &b), vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let shape = GemmShape { rows: 48, inner: 32, cols: 16 };
        let mut rng = StdRng::seed_from_u64(5);
        let a: Vec<f64> = generate::matrix(&mut rng, shape.rows, shape.inner);
        let b: Vec<f64> = generate::matrix(&mut rng, shape.inner, shape.cols);
        assert_eq!(parallel_gemm(shape, &a, &b), sequential_gemm(shape, &a, &b));
    }
}
