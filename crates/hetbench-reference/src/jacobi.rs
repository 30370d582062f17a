//! Host-side Jacobi baseline and error metrics.

use hetbench_opencl::Scalar;

/// Plain host Jacobi iteration starting from the zero vector.
///
/// Returns `(x, iterations, converged)` with the same stopping rule as
/// the engine: stop when the accumulated `|delta|` drops to `eps` or the
/// cap is reached.
///
/// # Panics
///
/// Panics if `a` is not `n·n` elements or `b` is not `n`.
pub fn jacobi_reference<T: Scalar>(
    n: usize,
    a: &[T],
    b: &[T],
    eps: f64,
    max_iterations: u32,
) -> (Vec<T>, u32, bool) {
    assert_eq!(a.len(), n * n);
    assert_eq!(b.len(), n);

    let mut x = vec![T::default(); n];
    let mut x_next = vec![T::default(); n];
    let mut iterations = 0u32;
    loop {
        let mut acc = T::default();
        for i in 0..n {
            let mut sum = T::default();
            for j in 0..n {
                if j != i {
                    sum += a[i * n + j] * x[j];
                }
            }
            let next = (b[i] - sum) / a[i * n + i];
            acc += (next - x[i]).abs();
            x_next[i] = next;
        }
        std::mem::swap(&mut x, &mut x_next);

        iterations += 1;
        if acc.to_f64() <= eps {
            return (x, iterations, true);
        }
        if iterations >= max_iterations {
            return (x, iterations, false);
        }
    }
}

/// Relative ℓ₁ residual `‖A·x − b‖₁ / ‖b‖₁`, accumulated in `f64`.
///
/// # Panics
///
/// Panics if the operand lengths do not match `n`.
pub fn residual_l1<T: Scalar>(n: usize, a: &[T], x: &[T], b: &[T]) -> f64 {
    assert_eq!(a.len(), n * n);
    assert_eq!(x.len(), n);
    assert_eq!(b.len(), n);

    let mut numerator = 0.0f64;
    let mut denominator = 0.0f64;
    for i in 0..n {
        let mut row = 0.0f64;
        for j in 0..n {
            row += a[i * n + j].to_f64() * x[j].to_f64();
        }
        numerator += (row - b[i].to_f64()).abs();
        denominator += b[i].to_f64().abs();
    }
    numerator / denominator
}

/// Mean absolute element-wise difference, accumulated in `f64`.
///
/// # Panics
///
/// Panics if the slices differ in length or are empty.
#[allow(clippy::cast_precision_loss)]
pub fn mean_abs_error<T: Scalar>(lhs: &[T], rhs: &[T]) -> f64 {
    assert_eq!(lhs.len(), rhs.len());
    assert!(!lhs.is_empty());
    let total: f64 = lhs.iter().zip(rhs).map(|(l, r)| (l.to_f64() - r.to_f64()).abs()).sum();
    total / lhs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    // 3x3 dominant system with solution [1, 2, -1].
    fn sample_system() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let a = vec![10.0, 1.0, 2.0, 1.0, 12.0, 1.0, 2.0, 1.0, 20.0];
        let x_star = vec![1.0, 2.0, -1.0];
        let b: Vec<f64> = (0..3)
            .map(|i| (0..3).map(|j| a[i * 3 + j] * x_star[j]).sum())
            .collect();
        (a, b, x_star)
    }

    #[test]
    fn reference_converges_on_dominant_system() {
        let (a, b, x_star) = sample_system();
        let (x, iterations, converged) = jacobi_reference(3, &a, &b, 1e-12, 200);
        assert!(converged, "no convergence after {iterations} iterations");
        for (got, want) in x.iter().zip(&x_star) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn reference_reports_cap_out_as_non_converged() {
        let (a, b, _) = sample_system();
        let (_, iterations, converged) = jacobi_reference(3, &a, &b, 0.0, 2);
        assert!(!converged);
        assert_eq!(iterations, 2);
    }

    #[test]
    fn residual_is_tiny_for_exact_solution() {
        let (a, b, x_star) = sample_system();
        assert!(residual_l1(3, &a, &x_star, &b) < 1e-14);
    }

    #[test]
    fn mean_abs_error_on_known_pair() {
        let lhs = vec![1.0f32, 2.0, 3.0];
        let rhs = vec![1.0f32, 2.5, 2.5];
        assert!((mean_abs_error(&lhs, &rhs) - 1.0 / 3.0).abs() < 1e-7);
    }
}
