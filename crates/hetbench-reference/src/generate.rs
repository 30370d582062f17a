//! Seeded operand generation with an explicitly threaded RNG.

use hetbench_opencl::Scalar;
use rand::rngs::StdRng;
use rand::Rng;

/// A `rows×cols` row-major matrix with entries uniform in `[-100, 100)`.
pub fn matrix<T: Scalar>(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<T> {
    (0..rows * cols).map(|_| T::from_f64(rng.gen_range(-100.0..100.0))).collect()
}

/// An `n×n` weakly diagonally dominant matrix.
///
/// Off-diagonal entries are uniform in `[0, 50000/n)` and each diagonal
/// entry adds 100000 on top, so every row sum of off-diagonals stays below
/// the diagonal by construction.
#[allow(clippy::cast_precision_loss)]
pub fn dominant_matrix<T: Scalar>(rng: &mut StdRng, n: usize) -> Vec<T> {
    let mut a = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let off = f64::from(rng.gen_range(0..50_000u32)) / n as f64;
            a.push(T::from_f64(if i == j { off + 100_000.0 } else { off }));
        }
    }
    a
}

/// A length-`n` right-hand-side vector.
#[allow(clippy::cast_precision_loss)]
pub fn vector<T: Scalar>(rng: &mut StdRng, n: usize) -> Vec<T> {
    (0..n).map(|_| T::from_f64(f64::from(rng.gen::<u32>()) / n as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn identical_seed_yields_identical_operands() {
        let a: Vec<f32> = matrix(&mut StdRng::seed_from_u64(7), 32, 32);
        let b: Vec<f32> = matrix(&mut StdRng::seed_from_u64(7), 32, 32);
        assert_eq!(a, b);

        let x: Vec<f64> = vector(&mut StdRng::seed_from_u64(7), 64);
        let y: Vec<f64> = vector(&mut StdRng::seed_from_u64(7), 64);
        assert_eq!(x, y);
    }

    #[test]
    fn different_seeds_differ() {
        let a: Vec<f64> = matrix(&mut StdRng::seed_from_u64(1), 16, 16);
        let b: Vec<f64> = matrix(&mut StdRng::seed_from_u64(2), 16, 16);
        assert_ne!(a, b);
    }

    #[test]
    fn generated_dominant_matrix_is_dominant() {
        let a: Vec<f64> = dominant_matrix(&mut StdRng::seed_from_u64(3), 96);
        assert!(hetbench_opencl::is_diagonally_dominant(&a, 96));
    }

    #[test]
    fn matrix_entries_are_bounded() {
        let a: Vec<f64> = matrix(&mut StdRng::seed_from_u64(11), 20, 20);
        assert!(a.iter().all(|v| (-100.0..100.0).contains(v)));
    }
}
