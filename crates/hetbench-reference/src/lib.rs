//! Correctness baselines for the partitioned OpenCL engine.
//!
//! Everything the engine treats as an external collaborator lives here:
//! seeded operand generation, sequential and thread-parallel reference
//! implementations, and the error metrics the benchmarks check against.
//! The generators take an explicit `StdRng` so identical seeds produce
//! identical operands, iteration counts, and results.

pub mod gemm;
pub mod generate;
pub mod jacobi;

pub use gemm::{parallel_gemm, sequential_gemm};
pub use generate::{dominant_matrix, matrix, vector};
pub use jacobi::{jacobi_reference, mean_abs_error, residual_l1};
