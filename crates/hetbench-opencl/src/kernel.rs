//! Kernel sources and the precision they come in.
//!
//! Each workload ships as OpenCL C source compiled at runtime via
//! `clCreateProgramWithSource`, one entry-point per numeric precision.
//! [`Precision`] is the tagged variant carrying the source/entry-point
//! pair; callers with their own kernels can hand the dispatchers a custom
//! [`KernelSource`] instead.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// Numeric precision of a kernel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    SinglePrecision,
    DoublePrecision,
}

impl Precision {
    /// The matrix-multiply kernel for this precision.
    #[must_use]
    pub fn gemm_kernel(self) -> KernelSource {
        match self {
            Self::SinglePrecision => KernelSource::new("gemm_f32", GEMM_F32_SOURCE),
            Self::DoublePrecision => KernelSource::new("gemm_f64", GEMM_F64_SOURCE),
        }
    }

    /// The Jacobi update kernel for this precision.
    #[must_use]
    pub fn jacobi_kernel(self) -> KernelSource {
        match self {
            Self::SinglePrecision => KernelSource::new("jacobi_f32", JACOBI_F32_SOURCE),
            Self::DoublePrecision => KernelSource::new("jacobi_f64", JACOBI_F64_SOURCE),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePrecision => write!(f, "single"),
            Self::DoublePrecision => write!(f, "double"),
        }
    }
}

/// A kernel source blob paired with its entry-point name.
///
/// Compilation is treated as an opaque pass/fail capability; the engine
/// never interprets the kernel arithmetic.
#[derive(Debug, Clone)]
pub struct KernelSource {
    pub entry_point: Cow<'static, str>,
    pub source: Cow<'static, str>,
}

impl KernelSource {
    #[must_use]
    pub fn new(
        entry_point: impl Into<Cow<'static, str>>,
        source: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self { entry_point: entry_point.into(), source: source.into() }
    }
}

/// Host-side element type the engine can dispatch (`f32` or `f64`).
///
/// Ties each element type to its [`Precision`] and provides the few
/// host-side numeric operations the engine needs for delta accumulation
/// and result checks.
pub trait Scalar:
    Copy
    + Default
    + PartialOrd
    + Send
    + Sync
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + 'static
{
    const PRECISION: Precision;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn abs(self) -> Self;
}

impl Scalar for f32 {
    const PRECISION: Precision = Precision::SinglePrecision;

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Scalar for f64 {
    const PRECISION: Precision = Precision::DoublePrecision;

    fn from_f64(value: f64) -> Self {
        value
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }
}

// Embedded kernel sources.

/// Row-sliced GEMM, single precision.
///
/// Launched over a 2-D range `{cols, slice_rows}` in 16×16 work-groups.
/// `a` holds only this device's row slice; `rows` bounds the slice.
pub const GEMM_F32_SOURCE: &str = r#"
__kernel void gemm_f32(
    const int rows,
    const int inner,
    const int cols,
    __global const float* a,
    __global const float* b,
    __global float* c)
{
    const int col = get_global_id(0);
    const int row = get_global_id(1);
    if (row >= rows || col >= cols) return;

    float acc = 0.0f;
    for (int t = 0; t < inner; ++t) {
        acc += a[row * inner + t] * b[t * cols + col];
    }
    c[row * cols + col] = acc;
}
"#;

/// Row-sliced GEMM, double precision.
pub const GEMM_F64_SOURCE: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void gemm_f64(
    const int rows,
    const int inner,
    const int cols,
    __global const double* a,
    __global const double* b,
    __global double* c)
{
    const int col = get_global_id(0);
    const int row = get_global_id(1);
    if (row >= rows || col >= cols) return;

    double acc = 0.0;
    for (int t = 0; t < inner; ++t) {
        acc += a[row * inner + t] * b[t * cols + col];
    }
    c[row * cols + col] = acc;
}
"#;

/// Jacobi update for one device's row slice, single precision.
///
/// Launched over a 1-D range `{slice_rows}` in work-groups of 32. `a`
/// holds only the slice (row offset `stride`), while `b`, `x0`, `x1` and
/// `delta` are full length-`n` buffers: every row update reads the entire
/// previous iterate, which is why the host broadcasts the assembled `x0`
/// to both devices each round.
pub const JACOBI_F32_SOURCE: &str = r#"
__kernel void jacobi_f32(
    __global const float* a,
    __global const float* b,
    __global const float* x0,
    __global float* x1,
    __global float* delta,
    const int n,
    const int stride)
{
    const int slice_row = get_global_id(0);
    const int row = stride + slice_row;
    if (row >= n) return;

    float acc = 0.0f;
    for (int j = 0; j < n; ++j) {
        acc += a[slice_row * n + j] * x0[j];
    }
    const float diag = a[slice_row * n + row];
    acc -= diag * x0[row];

    const float next = (b[row] - acc) / diag;
    x1[row] = next;
    delta[row] = next - x0[row];
}
"#;

/// Jacobi update for one device's row slice, double precision.
pub const JACOBI_F64_SOURCE: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void jacobi_f64(
    __global const double* a,
    __global const double* b,
    __global const double* x0,
    __global double* x1,
    __global double* delta,
    const int n,
    const int stride)
{
    const int slice_row = get_global_id(0);
    const int row = stride + slice_row;
    if (row >= n) return;

    double acc = 0.0;
    for (int j = 0; j < n; ++j) {
        acc += a[slice_row * n + j] * x0[j];
    }
    const double diag = a[slice_row * n + row];
    acc -= diag * x0[row];

    const double next = (b[row] - acc) / diag;
    x1[row] = next;
    delta[row] = next - x0[row];
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_precision_pairs_source_with_matching_entry_point() {
        for precision in [Precision::SinglePrecision, Precision::DoublePrecision] {
            for kernel in [precision.gemm_kernel(), precision.jacobi_kernel()] {
                assert!(!kernel.source.is_empty());
                assert!(
                    kernel.source.contains(&format!("__kernel void {}", kernel.entry_point)),
                    "entry point '{}' not found in source",
                    kernel.entry_point
                );
            }
        }
    }

    #[test]
    fn double_kernels_enable_fp64() {
        for kernel in [
            Precision::DoublePrecision.gemm_kernel(),
            Precision::DoublePrecision.jacobi_kernel(),
        ] {
            assert!(kernel.source.contains("cl_khr_fp64"));
        }
    }

    #[test]
    fn scalar_roundtrip() {
        assert_eq!(f32::from_f64(1.5).to_f64(), 1.5);
        assert_eq!(f64::from_f64(-2.25), -2.25);
        assert_eq!(Scalar::abs(-3.0f32), 3.0);
        assert_eq!(f32::PRECISION, Precision::SinglePrecision);
        assert_eq!(f64::PRECISION, Precision::DoublePrecision);
    }
}
