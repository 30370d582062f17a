//! Iterative Jacobi solve across two devices with boundary exchange.
//!
//! Each round is a bulk-synchronous-parallel step: both devices update
//! their row slice of the estimate concurrently, the host gathers the
//! per-device `x_next` sub-ranges into one vector, and that full vector is
//! re-uploaded to *both* devices' `x_current` buffer. Every row update
//! needs the entire previous iterate, so the broadcast is what makes the
//! solve genuinely cross-device. Rounds are strictly sequential.

use crate::context::{DeviceBuffer, KernelContext};
use crate::device::ClDevice;
use crate::error::{EngineError, Result};
use crate::kernel::{KernelSource, Scalar};
use crate::partition::{Partition, JACOBI_BLOCK};
use crate::timing::{KernelTimer, SolveTiming};
use opencl3::event::Event;
use opencl3::kernel::ExecuteKernel;
use opencl3::memory::{ClMem, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY};
use std::time::Instant;
use tracing::{debug, info};

/// Stopping rule for the convergence loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiSettings {
    /// Stop once the accumulated `|delta|` over all rows drops to this.
    pub eps: f64,
    /// Hard cap on rounds; reaching it is a normal, non-error outcome.
    pub max_iterations: u32,
}

impl Default for JacobiSettings {
    fn default() -> Self {
        Self { eps: 1e-6, max_iterations: 200 }
    }
}

/// Outcome of one partitioned solve.
///
/// `converged == false` with `iterations == max_iterations` is the
/// "did not converge in N iterations" case, distinct from every
/// [`EngineError`] variant.
#[derive(Debug)]
pub struct JacobiRun<T> {
    /// Final estimate (the last assembled full iterate).
    pub x: Vec<T>,
    /// Rounds executed.
    pub iterations: u32,
    /// Final accumulated `|delta|` over all rows.
    pub accuracy: f64,
    /// Whether `accuracy <= eps` was reached within the cap.
    pub converged: bool,
    /// Device-reported kernel time vs host wall time.
    pub timing: SolveTiming,
}

/// Solve with the built-in kernel for `T`'s precision.
///
/// See [`partitioned_jacobi_with_kernel`] for semantics.
pub fn partitioned_jacobi<T: Scalar>(
    first: &ClDevice,
    second: &ClDevice,
    n: usize,
    a: &[T],
    b: &[T],
    ratio: f64,
    settings: JacobiSettings,
) -> Result<JacobiRun<T>> {
    partitioned_jacobi_with_kernel(
        first,
        second,
        &T::PRECISION.jacobi_kernel(),
        n,
        a,
        b,
        ratio,
        settings,
    )
}

/// Solve `A·x = b` (A square, `n×n`) across two devices.
///
/// The initial estimate is the zero vector. Rows are split by `ratio` in
/// blocks of [`JACOBI_BLOCK`]; contexts persist across all rounds of the
/// solve and are released when the call returns, on every path.
///
/// # Errors
///
/// [`EngineError::ConvergencePrecheck`] when A is not weakly diagonally
/// dominant (the loop is never entered);
/// [`EngineError::PartitionAlignment`] for a misaligned split; the other
/// variants for device setup failures.
///
/// # Panics
///
/// Panics if `a` is not `n·n` elements or `b` is not `n`.
#[allow(clippy::too_many_arguments)]
pub fn partitioned_jacobi_with_kernel<T: Scalar>(
    first: &ClDevice,
    second: &ClDevice,
    kernel: &KernelSource,
    n: usize,
    a: &[T],
    b: &[T],
    ratio: f64,
    settings: JacobiSettings,
) -> Result<JacobiRun<T>> {
    assert_eq!(a.len(), n * n, "matrix A must be n*n elements");
    assert_eq!(b.len(), n, "vector b must be n elements");

    let wall = Instant::now();

    if let Some(row) = first_non_dominant_row(a, n) {
        return Err(EngineError::ConvergencePrecheck { row });
    }
    let partition = Partition::split(n, ratio, JACOBI_BLOCK)?;
    debug!(
        "jacobi n={n}: {} rows on {}, {} rows on {}",
        partition.first, first.device_name, partition.second, second.device_name
    );

    let x_init = vec![T::default(); n];
    let slices = [(first, 0usize, partition.first), (second, partition.first, partition.second)];
    let mut workers = Vec::with_capacity(2);
    for (device, row_start, row_count) in slices {
        if row_count == 0 {
            continue;
        }
        workers.push(JacobiWorker::build(device, kernel, n, a, b, &x_init, row_start, row_count)?);
    }

    let mut x = x_init;
    let mut delta = vec![T::default(); n];
    let mut timer = KernelTimer::default();
    let mut iterations = 0u32;
    let mut accuracy;
    let converged = loop {
        // Issue every launch before blocking on any of them (one BSP step).
        let mut events = Vec::with_capacity(workers.len());
        for worker in &workers {
            events.push(worker.launch(n)?);
        }
        for event in &events {
            event.wait().map_err(|e| EngineError::cl("wait_for_event", e))?;
        }
        for event in &events {
            timer.record(event)?;
        }

        // Gather each device's |delta| sub-range into the global accuracy
        // accumulator.
        let mut acc = T::default();
        for worker in &workers {
            worker.read_delta(&mut delta)?;
            for value in &delta[worker.row_range()] {
                acc += value.abs();
            }
        }
        accuracy = acc.to_f64();

        // Boundary exchange: scatter every x_next sub-range into one host
        // vector, then broadcast it whole to both devices' x_current.
        for worker in &workers {
            worker.read_x_next(&mut x)?;
        }
        for worker in &mut workers {
            worker.broadcast_x_current(&x)?;
        }

        iterations += 1;
        if accuracy <= settings.eps {
            break true;
        }
        if iterations >= settings.max_iterations {
            break false;
        }
    };

    let timing =
        SolveTiming { device_seconds: timer.seconds(), wall_seconds: wall.elapsed().as_secs_f64() };
    if converged {
        info!("jacobi converged in {iterations} iterations (|delta| = {accuracy:.3e})");
    } else {
        info!("jacobi did not converge in {iterations} iterations (|delta| = {accuracy:.3e})");
    }

    Ok(JacobiRun { x, iterations, accuracy, converged, timing })
}

/// First row violating weak diagonal dominance, if any.
///
/// Weak criterion: `Σ_{j≠i} |a[i][j]| ≤ |a[i][i]|` for every row `i`.
fn first_non_dominant_row<T: Scalar>(a: &[T], n: usize) -> Option<usize> {
    for i in 0..n {
        let row = &a[i * n..(i + 1) * n];
        let mut off_diagonal = T::default();
        for value in row {
            off_diagonal += value.abs();
        }
        let diagonal = row[i].abs();
        off_diagonal = off_diagonal - diagonal;
        if off_diagonal > diagonal {
            return Some(i);
        }
    }
    None
}

/// Whether A (`n×n`, row-major) is weakly diagonally dominant.
#[must_use]
pub fn is_diagonally_dominant<T: Scalar>(a: &[T], n: usize) -> bool {
    first_non_dominant_row(a, n).is_none()
}

/// One device's context and buffers, persistent across all rounds.
struct JacobiWorker<T: Scalar> {
    ctx: KernelContext,
    a: DeviceBuffer<T>,
    b: DeviceBuffer<T>,
    x_current: DeviceBuffer<T>,
    x_next: DeviceBuffer<T>,
    delta: DeviceBuffer<T>,
    row_start: usize,
    row_count: usize,
}

impl<T: Scalar> JacobiWorker<T> {
    #[allow(clippy::too_many_arguments)]
    fn build(
        device: &ClDevice,
        kernel: &KernelSource,
        n: usize,
        a: &[T],
        b: &[T],
        x_init: &[T],
        row_start: usize,
        row_count: usize,
    ) -> Result<Self> {
        let ctx = KernelContext::build(device, kernel)?;
        let a_slice = &a[row_start * n..(row_start + row_count) * n];
        let a = DeviceBuffer::create_with(&ctx, "a", a_slice, CL_MEM_READ_ONLY)?;
        let b = DeviceBuffer::create_with(&ctx, "b", b, CL_MEM_READ_ONLY)?;
        let x_current = DeviceBuffer::create_with(&ctx, "x_current", x_init, CL_MEM_READ_WRITE)?;
        let x_next = DeviceBuffer::create_with(&ctx, "x_next", x_init, CL_MEM_READ_WRITE)?;
        let delta = DeviceBuffer::create(&ctx, "delta", n, CL_MEM_WRITE_ONLY)?;
        Ok(Self { ctx, a, b, x_current, x_next, delta, row_start, row_count })
    }

    fn row_range(&self) -> std::ops::Range<usize> {
        self.row_start..self.row_start + self.row_count
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn launch(&self, n: usize) -> Result<Event> {
        let n_arg = n as i32;
        let stride = self.row_start as i32;
        unsafe {
            ExecuteKernel::new(&self.ctx.kernel)
                .set_arg(&self.a.inner.get())
                .set_arg(&self.b.inner.get())
                .set_arg(&self.x_current.inner.get())
                .set_arg(&self.x_next.inner.get())
                .set_arg(&self.delta.inner.get())
                .set_arg(&n_arg)
                .set_arg(&stride)
                .set_global_work_sizes(&[self.row_count])
                .set_local_work_sizes(&[JACOBI_BLOCK])
                .enqueue_nd_range(&self.ctx.queue)
                .map_err(|e| EngineError::cl("enqueue_nd_range", e))
        }
    }

    /// Read back this device's delta sub-range.
    fn read_delta(&self, delta: &mut [T]) -> Result<()> {
        let range = self.row_range();
        self.delta.read_into(&self.ctx, range.start, &mut delta[range])
    }

    /// Read back this device's slice of the updated estimate.
    fn read_x_next(&self, x: &mut [T]) -> Result<()> {
        let range = self.row_range();
        self.x_next.read_into(&self.ctx, range.start, &mut x[range])
    }

    /// Upload the assembled full iterate as next round's x_current.
    fn broadcast_x_current(&mut self, x: &[T]) -> Result<()> {
        self.x_current.write(&self.ctx, x)
    }
}
