//! Single-shot dual-device dispatcher for partitioned matrix multiply.
//!
//! A's rows are split between the two devices by ratio; each nonempty
//! partition gets its own execution context holding its row slice of A and
//! all of B. Both launches are enqueued before either is waited on, so the
//! devices overlap; each output sub-block is then read back into the
//! correct row offset of the shared result.

use crate::context::{DeviceBuffer, KernelContext};
use crate::device::ClDevice;
use crate::error::{EngineError, Result};
use crate::kernel::{KernelSource, Scalar};
use crate::partition::{Partition, GEMM_BLOCK};
use crate::timing::KernelTimer;
use opencl3::event::Event;
use opencl3::kernel::ExecuteKernel;
use opencl3::memory::{ClMem, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use tracing::debug;

/// Dimensions of `C = A·B` with `A: rows×inner`, `B: inner×cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmShape {
    pub rows: usize,
    pub inner: usize,
    pub cols: usize,
}

/// Result of one partitioned multiply.
#[derive(Debug)]
pub struct GemmRun<T> {
    /// The `rows×cols` product, assembled from both devices.
    pub c: Vec<T>,
    /// Sum of device-reported kernel times. Excludes host
    /// orchestration and transfer cost.
    pub device_seconds: f64,
}

/// Multiply with the built-in kernel for `T`'s precision.
///
/// See [`partitioned_gemm_with_kernel`] for semantics.
pub fn partitioned_gemm<T: Scalar>(
    first: &ClDevice,
    second: &ClDevice,
    shape: GemmShape,
    a: &[T],
    b: &[T],
    ratio: f64,
) -> Result<GemmRun<T>> {
    partitioned_gemm_with_kernel(first, second, &T::PRECISION.gemm_kernel(), shape, a, b, ratio)
}

/// Multiply `A·B` across two devices with an explicit kernel source.
///
/// The row extent is split by `ratio` in blocks of [`GEMM_BLOCK`]; a zero
/// extent skips that device entirely. Returns the assembled product and
/// the summed device-reported kernel time.
///
/// # Errors
///
/// [`EngineError::PartitionAlignment`] when the row split or the column
/// extent does not fill whole work-groups; [`EngineError::Compilation`] /
/// [`EngineError::ResourceCreation`] for device setup failures.
///
/// # Panics
///
/// Panics if `a` or `b` do not match `shape`.
pub fn partitioned_gemm_with_kernel<T: Scalar>(
    first: &ClDevice,
    second: &ClDevice,
    kernel: &KernelSource,
    shape: GemmShape,
    a: &[T],
    b: &[T],
    ratio: f64,
) -> Result<GemmRun<T>> {
    assert_eq!(a.len(), shape.rows * shape.inner, "operand A does not match shape");
    assert_eq!(b.len(), shape.inner * shape.cols, "operand B does not match shape");

    let partition = plan(shape, ratio)?;
    debug!(
        "gemm {}x{}x{}: {} rows on {}, {} rows on {}",
        shape.rows,
        shape.inner,
        shape.cols,
        partition.first,
        first.device_name,
        partition.second,
        second.device_name
    );

    // Contexts for both nonempty partitions are fully built before any
    // launch; a failure here drops whatever was already created.
    let slices = [(first, 0usize, partition.first), (second, partition.first, partition.second)];
    let mut workers = Vec::with_capacity(2);
    for (device, row_start, row_count) in slices {
        if row_count == 0 {
            continue;
        }
        workers.push(GemmWorker::build(device, kernel, shape, a, b, row_start, row_count)?);
    }

    // Issue every launch before blocking on any of them.
    let mut events = Vec::with_capacity(workers.len());
    for worker in &workers {
        events.push(worker.launch(shape)?);
    }
    for event in &events {
        event.wait().map_err(|e| EngineError::cl("wait_for_event", e))?;
    }

    let mut timer = KernelTimer::default();
    for event in &events {
        timer.record(event)?;
    }

    let mut c = vec![T::default(); shape.rows * shape.cols];
    for worker in &workers {
        worker.read_into(&mut c, shape.cols)?;
    }

    Ok(GemmRun { c, device_seconds: timer.seconds() })
}

/// Validate launch geometry and split the row extent.
pub(crate) fn plan(shape: GemmShape, ratio: f64) -> Result<Partition> {
    // Columns must fill 16-wide work-groups too; same hard-fail policy as
    // the row split.
    if shape.cols == 0 || shape.cols % GEMM_BLOCK != 0 {
        return Err(EngineError::PartitionAlignment { extent: shape.cols, block_size: GEMM_BLOCK });
    }
    Partition::split(shape.rows, ratio, GEMM_BLOCK)
}

/// One device's context and buffers for its row slice.
struct GemmWorker<T: Scalar> {
    ctx: KernelContext,
    a: DeviceBuffer<T>,
    b: DeviceBuffer<T>,
    c: DeviceBuffer<T>,
    row_start: usize,
    row_count: usize,
}

impl<T: Scalar> GemmWorker<T> {
    fn build(
        device: &ClDevice,
        kernel: &KernelSource,
        shape: GemmShape,
        a: &[T],
        b: &[T],
        row_start: usize,
        row_count: usize,
    ) -> Result<Self> {
        let ctx = KernelContext::build(device, kernel)?;
        let a_slice = &a[row_start * shape.inner..(row_start + row_count) * shape.inner];
        let a = DeviceBuffer::create_with(&ctx, "a", a_slice, CL_MEM_READ_ONLY)?;
        let b = DeviceBuffer::create_with(&ctx, "b", b, CL_MEM_READ_ONLY)?;
        let c = DeviceBuffer::create(&ctx, "c", row_count * shape.cols, CL_MEM_WRITE_ONLY)?;
        Ok(Self { ctx, a, b, c, row_start, row_count })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn launch(&self, shape: GemmShape) -> Result<Event> {
        let rows = self.row_count as i32;
        let inner = shape.inner as i32;
        let cols = shape.cols as i32;
        unsafe {
            ExecuteKernel::new(&self.ctx.kernel)
                .set_arg(&rows)
                .set_arg(&inner)
                .set_arg(&cols)
                .set_arg(&self.a.inner.get())
                .set_arg(&self.b.inner.get())
                .set_arg(&self.c.inner.get())
                .set_global_work_sizes(&[shape.cols, self.row_count])
                .set_local_work_sizes(&[GEMM_BLOCK, GEMM_BLOCK])
                .enqueue_nd_range(&self.ctx.queue)
                .map_err(|e| EngineError::cl("enqueue_nd_range", e))
        }
    }

    /// Copy this device's output sub-block into its row offset of `c`.
    fn read_into(&self, c: &mut [T], cols: usize) -> Result<()> {
        let rows = self.row_start * cols..(self.row_start + self.row_count) * cols;
        self.c.read_into(&self.ctx, 0, &mut c[rows])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: GemmShape = GemmShape { rows: 6400, inner: 1600, cols: 1600 };

    #[test]
    fn plan_accepts_aligned_shapes() {
        let p = plan(SHAPE, 0.5).unwrap();
        assert_eq!(p.total(), SHAPE.rows);
    }

    #[test]
    fn plan_rejects_misaligned_columns() {
        let shape = GemmShape { cols: 100, ..SHAPE };
        match plan(shape, 0.5) {
            Err(EngineError::PartitionAlignment { extent, block_size }) => {
                assert_eq!(extent, 100);
                assert_eq!(block_size, GEMM_BLOCK);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn plan_rejects_misaligned_rows() {
        let shape = GemmShape { rows: 104, ..SHAPE };
        assert!(plan(shape, 0.5).is_err());
    }
}
